//! Error types for StrayMatch.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// A required field is unset, or a field holds a value outside its domain.
///
/// Recovered locally: the user corrects the input and retries the same
/// transition as many times as needed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Names of the offending fields, in form order.
    pub fields: Vec<String>,
    pub message: String,
}

impl ValidationError {
    /// One or more required fields are unset.
    pub fn missing<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let message = format!("Missing required field(s): {}", fields.join(", "));
        Self { fields, message }
    }

    /// A single field holds an unacceptable value.
    pub fn invalid(field: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let field = field.into();
        let message = format!("Invalid value for {}: {}", field, reason.as_ref());
        Self {
            fields: vec![field],
            message,
        }
    }

    /// Whether this error names `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Combine two errors, keeping field order and dropping duplicates.
    pub fn merge(mut self, other: ValidationError) -> Self {
        for field in other.fields {
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self.message = format!("Missing or invalid field(s): {}", self.fields.join(", "));
        self
    }
}

/// An external service call failed.
///
/// Surfaced to the user once; the triggering state is preserved so the action
/// can be retried by hand.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("Auth service: {0}")]
    Auth(#[from] AuthError),

    #[error("Persistence service: {0}")]
    Persistence(#[from] DatabaseError),

    #[error("Completion service: {0}")]
    Completion(#[from] LlmError),

    #[error("Device capability: {0}")]
    Device(#[from] DeviceError),
}

/// Authentication errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("You must be logged in")]
    NotSignedIn,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account already exists for {email}")]
    AlreadyRegistered { email: String },

    #[error("Auth request failed: {0}")]
    Service(String),
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Text-completion provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Device capability errors (location, camera, photo library).
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeviceError {
    #[error("{capability} permission denied")]
    PermissionDenied { capability: String },

    #[error("{capability} unavailable: {reason}")]
    Unavailable { capability: String, reason: String },
}

/// An assistant response carried a structured payload that could not be decoded.
///
/// Never shown to the user; the response is treated as plain text instead.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("No payload marker in response")]
    NoMarker,

    #[error("No balanced object region in response")]
    Unbalanced,

    #[error("Malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is missing the species key")]
    MissingSpecies,
}

/// Rejected wizard transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Submit is only allowed from the final step (at step {step} of {total})")]
    NotFinalStep { step: usize, total: usize },

    #[error("A submission is already in flight")]
    Busy,

    #[error("The wizard has already completed")]
    Closed,
}

/// Result type alias for StrayMatch.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_lists_every_field() {
        let err = ValidationError::missing(["home_type", "has_yard"]);
        assert_eq!(err.fields, vec!["home_type", "has_yard"]);
        assert!(err.to_string().contains("home_type, has_yard"));
        assert!(err.mentions("has_yard"));
        assert!(!err.mentions("pet_experience"));
    }

    #[test]
    fn merge_deduplicates() {
        let a = ValidationError::missing(["species", "size"]);
        let b = ValidationError::missing(["size", "location"]);
        let merged = a.merge(b);
        assert_eq!(merged.fields, vec!["species", "size", "location"]);
    }

    #[test]
    fn wizard_error_is_transparent_over_validation() {
        let err: WizardError = ValidationError::missing(["pet_experience"]).into();
        assert_eq!(err.to_string(), "Missing required field(s): pet_experience");
    }

    #[test]
    fn collaborator_error_wraps_sources() {
        let err: CollaboratorError = AuthError::NotSignedIn.into();
        assert_eq!(err.to_string(), "Auth service: You must be logged in");
    }
}
