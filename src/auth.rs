//! Authentication collaborator and credential form checks.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::context::UserId;
use crate::error::{AuthError, CollaboratorError, ValidationError};

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// External auth service.
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;
    async fn current_user(&self) -> Option<UserId>;
}

/// Failure of a credential form action: bad input, or the service said no.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

impl From<AuthError> for FormError {
    fn from(err: AuthError) -> Self {
        Self::Collaborator(err.into())
    }
}

fn fill_all(fields: &[&str]) -> ValidationError {
    ValidationError {
        fields: fields.iter().map(|f| f.to_string()).collect(),
        message: "Please fill in all fields".to_string(),
    }
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::invalid("email", "not a valid email address"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(fill_all(&["email", "password"]));
        }
        check_email(&self.email)
    }

    pub async fn submit(&self, auth: &dyn AuthService) -> Result<UserId, FormError> {
        self.validate()?;
        let user = auth.sign_in(self.email.trim(), &self.password).await?;
        tracing::info!(user = %user, "Signed in");
        Ok(user)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() || self.password.is_empty() || self.confirm_password.is_empty() {
            return Err(fill_all(&["email", "password", "confirm_password"]));
        }
        if self.password != self.confirm_password {
            return Err(ValidationError {
                fields: vec!["confirm_password".to_string()],
                message: "Passwords do not match".to_string(),
            });
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError {
                fields: vec!["password".to_string()],
                message: format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            });
        }
        check_email(&self.email)
    }

    pub async fn submit(&self, auth: &dyn AuthService) -> Result<UserId, FormError> {
        self.validate()?;
        let user = auth.sign_up(self.email.trim(), &self.password).await?;
        tracing::info!(user = %user, "Account created");
        Ok(user)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResetForm {
    pub email: String,
}

impl ResetForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError {
                fields: vec!["email".to_string()],
                message: "Please enter your email".to_string(),
            });
        }
        check_email(&self.email)
    }

    pub async fn submit(&self, auth: &dyn AuthService) -> Result<(), FormError> {
        self.validate()?;
        auth.reset_password(self.email.trim()).await?;
        Ok(())
    }
}

/// In-process auth service for the terminal front-end and tests.
#[derive(Default)]
pub struct MemoryAuth {
    inner: RwLock<MemoryAuthInner>,
}

#[derive(Default)]
struct MemoryAuthInner {
    accounts: HashMap<String, (UserId, String)>,
    current: Option<UserId>,
    resets: Vec<String>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails a reset link was requested for, in order.
    pub async fn reset_requests(&self) -> Vec<String> {
        self.inner.read().await.resets.clone()
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let mut inner = self.inner.write().await;
        let user = match inner.accounts.get(&email.to_lowercase()) {
            Some((user, stored)) if stored == password => user.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        inner.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let key = email.to_lowercase();
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&key) {
            return Err(AuthError::AlreadyRegistered {
                email: email.to_string(),
            });
        }
        let user = UserId::new(Uuid::new_v4().to_string());
        inner.accounts.insert(key, (user.clone(), password.to_string()));
        inner.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.inner.write().await.current = None;
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        // Unknown addresses succeed too, so the response does not reveal accounts.
        self.inner.write().await.resets.push(email.to_lowercase());
        Ok(())
    }

    async fn current_user(&self) -> Option<UserId> {
        self.inner.read().await.current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(email: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let err = LoginForm {
            email: "a@b.co".into(),
            password: String::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.message, "Please fill in all fields");
    }

    #[test]
    fn signup_checks_in_order() {
        assert_eq!(
            signup("", "secret1", "secret1").validate().unwrap_err().message,
            "Please fill in all fields"
        );
        assert_eq!(
            signup("a@b.co", "secret1", "secret2").validate().unwrap_err().message,
            "Passwords do not match"
        );
        assert_eq!(
            signup("a@b.co", "abc", "abc").validate().unwrap_err().message,
            "Password must be at least 6 characters"
        );
        assert!(signup("a@b.co", "abcdef", "abcdef").validate().is_ok());
    }

    #[test]
    fn malformed_email_rejected() {
        let err = ResetForm {
            email: "not-an-email".into(),
        }
        .validate()
        .unwrap_err();
        assert!(err.mentions("email"));
    }

    #[tokio::test]
    async fn signup_then_login_round() {
        let auth = MemoryAuth::new();
        let created = signup("Finder@Example.com", "hunter22", "hunter22")
            .submit(&auth)
            .await
            .unwrap();
        auth.sign_out().await.unwrap();
        assert!(auth.current_user().await.is_none());

        let login = LoginForm {
            email: "finder@example.com".into(),
            password: "hunter22".into(),
        };
        assert_eq!(login.submit(&auth).await.unwrap(), created);
        assert_eq!(auth.current_user().await, Some(created));
    }

    #[tokio::test]
    async fn wrong_password_is_collaborator_error() {
        let auth = MemoryAuth::new();
        signup("a@b.co", "abcdef", "abcdef").submit(&auth).await.unwrap();
        let err = LoginForm {
            email: "a@b.co".into(),
            password: "nope".into(),
        }
        .submit(&auth)
        .await
        .unwrap_err();
        assert!(matches!(err, FormError::Collaborator(CollaboratorError::Auth(AuthError::InvalidCredentials))));
    }

    #[tokio::test]
    async fn duplicate_signup_rejected() {
        let auth = MemoryAuth::new();
        signup("a@b.co", "abcdef", "abcdef").submit(&auth).await.unwrap();
        let err = signup("A@b.co", "abcdef", "abcdef").submit(&auth).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn reset_is_recorded() {
        let auth = MemoryAuth::new();
        ResetForm {
            email: "Lost@Example.com".into(),
        }
        .submit(&auth)
        .await
        .unwrap();
        assert_eq!(auth.reset_requests().await, vec!["lost@example.com"]);
    }
}
