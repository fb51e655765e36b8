//! Foster matches: active reports that fit the user's foster application.

use serde_json::Value;

use crate::context::SessionContext;
use crate::error::{AuthError, CollaboratorError};
use crate::intake::{ReportStatus, SpeciesPreference};
use crate::store::{Collection, Filter, Order, StoredRecord};

/// The user's application (if any) and the animals shown to them.
#[derive(Debug, Clone)]
pub struct FosterMatches {
    pub application: Option<StoredRecord>,
    /// Active reports, newest first.
    pub animals: Vec<StoredRecord>,
}

/// Species the application asks to be filtered on, or `None` for no filter.
///
/// No preference, or any preference including `either`, shows every species.
pub fn species_filter(application: Option<&StoredRecord>) -> Option<Vec<String>> {
    let preferred: Vec<String> = application?
        .data
        .get("preferred_species")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    let either = SpeciesPreference::Either.as_str();
    if preferred.is_empty() || preferred.iter().any(|s| s == either) {
        return None;
    }
    Some(preferred)
}

/// Load the signed-in user's foster application and the animals that match it.
pub async fn load_matches(ctx: &SessionContext) -> Result<FosterMatches, CollaboratorError> {
    let user = ctx.user.as_ref().ok_or(AuthError::NotSignedIn)?;

    let application = ctx
        .store
        .get_one(
            Collection::FosterApplications,
            &Filter::new().eq("user_id", user.as_str()),
        )
        .await?;

    let mut filter = Filter::new().eq("status", ReportStatus::Active.as_str());
    if let Some(species) = species_filter(application.as_ref()) {
        filter = filter.in_values("species", species);
    }

    let animals = ctx
        .store
        .query(Collection::FoundAnimals, &filter, Some(&Order::desc("created_at")))
        .await?;

    tracing::debug!(
        user = %user,
        has_application = application.is_some(),
        count = animals.len(),
        "Loaded foster matches"
    );
    Ok(FosterMatches {
        application,
        animals,
    })
}
