//! Pre-filling a report draft from a chat hand-off payload.

use std::str::FromStr;

use crate::chat::ExtractedPayload;
use crate::intake::model::{AnimalSize, HealthStatus, Species};
use crate::intake::report::ReportDraft;

impl ReportDraft {
    /// Build a draft from whatever payload fields validate. Unknown or
    /// malformed values are skipped and the field stays unset.
    pub fn from_payload(payload: &ExtractedPayload) -> Self {
        let mut draft = Self::default();
        draft.merge_payload(payload);
        draft
    }

    /// Overwrite draft fields with valid payload values.
    pub fn merge_payload(&mut self, payload: &ExtractedPayload) {
        if let Some(species) = parse_field::<Species>(payload, "species") {
            self.species = Some(species);
        }
        if let Some(size) = parse_field::<AnimalSize>(payload, "size") {
            self.size = Some(size);
        }
        if let Some(health) = parse_field::<HealthStatus>(payload, "health_status") {
            self.health_status = Some(health);
        }
        if let Some(color) = payload.text("color") {
            self.color = color.to_string();
        }
        if let Some(breed) = payload.text("breed") {
            self.breed = breed.to_string();
        }
        if let Some(description) = payload.text("description") {
            self.description = description.to_string();
        }
    }
}

fn parse_field<T: FromStr<Err = String>>(payload: &ExtractedPayload, key: &str) -> Option<T> {
    let raw = payload.text(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(field = key, "Ignoring payload value: {}", e);
            None
        }
    }
}
