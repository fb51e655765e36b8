//! Foster application draft: four steps.
//!
//! 1. Household: home type, yard.
//! 2. Experience: pet experience (required), references.
//! 3. Preferences: species (at least one), sizes, how many animals.
//! 4. Background: other pets, criminal history.

use crate::context::UserId;
use crate::error::ValidationError;
use crate::intake::form::IntakeForm;
use crate::intake::model::{
    ApplicationStatus, FosterApplicationRecord, HomeType, SizePreference, SpeciesPreference,
};
use crate::intake::validation::{Checklist, toggle};
use crate::store::Collection;

pub const MIN_ANIMALS: u8 = 1;
pub const MAX_ANIMALS: u8 = 5;

/// In-progress foster application.
#[derive(Debug, Clone, PartialEq)]
pub struct FosterDraft {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub home_type: Option<HomeType>,
    pub has_yard: Option<bool>,
    pub has_other_pets: Option<bool>,
    pub pet_experience: String,
    pub references: String,
    pub preferred_species: Vec<SpeciesPreference>,
    pub preferred_size: Vec<SizePreference>,
    pub max_animals: u8,
    pub has_criminal_history: Option<bool>,
}

impl Default for FosterDraft {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone_number: String::new(),
            address: String::new(),
            home_type: None,
            has_yard: None,
            has_other_pets: None,
            pet_experience: String::new(),
            references: String::new(),
            preferred_species: Vec::new(),
            preferred_size: Vec::new(),
            max_animals: MIN_ANIMALS,
            has_criminal_history: None,
        }
    }
}

impl FosterDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_species(&mut self, species: SpeciesPreference) {
        toggle(&mut self.preferred_species, species);
    }

    pub fn toggle_size(&mut self, size: SizePreference) {
        toggle(&mut self.preferred_size, size);
    }

    /// Stepper "+": saturates at the maximum.
    pub fn increment_max_animals(&mut self) {
        self.max_animals = self.max_animals.saturating_add(1).min(MAX_ANIMALS);
    }

    /// Stepper "-": saturates at the minimum.
    pub fn decrement_max_animals(&mut self) {
        self.max_animals = self.max_animals.saturating_sub(1).max(MIN_ANIMALS);
    }
}

impl IntakeForm for FosterDraft {
    type Record = FosterApplicationRecord;

    const COLLECTION: Collection = Collection::FosterApplications;
    const TOTAL_STEPS: usize = 4;

    fn check_step(&self, step: usize) -> Result<(), ValidationError> {
        let mut check = Checklist::new();
        match step {
            1 => check
                .require("home_type", &self.home_type)
                .require("has_yard", &self.has_yard),
            2 => check.require_text("pet_experience", &self.pet_experience),
            3 => check
                .require_any("preferred_species", &self.preferred_species)
                .require_range("max_animals", self.max_animals, MIN_ANIMALS..=MAX_ANIMALS),
            4 => check
                .require("has_other_pets", &self.has_other_pets)
                .require("has_criminal_history", &self.has_criminal_history),
            _ => &mut check,
        };
        check.finish()
    }

    fn to_record(&self, owner: &UserId) -> Result<FosterApplicationRecord, ValidationError> {
        self.check_all()?;
        let (Some(home_type), Some(has_yard), Some(has_other_pets)) =
            (self.home_type, self.has_yard, self.has_other_pets)
        else {
            return Err(ValidationError::missing(["home_type", "has_yard", "has_other_pets"]));
        };

        Ok(FosterApplicationRecord {
            user_id: owner.to_string(),
            full_name: self.full_name.clone(),
            phone_number: self.phone_number.clone(),
            address: self.address.clone(),
            home_type,
            has_yard,
            has_other_pets,
            pet_experience: self.pet_experience.clone(),
            preferred_species: self.preferred_species.clone(),
            preferred_size: self.preferred_size.clone(),
            max_animals: self.max_animals,
            references: self.references.clone(),
            has_criminal_history: self.has_criminal_history.unwrap_or(false),
            status: ApplicationStatus::Pending,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_draft() -> FosterDraft {
        FosterDraft {
            home_type: Some(HomeType::Apartment),
            has_yard: Some(false),
            has_other_pets: Some(true),
            pet_experience: "Raised two rescue cats".into(),
            preferred_species: vec![SpeciesPreference::Cat],
            has_criminal_history: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn step_one_requires_household() {
        let mut draft = FosterDraft::new();
        let err = draft.check_step(1).unwrap_err();
        assert_eq!(err.fields, vec!["home_type", "has_yard"]);

        draft.home_type = Some(HomeType::House);
        draft.has_yard = Some(true);
        assert!(draft.check_step(1).is_ok());
    }

    #[test]
    fn step_two_requires_experience() {
        let err = FosterDraft::new().check_step(2).unwrap_err();
        assert!(err.mentions("pet_experience"));
    }

    #[test]
    fn step_three_requires_species() {
        let mut draft = FosterDraft::new();
        assert!(draft.check_step(3).unwrap_err().mentions("preferred_species"));
        draft.toggle_species(SpeciesPreference::Either);
        assert!(draft.check_step(3).is_ok());
    }

    #[test]
    fn step_three_rejects_out_of_range_count() {
        let mut draft = complete_draft();
        draft.max_animals = 0;
        assert!(draft.check_step(3).unwrap_err().mentions("max_animals"));
    }

    #[test]
    fn step_four_requires_both_answers() {
        let err = FosterDraft::new().check_step(4).unwrap_err();
        assert_eq!(err.fields, vec!["has_other_pets", "has_criminal_history"]);
    }

    #[test]
    fn toggling_species_twice_restores_selection() {
        let mut draft = FosterDraft::new();
        draft.toggle_species(SpeciesPreference::Dog);
        assert_eq!(draft.preferred_species, vec![SpeciesPreference::Dog]);
        draft.toggle_species(SpeciesPreference::Dog);
        assert!(draft.preferred_species.is_empty());
    }

    #[test]
    fn size_toggle_order_irrelevant_to_validity() {
        let mut draft = complete_draft();
        draft.toggle_size(SizePreference::Large);
        draft.toggle_size(SizePreference::Small);
        assert!(draft.check_all().is_ok());
        assert_eq!(
            draft.preferred_size,
            vec![SizePreference::Large, SizePreference::Small]
        );
    }

    #[test]
    fn stepper_saturates() {
        let mut draft = FosterDraft::new();
        draft.decrement_max_animals();
        assert_eq!(draft.max_animals, MIN_ANIMALS);
        for _ in 0..10 {
            draft.increment_max_animals();
        }
        assert_eq!(draft.max_animals, MAX_ANIMALS);
    }

    #[test]
    fn stepper_clamps_out_of_range_counts() {
        let mut draft = FosterDraft::new();
        draft.max_animals = u8::MAX;
        draft.increment_max_animals();
        assert_eq!(draft.max_animals, MAX_ANIMALS);

        draft.max_animals = 0;
        draft.decrement_max_animals();
        assert_eq!(draft.max_animals, MIN_ANIMALS);
    }

    #[test]
    fn record_is_pending_with_owner() {
        let record = complete_draft().to_record(&UserId::new("u7")).unwrap();
        assert_eq!(record.user_id, "u7");
        assert_eq!(record.status, ApplicationStatus::Pending);
        assert!(!record.has_criminal_history);
        assert_eq!(record.max_animals, 1);
    }

    #[test]
    fn check_all_collects_across_steps() {
        let err = FosterDraft::new().check_all().unwrap_err();
        for field in ["home_type", "has_yard", "pet_experience", "preferred_species"] {
            assert!(err.mentions(field), "expected {field} in {:?}", err.fields);
        }
    }
}
