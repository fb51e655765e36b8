//! Intake forms: found-animal reports and foster applications.

pub mod form;
pub mod foster;
pub mod model;
mod prefill;
pub mod report;
pub mod validation;
pub mod wizard;

pub use form::IntakeForm;
pub use foster::FosterDraft;
pub use model::{
    AnimalSize, ApplicationStatus, FosterApplicationRecord, FoundAnimalRecord, GeoPoint,
    HealthStatus, HomeType, PhotoRef, ReportStatus, SizePreference, Species, SpeciesPreference,
    Urgency,
};
pub use report::ReportDraft;
pub use wizard::{BackOutcome, Wizard, WizardPhase};
