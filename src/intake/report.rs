//! Found-animal report draft: a single page with per-field validation.

use crate::context::UserId;
use crate::error::{DeviceError, ValidationError};
use crate::intake::form::IntakeForm;
use crate::intake::model::{
    AnimalSize, FoundAnimalRecord, GeoPoint, HealthStatus, PhotoRef, ReportStatus, Species,
};
use crate::intake::validation::Checklist;
use crate::store::Collection;

/// In-progress found-animal report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub species: Option<Species>,
    pub size: Option<AnimalSize>,
    pub color: String,
    pub breed: String,
    pub description: String,
    pub location: Option<GeoPoint>,
    pub health_status: Option<HealthStatus>,
    pub photos: Vec<PhotoRef>,
}

impl ReportDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a location fix.
    pub fn set_location(&mut self, lat: f64, lng: f64) -> Result<(), ValidationError> {
        self.location = Some(GeoPoint::new(lat, lng)?);
        Ok(())
    }

    /// Apply the result of a geolocation request.
    ///
    /// A denial is reported once and leaves the location unset, so submit is
    /// blocked by ordinary validation until the user supplies a fix.
    pub fn apply_location(&mut self, fix: Result<GeoPoint, DeviceError>) -> Option<DeviceError> {
        match fix {
            Ok(point) => {
                self.location = Some(point);
                None
            }
            Err(err) => {
                tracing::warn!("Location unavailable: {}", err);
                Some(err)
            }
        }
    }

    pub fn add_photo(&mut self, reference: impl Into<String>) {
        self.photos.push(PhotoRef(reference.into()));
    }

    /// Remove the photo at `index`. Out-of-range indices are ignored.
    pub fn remove_photo(&mut self, index: usize) -> Option<PhotoRef> {
        (index < self.photos.len()).then(|| self.photos.remove(index))
    }
}

impl IntakeForm for ReportDraft {
    type Record = FoundAnimalRecord;

    const COLLECTION: Collection = Collection::FoundAnimals;
    const TOTAL_STEPS: usize = 1;

    fn check_step(&self, _step: usize) -> Result<(), ValidationError> {
        Checklist::new()
            .require("species", &self.species)
            .require("size", &self.size)
            .require("health_status", &self.health_status)
            .require("location", &self.location)
            .require_text("description", &self.description)
            .finish()
    }

    fn to_record(&self, owner: &UserId) -> Result<FoundAnimalRecord, ValidationError> {
        self.check_all()?;
        let (
            Some(species),
            Some(size),
            Some(health_status),
            Some(location),
        ) = (self.species, self.size, self.health_status, self.location)
        else {
            return Err(ValidationError::missing(["species", "size", "health_status", "location"]));
        };

        Ok(FoundAnimalRecord {
            finder_id: owner.to_string(),
            species,
            size,
            color: self.color.clone(),
            breed: self.breed.clone(),
            description: self.description.clone(),
            location_lat: location.lat,
            location_lng: location.lng,
            health_status,
            photos: self.photos.clone(),
            status: ReportStatus::Active,
            urgency_level: health_status.urgency(),
        })
    }
}
