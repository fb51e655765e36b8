//! Intake data model: category enums and the record shapes sent to the store.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Declares a snake_case string enum with `as_str`, `ALL`, `Display` and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {other:?}", stringify!($name))),
                }
            }
        }
    };
}

string_enum! {
    /// Kind of animal found.
    Species { Dog => "dog", Cat => "cat", Other => "other" }
}

string_enum! {
    AnimalSize {
        Small => "small",
        Medium => "medium",
        Large => "large",
        ExtraLarge => "extra_large",
    }
}

string_enum! {
    HealthStatus {
        Healthy => "healthy",
        Injured => "injured",
        Sick => "sick",
        NeedsVet => "needs_vet",
    }
}

string_enum! {
    /// Derived from the health status when a report is submitted.
    Urgency { High => "high", Medium => "medium" }
}

string_enum! {
    HomeType {
        House => "house",
        Apartment => "apartment",
        Condo => "condo",
        Other => "other",
    }
}

string_enum! {
    /// Species a foster is willing to take. `Either` means no restriction.
    SpeciesPreference { Dog => "dog", Cat => "cat", Either => "either" }
}

string_enum! {
    SizePreference { Small => "small", Medium => "medium", Large => "large" }
}

string_enum! {
    ReportStatus { Active => "active" }
}

string_enum! {
    ApplicationStatus { Pending => "pending" }
}

impl HealthStatus {
    /// Injured animals and animals that need a vet are high urgency.
    pub fn urgency(&self) -> Urgency {
        match self {
            Self::Injured | Self::NeedsVet => Urgency::High,
            Self::Healthy | Self::Sick => Urgency::Medium,
        }
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Validated constructor: finite, lat in [-90, 90], lng in [-180, 180].
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError::invalid("location", "latitude out of range"));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError::invalid("location", "longitude out of range"));
        }
        Ok(Self { lat, lng })
    }
}

/// Reference to a locally captured or selected photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoRef(pub String);

/// A found-animal report as stored in `found_animals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoundAnimalRecord {
    pub finder_id: String,
    pub species: Species,
    pub size: AnimalSize,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub breed: String,
    pub description: String,
    pub location_lat: f64,
    pub location_lng: f64,
    pub health_status: HealthStatus,
    #[serde(default)]
    pub photos: Vec<PhotoRef>,
    pub status: ReportStatus,
    pub urgency_level: Urgency,
}

/// A foster application as stored in `foster_applications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FosterApplicationRecord {
    pub user_id: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub address: String,
    pub home_type: HomeType,
    pub has_yard: bool,
    pub has_other_pets: bool,
    pub pet_experience: String,
    pub preferred_species: Vec<SpeciesPreference>,
    #[serde(default)]
    pub preferred_size: Vec<SizePreference>,
    pub max_animals: u8,
    #[serde(default)]
    pub references: String,
    pub has_criminal_history: bool,
    pub status: ApplicationStatus,
}
