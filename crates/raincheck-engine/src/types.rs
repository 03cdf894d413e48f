use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// A validated geographic point.
///
/// Out-of-range values are rejected at construction, never clamped, so
/// everything downstream can rely on the ranges holding. No serde derive:
/// the fallible constructor is the only way in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting latitudes outside [-90, 90] and
    /// longitudes outside [-180, 180]. NaN fails both checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, EngineError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(EngineError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// One hourly precipitation measurement, normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub time: DateTime<Utc>,
    /// Millimeters of precipitation over the hour; never negative.
    pub precipitation_mm: f64,
}

/// An immutable, chronologically ascending run of hourly samples.
///
/// Built fresh per query and discarded after classification.
#[derive(Debug, Clone)]
pub struct PrecipitationSeries {
    samples: Vec<HourlySample>,
}

impl PrecipitationSeries {
    /// Wrap samples, requiring a non-empty, ascending sequence.
    pub fn new(samples: Vec<HourlySample>) -> Result<Self, EngineError> {
        if samples.is_empty() {
            return Err(EngineError::MalformedResponse(
                "empty precipitation series".to_string(),
            ));
        }
        if samples.windows(2).any(|w| w[0].time > w[1].time) {
            return Err(EngineError::MalformedResponse(
                "precipitation series is not chronologically ordered".to_string(),
            ));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[HourlySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The most recent sample whose precipitation exceeded the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RainEvent {
    pub time: DateTime<Utc>,
}

/// Truncating day/hour/minute decomposition of a non-negative duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedBreakdown {
    pub days: i64,
    /// Hours remaining after whole days, 0..24.
    pub hours: i64,
    /// Minutes remaining after whole hours, 0..60.
    pub minutes: i64,
}

impl ElapsedBreakdown {
    /// Decompose a duration by integer division at each unit boundary:
    /// seconds -> minutes -> hours -> days. Negative durations clamp to
    /// zero; callers handle the future-timestamp case before getting here.
    pub fn from_duration(elapsed: Duration) -> Self {
        let total_seconds = elapsed.num_seconds().max(0);
        let total_minutes = total_seconds / 60;
        let total_hours = total_minutes / 60;
        let days = total_hours / 24;
        Self {
            days,
            hours: total_hours % 24,
            minutes: total_minutes % 60,
        }
    }

    pub fn total_hours(&self) -> i64 {
        self.days * 24 + self.hours
    }

    pub fn total_minutes(&self) -> i64 {
        self.total_hours() * 60 + self.minutes
    }
}

/// Discrete dryness levels, ordered by increasing time since rain.
///
/// `Unknown` is reserved for error/no-data states and is distinct from
/// "very dry because of a long drought".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DrynessTier {
    #[default]
    Unknown,
    Healthy,
    SlightlyDry,
    ModeratelyDry,
    VeryDry,
}

impl DrynessTier {
    /// Map whole elapsed days since rain to a tier. Boundaries are
    /// half-open on the low end: exactly 1 day is already SlightlyDry.
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d < 1 => Self::Healthy,
            d if d < 3 => Self::SlightlyDry,
            d if d < 7 => Self::ModeratelyDry,
            _ => Self::VeryDry,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Healthy => "Healthy",
            Self::SlightlyDry => "Slightly Dry",
            Self::ModeratelyDry => "Moderately Dry",
            Self::VeryDry => "Very Dry",
        }
    }

    /// Asset name for the plant image the UI shows for this tier.
    pub fn image_name(&self) -> &'static str {
        match self {
            Self::Unknown => "plant_unknown",
            Self::Healthy => "plant_healthy",
            Self::SlightlyDry => "plant_slightly_dry",
            Self::ModeratelyDry => "plant_moderately_dry",
            Self::VeryDry => "plant_very_dry",
        }
    }
}

/// Terminal outcome of one classification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub rain_event: Option<RainEvent>,
    /// Absent when no rain was found or when the event is in the future.
    pub elapsed: Option<ElapsedBreakdown>,
    pub tier: DrynessTier,
    pub narrative: String,
}
