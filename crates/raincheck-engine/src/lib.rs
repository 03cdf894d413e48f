//! Rainfall-recency engine for Raincheck
//!
//! Answers "how long since it last rained here?" for a coordinate by
//! querying hourly precipitation history from Open-Meteo and classifying
//! the elapsed time into a plant-dryness tier.

pub mod classify;
pub mod error;
pub mod source;
pub mod types;

pub use classify::{classify, DEFAULT_THRESHOLD_MM};
pub use error::EngineError;
pub use source::{PrecipitationSource, DEFAULT_LOOKBACK_DAYS};
pub use types::*;
