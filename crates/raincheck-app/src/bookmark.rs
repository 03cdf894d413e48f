//! Shareable location references.
//!
//! A bookmark encodes only the coordinate, at 6-decimal precision.
//! Re-entering through one reproduces the same query inputs (not
//! necessarily the same classification, since "now" moves on).

use raincheck_engine::{Coordinate, EngineError};

/// Encode a coordinate as a `lat=..&lon=..` query string.
pub fn encode(coordinate: &Coordinate) -> String {
    format!(
        "lat={:.6}&lon={:.6}",
        coordinate.latitude(),
        coordinate.longitude()
    )
}

/// Decode a reference back into a validated coordinate. Accepts a bare
/// query string or a full URL; missing or non-numeric parameters fail
/// coordinate validation like any other out-of-range input.
pub fn decode(reference: &str) -> Result<Coordinate, EngineError> {
    let query = reference
        .rsplit_once('?')
        .map_or(reference, |(_, query)| query);

    let mut latitude = f64::NAN;
    let mut longitude = f64::NAN;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "lat" => latitude = value.parse().unwrap_or(f64::NAN),
            "lon" => longitude = value.parse().unwrap_or(f64::NAN),
            _ => {}
        }
    }

    Coordinate::new(latitude, longitude)
}
