//! Recency classifier: last-rain scan, elapsed breakdown, tier mapping.

use chrono::{DateTime, Duration, Utc};

use crate::types::{
    ClassificationResult, DrynessTier, ElapsedBreakdown, PrecipitationSeries, RainEvent,
};

/// Default wetness threshold, filtering sensor noise and trace
/// precipitation. A threshold of 0 counts any nonzero trace.
pub const DEFAULT_THRESHOLD_MM: f64 = 0.1;

/// Classify a precipitation series into a dryness tier and narrative.
///
/// Scans from most-recent to least-recent; the first sample strictly
/// exceeding `threshold_mm` is the rain event. Scanning backward lets the
/// scan stop at the first hit, which matters for 90-day hourly series.
pub fn classify(
    series: &PrecipitationSeries,
    threshold_mm: f64,
    now: DateTime<Utc>,
) -> ClassificationResult {
    let event = series
        .samples()
        .iter()
        .rev()
        .find(|sample| sample.precipitation_mm > threshold_mm)
        .map(|sample| RainEvent { time: sample.time });

    let Some(event) = event else {
        tracing::debug!(threshold_mm, "no sample above threshold in series");
        return ClassificationResult {
            rain_event: None,
            elapsed: None,
            tier: DrynessTier::VeryDry,
            narrative: format!(
                "No significant rain (>{} mm/hr) recorded in the lookback window.",
                threshold_mm
            ),
        };
    };

    let elapsed = now - event.time;

    // Hourly data can include the current partial hour or near-future
    // forecasted precipitation. Must be checked before the breakdown
    // arithmetic, which assumes a non-negative duration.
    if elapsed < Duration::zero() {
        return ClassificationResult {
            rain_event: Some(event),
            elapsed: None,
            tier: DrynessTier::Healthy,
            narrative: format!(
                "Precipitation is forecasted or occurring now ({}).",
                format_instant(event.time)
            ),
        };
    }

    let breakdown = ElapsedBreakdown::from_duration(elapsed);
    let tier = DrynessTier::from_days(breakdown.days);

    ClassificationResult {
        rain_event: Some(event),
        elapsed: Some(breakdown),
        tier,
        narrative: narrative_for(event.time, &breakdown),
    }
}

/// Build the narrative from the coarsest non-zero unit pair. The four-way
/// branch is an exact granularity-selection policy, kept bit-for-bit for
/// output compatibility: days report remaining hours even when zero.
fn narrative_for(event_time: DateTime<Utc>, breakdown: &ElapsedBreakdown) -> String {
    let mut narrative = format!("It last rained on {}. ", format_instant(event_time));
    if breakdown.days > 0 {
        narrative.push_str(&format!(
            "That was approx. {} day(s) and {} hour(s) ago.",
            breakdown.days, breakdown.hours
        ));
    } else if breakdown.total_hours() > 0 {
        narrative.push_str(&format!(
            "That was approx. {} hour(s) ago.",
            breakdown.total_hours()
        ));
    } else if breakdown.total_minutes() > 0 {
        narrative.push_str(&format!(
            "That was approx. {} minute(s) ago.",
            breakdown.total_minutes()
        ));
    } else {
        narrative.push_str("That was less than a minute ago, or is raining now.");
    }
    narrative
}

fn format_instant(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d at %H:%M UTC").to_string()
}
