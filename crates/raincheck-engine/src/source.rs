//! Open-Meteo precipitation source adapter.
//!
//! Issues a single GET for hourly precipitation over a trailing window and
//! validates the response into a [`PrecipitationSeries`]. No retries, no
//! caching: one request per invocation.

use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::error::EngineError;
use crate::types::{Coordinate, HourlySample, PrecipitationSeries};

/// Base URL for the Open-Meteo API
const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
/// Hourly timestamps arrive as local wall time without seconds.
const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Trailing window queried per classification.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 90;

#[derive(Debug, Clone)]
pub struct PrecipitationSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    utc_offset_seconds: Option<i32>,
    hourly: Option<HourlyBlock>,
}

#[derive(Debug, Deserialize)]
struct HourlyBlock {
    time: Option<Vec<String>>,
    precipitation: Option<Vec<Option<f64>>>,
}

/// Upstream error payloads carry a human-readable `reason` field.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    reason: Option<String>,
}

impl PrecipitationSource {
    pub fn new() -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: OPEN_METEO_URL.to_string(),
        })
    }

    /// Point the source at a different endpoint (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch hourly precipitation for the trailing `lookback_days` window
    /// ending today (local calendar date, both bounds inclusive).
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(
        &self,
        coordinate: &Coordinate,
        lookback_days: u32,
    ) -> Result<PrecipitationSeries, EngineError> {
        let end_date = Local::now().date_naive();
        let start_date = end_date - Duration::days(i64::from(lookback_days));

        let url = format!(
            "{}?latitude={:.6}&longitude={:.6}&hourly=precipitation&start_date={}&end_date={}&timezone=auto",
            self.base_url,
            coordinate.latitude(),
            coordinate.longitude(),
            start_date,
            end_date,
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|body| body.reason)
                .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
            return Err(EngineError::Upstream(reason));
        }

        let text = response.text().await?;
        let body: ForecastResponse = serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(payload = %excerpt(&text), "undecodable forecast payload: {}", e);
            EngineError::MalformedResponse(format!("JSON parse error: {}", e))
        })?;

        build_series(body).map_err(|e| {
            tracing::warn!(payload = %excerpt(&text), "malformed forecast payload: {}", e);
            e
        })
    }
}

/// Validate the raw response arrays into an ascending UTC series.
///
/// The time and precipitation arrays must both be present, index-aligned,
/// and non-empty; every timestamp must parse and every amount must be a
/// non-negative number.
fn build_series(body: ForecastResponse) -> Result<PrecipitationSeries, EngineError> {
    let hourly = body
        .hourly
        .ok_or_else(|| EngineError::MalformedResponse("missing hourly block".to_string()))?;
    let times = hourly
        .time
        .ok_or_else(|| EngineError::MalformedResponse("missing hourly.time".to_string()))?;
    let amounts = hourly.precipitation.ok_or_else(|| {
        EngineError::MalformedResponse("missing hourly.precipitation".to_string())
    })?;

    if times.len() != amounts.len() {
        return Err(EngineError::MalformedResponse(format!(
            "array length mismatch: {} times vs {} amounts",
            times.len(),
            amounts.len()
        )));
    }

    let offset_seconds = body.utc_offset_seconds.unwrap_or(0);
    let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
        EngineError::MalformedResponse(format!("invalid utc_offset_seconds {}", offset_seconds))
    })?;

    let mut samples = Vec::with_capacity(times.len());
    for (raw_time, raw_amount) in times.iter().zip(amounts.iter().copied()) {
        let naive = NaiveDateTime::parse_from_str(raw_time, HOURLY_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw_time, "%Y-%m-%dT%H:%M:%S"))
            .map_err(|_| {
                EngineError::MalformedResponse(format!("unparseable timestamp {:?}", raw_time))
            })?;
        let time: DateTime<Utc> = offset
            .from_local_datetime(&naive)
            .single()
            .ok_or_else(|| {
                EngineError::MalformedResponse(format!("ambiguous timestamp {:?}", raw_time))
            })?
            .with_timezone(&Utc);

        let precipitation_mm = raw_amount.ok_or_else(|| {
            EngineError::MalformedResponse(format!("null precipitation at {:?}", raw_time))
        })?;
        if !precipitation_mm.is_finite() || precipitation_mm < 0.0 {
            return Err(EngineError::MalformedResponse(format!(
                "invalid precipitation value {} at {:?}",
                precipitation_mm, raw_time
            )));
        }

        samples.push(HourlySample {
            time,
            precipitation_mm,
        });
    }

    PrecipitationSeries::new(samples)
}

fn excerpt(text: &str) -> &str {
    let end = text
        .char_indices()
        .nth(512)
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_for(server: &MockServer) -> PrecipitationSource {
        PrecipitationSource::new()
            .unwrap()
            .with_base_url(server.uri())
    }

    fn coord() -> Coordinate {
        Coordinate::new(55.9486, -4.329).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_aligned_arrays() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(query_param("hourly", "precipitation"))
            .and(query_param("timezone", "auto"))
            .and(query_param("latitude", "55.948600"))
            .and(query_param("longitude", "-4.329000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "utc_offset_seconds": 3600,
                "hourly": {
                    "time": ["2024-02-01T10:00", "2024-02-01T11:00"],
                    "precipitation": [0.0, 0.5]
                }
            })))
            .mount(&mock_server)
            .await;

        let series = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap();

        assert_eq!(series.len(), 2);
        let samples = series.samples();
        assert_eq!(samples[1].precipitation_mm, 0.5);
        // 11:00 local at UTC+1 is 10:00 UTC
        assert_eq!(
            samples[1].time,
            Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_error_reason_surfaced_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": true,
                "reason": "Latitude must be in range of -90 to 90"
            })))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        match err {
            EngineError::Upstream(msg) => {
                assert_eq!(msg, "Latitude must be in range of -90 to 90");
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_without_reason_reports_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        match err {
            EngineError::Upstream(msg) => {
                assert_eq!(msg, "request failed with status 503");
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_length_mismatch_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2024-02-01T10:00", "2024-02-01T11:00"],
                    "precipitation": [0.0]
                }
            })))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_hourly_block_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "latitude": 55.95 })),
            )
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_null_precipitation_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2024-02-01T10:00"],
                    "precipitation": [null]
                }
            })))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_arrays_are_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": { "time": [], "precipitation": [] }
            })))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_negative_precipitation_is_malformed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2024-02-01T10:00"],
                    "precipitation": [-0.2]
                }
            })))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server)
            .fetch(&coord(), 90)
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }
}
