//! Trigger orchestration: one classification per location trigger.
//!
//! Each trigger takes the next request generation; outcomes carry their
//! generation so a receiver can drop results superseded by a newer
//! trigger (last-write-wins). In-flight requests are not cancelled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use raincheck_engine::{
    classify, ClassificationResult, Coordinate, DrynessTier, EngineError, PrecipitationSource,
    DEFAULT_LOOKBACK_DAYS, DEFAULT_THRESHOLD_MM,
};

use crate::location::LocationSource;

/// Terminal outcome of one trigger. Every trigger resolves to exactly one
/// of these; the caller is never left in an indefinite fetching state.
#[derive(Debug, Clone)]
pub enum ServiceOutcome {
    Classified {
        generation: u64,
        result: ClassificationResult,
    },
    Failed {
        generation: u64,
        message: String,
        tier: DrynessTier,
    },
}

impl ServiceOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Classified { generation, .. } | Self::Failed { generation, .. } => *generation,
        }
    }

    /// The renderable tier, regardless of success or failure.
    pub fn tier(&self) -> DrynessTier {
        match self {
            Self::Classified { result, .. } => result.tier,
            Self::Failed { tier, .. } => *tier,
        }
    }
}

pub struct RaincheckService {
    source: PrecipitationSource,
    threshold_mm: f64,
    lookback_days: u32,
    generation: AtomicU64,
}

impl RaincheckService {
    pub fn new() -> Result<Self, EngineError> {
        Ok(Self::with_source(PrecipitationSource::new()?))
    }

    pub fn with_source(source: PrecipitationSource) -> Self {
        Self {
            source,
            threshold_mm: DEFAULT_THRESHOLD_MM,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_threshold_mm(mut self, threshold_mm: f64) -> Self {
        self.threshold_mm = threshold_mm;
        self
    }

    pub fn with_lookback_days(mut self, lookback_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self
    }

    /// Handle a location trigger from a UI collaborator. The source label
    /// is logged but never affects classification. Invalid coordinates
    /// fail here, before any network activity.
    pub async fn on_location_selected(
        &self,
        latitude: f64,
        longitude: f64,
        source: LocationSource,
    ) -> ServiceOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(%source, latitude, longitude, generation, "location selected");

        match self.run(latitude, longitude).await {
            Ok(result) => ServiceOutcome::Classified { generation, result },
            Err(e) => {
                tracing::warn!(generation, "classification failed: {}", e);
                ServiceOutcome::Failed {
                    generation,
                    message: e.user_message(),
                    tier: e.tier(),
                }
            }
        }
    }

    async fn run(&self, latitude: f64, longitude: f64) -> Result<ClassificationResult, EngineError> {
        let coordinate = Coordinate::new(latitude, longitude)?;
        let series = self.source.fetch(&coordinate, self.lookback_days).await?;
        Ok(classify(&series, self.threshold_mm, Utc::now()))
    }

    /// Generation of the most recent trigger. An outcome whose generation
    /// is below this has been superseded.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_stale(&self, outcome: &ServiceOutcome) -> bool {
        outcome.generation() < self.latest_generation()
    }
}

/// Fire-and-forget trigger for event-loop callers: spawns the
/// classification and sends the terminal outcome over the channel.
pub fn request_classification(
    service: Arc<RaincheckService>,
    tx: std::sync::mpsc::Sender<ServiceOutcome>,
    latitude: f64,
    longitude: f64,
    source: LocationSource,
) {
    tokio::spawn(async move {
        let outcome = service
            .on_location_selected(latitude, longitude, source)
            .await;
        let _ = tx.send(outcome);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> RaincheckService {
        let source = PrecipitationSource::new()
            .unwrap()
            .with_base_url(server.uri());
        RaincheckService::with_source(source)
    }

    fn wet_payload() -> serde_json::Value {
        let now = Utc::now();
        serde_json::json!({
            "utc_offset_seconds": 0,
            "hourly": {
                "time": [now.format("%Y-%m-%dT%H:%M").to_string()],
                "precipitation": [0.6]
            }
        })
    }

    #[tokio::test]
    async fn test_invalid_coordinate_fails_without_fetch() {
        let mock_server = MockServer::start().await;

        // The mock verifies on drop that no request ever went out.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let service = service_for(&mock_server);
        let outcome = service
            .on_location_selected(91.0, 0.0, LocationSource::ManualEntry)
            .await;

        match outcome {
            ServiceOutcome::Failed { message, tier, .. } => {
                assert!(message.contains("-90 to 90"));
                assert_eq!(tier, DrynessTier::Unknown);
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_successful_trigger_classifies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wet_payload()))
            .mount(&mock_server)
            .await;

        let service = service_for(&mock_server);
        let outcome = service
            .on_location_selected(55.9486, -4.329, LocationSource::MapClick)
            .await;

        assert_eq!(outcome.generation(), 1);
        assert_eq!(outcome.tier(), DrynessTier::Healthy);
        assert!(matches!(outcome, ServiceOutcome::Classified { .. }));
    }

    #[tokio::test]
    async fn test_upstream_failure_degrades_to_unknown() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let service = service_for(&mock_server);
        let outcome = service
            .on_location_selected(55.9486, -4.329, LocationSource::Device)
            .await;

        assert_eq!(outcome.tier(), DrynessTier::Unknown);
        assert!(matches!(outcome, ServiceOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_newer_trigger_supersedes_older_outcome() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wet_payload()))
            .mount(&mock_server)
            .await;

        let service = service_for(&mock_server);
        let first = service
            .on_location_selected(10.0, 10.0, LocationSource::ManualEntry)
            .await;
        let second = service
            .on_location_selected(20.0, 20.0, LocationSource::MapClick)
            .await;

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert!(service.is_stale(&first));
        assert!(!service.is_stale(&second));
    }

    #[tokio::test]
    async fn test_spawned_trigger_sends_terminal_outcome() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(wet_payload()))
            .mount(&mock_server)
            .await;

        let service = Arc::new(service_for(&mock_server));
        let (tx, rx) = std::sync::mpsc::channel();

        request_classification(service, tx, 55.9486, -4.329, LocationSource::Bookmark);

        let outcome = tokio::task::spawn_blocking(move || rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome.tier(), DrynessTier::Healthy);
    }
}
