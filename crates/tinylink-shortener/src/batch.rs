use crate::persist;
use crate::registry::{NewRecord, Registry};
use jiff::SignedDuration;
use std::sync::Arc;
use tinylink_core::{
    is_valid_url, is_valid_validity, CreationRequest, Diagnostic, Result, ShortCode,
    ShortenerError, UrlRecord,
};
use tinylink_generator::Generator;
use tinylink_storage::Persistence;
use tracing::debug;
use typed_builder::TypedBuilder;

pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;
pub const DEFAULT_MAX_GENERATION_ATTEMPTS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct BatchSettings {
    /// Validity applied when a request leaves it unset or zero.
    #[builder(default = DEFAULT_VALIDITY_MINUTES)]
    pub default_validity_minutes: i64,
    /// Upper bound on generate-and-insert attempts for one request.
    #[builder(default = DEFAULT_MAX_GENERATION_ATTEMPTS)]
    pub max_generation_attempts: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Result of processing a batch: created records and per-request errors,
/// each in request order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub succeeded: Vec<UrlRecord>,
    pub failed: Vec<ShortenerError>,
}

impl BatchOutcome {
    /// Human-readable error messages, one per failed request.
    pub fn error_messages(&self) -> Vec<String> {
        self.failed.iter().map(ToString::to_string).collect()
    }
}

/// Validates, assigns codes to and inserts batches of creation requests.
///
/// Requests are independent: a rejected request is reported in the outcome
/// and processing moves on to the next one. Nothing is rolled back.
pub struct BatchProcessor<G> {
    registry: Arc<Registry>,
    generator: G,
    persistence: Arc<dyn Persistence>,
    settings: BatchSettings,
}

impl<G: Generator> BatchProcessor<G> {
    pub fn new(registry: Arc<Registry>, generator: G, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            registry,
            generator,
            persistence,
            settings: BatchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: BatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Processes every request in order.
    ///
    /// If at least one record was created, the registry is saved once after
    /// the whole batch.
    pub async fn process<I>(&self, requests: I) -> BatchOutcome
    where
        I: IntoIterator<Item = CreationRequest>,
    {
        let mut outcome = BatchOutcome::default();

        for request in requests {
            match self.create(request) {
                Ok(record) => {
                    self.registry.sink().emit(Diagnostic::Created {
                        shortcode: record.shortcode.to_string(),
                        long_url: record.long_url.clone(),
                        expires_at: record.expires_at,
                    });
                    outcome.succeeded.push(record);
                }
                Err(e) => {
                    debug!(error = %e, "rejected creation request");
                    outcome.failed.push(e);
                }
            }
        }

        if !outcome.succeeded.is_empty() {
            persist::flush(&self.registry, &*self.persistence).await;
        }

        outcome
    }

    fn create(&self, request: CreationRequest) -> Result<UrlRecord> {
        let CreationRequest {
            id,
            long_url,
            validity_minutes,
            custom_shortcode,
        } = request;

        if !is_valid_url(&long_url) {
            return Err(ShortenerError::InvalidUrlFormat(long_url));
        }

        let minutes = match validity_minutes {
            None | Some(0) => self.settings.default_validity_minutes,
            Some(minutes) => minutes,
        };
        if !is_valid_validity(minutes) {
            return Err(ShortenerError::InvalidValidity(long_url));
        }
        let Some(validity) = minutes.checked_mul(60).map(SignedDuration::from_secs) else {
            return Err(ShortenerError::InvalidValidity(long_url));
        };

        match custom_shortcode.filter(|code| !code.is_empty()) {
            Some(code) => {
                let shortcode = ShortCode::new(code)?;
                self.registry.insert(NewRecord {
                    id,
                    long_url,
                    shortcode,
                    validity,
                })
            }
            None => self.insert_generated(id, long_url, validity),
        }
    }

    /// Generates candidate codes until one inserts cleanly. The registry lock
    /// is taken per attempt, never across generation.
    fn insert_generated(
        &self,
        id: String,
        long_url: String,
        validity: SignedDuration,
    ) -> Result<UrlRecord> {
        let attempts = self.settings.max_generation_attempts;

        for attempt in 1..=attempts {
            let shortcode: ShortCode = self.generator.generate().into();
            let candidate = NewRecord {
                id: id.clone(),
                long_url: long_url.clone(),
                shortcode,
                validity,
            };

            match self.registry.insert(candidate) {
                Ok(record) => return Ok(record),
                Err(ShortenerError::DuplicateShortcode(code)) => {
                    debug!(%code, attempt, "generated shortcode collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(ShortenerError::ResourceExhausted {
            url: long_url,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;
    use tinylink_core::{Clock, ManualClock, MemorySink};
    use tinylink_generator::{RandomGenerator, SeqGenerator};
    use tinylink_storage::InMemoryPersistence;

    struct Fixture<G> {
        processor: BatchProcessor<G>,
        registry: Arc<Registry>,
        persistence: Arc<InMemoryPersistence>,
        clock: ManualClock,
        sink: Arc<MemorySink>,
    }

    fn fixture<G: Generator>(generator: G) -> Fixture<G> {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(Registry::new(Arc::new(clock.clone()), sink.clone()));
        let persistence = Arc::new(InMemoryPersistence::new());
        let processor = BatchProcessor::new(registry.clone(), generator, persistence.clone());
        Fixture {
            processor,
            registry,
            persistence,
            clock,
            sink,
        }
    }

    fn request(url: &str) -> CreationRequest {
        CreationRequest::builder().id(url).long_url(url).build()
    }

    fn custom(url: &str, code: &str) -> CreationRequest {
        CreationRequest::builder()
            .id(url)
            .long_url(url)
            .custom_shortcode(code)
            .build()
    }

    /// Always proposes the same code.
    struct StuckGenerator;

    impl Generator for StuckGenerator {
        type Output = ShortCode;

        fn generate(&self) -> ShortCode {
            ShortCode::new_unchecked("stuck123")
        }
    }

    #[tokio::test]
    async fn generated_code_with_default_validity() {
        let f = fixture(RandomGenerator::new());

        let outcome = f.processor.process([request("https://example.com")]).await;

        assert!(outcome.failed.is_empty());
        let record = &outcome.succeeded[0];
        assert_eq!(record.shortcode.as_str().len(), 8);
        assert_eq!(record.created_at, f.clock.now());
        assert_eq!(
            record.expires_at,
            f.clock.now() + SignedDuration::from_mins(DEFAULT_VALIDITY_MINUTES)
        );
    }

    #[tokio::test]
    async fn zero_validity_uses_default() {
        let f = fixture(RandomGenerator::new());
        let mut req = request("https://example.com");
        req.validity_minutes = Some(0);

        let outcome = f.processor.process([req]).await;

        let record = &outcome.succeeded[0];
        assert_eq!(
            record.created_at.duration_until(record.expires_at),
            SignedDuration::from_mins(30)
        );
    }

    #[tokio::test]
    async fn configured_default_validity() {
        let f = fixture(RandomGenerator::new());
        let processor = f
            .processor
            .with_settings(BatchSettings::builder().default_validity_minutes(5).build());

        let outcome = processor.process([request("https://example.com")]).await;

        let record = &outcome.succeeded[0];
        assert_eq!(
            record.created_at.duration_until(record.expires_at),
            SignedDuration::from_mins(5)
        );
    }

    #[tokio::test]
    async fn negative_validity_is_rejected() {
        let f = fixture(RandomGenerator::new());
        let mut req = request("https://example.com");
        req.validity_minutes = Some(-1);

        let outcome = f.processor.process([req]).await;

        assert!(outcome.succeeded.is_empty());
        assert_eq!(
            outcome.failed,
            vec![ShortenerError::InvalidValidity("https://example.com".into())]
        );
    }

    #[tokio::test]
    async fn absurd_validity_is_rejected() {
        let f = fixture(RandomGenerator::new());
        let mut req = request("https://example.com");
        req.validity_minutes = Some(i64::MAX);

        let outcome = f.processor.process([req]).await;

        assert!(matches!(
            outcome.failed[0],
            ShortenerError::InvalidValidity(_)
        ));
    }

    #[tokio::test]
    async fn invalid_custom_code_names_the_code() {
        let f = fixture(RandomGenerator::new());

        let outcome = f
            .processor
            .process([custom("https://example.com", "a!")])
            .await;

        assert_eq!(outcome.error_messages(), ["invalid shortcode format: a!"]);
    }

    #[tokio::test]
    async fn empty_custom_code_means_generate() {
        let f = fixture(SeqGenerator::with_prefix("wh"));

        let outcome = f
            .processor
            .process([custom("https://example.com", "")])
            .await;

        assert_eq!(outcome.succeeded[0].shortcode.as_str(), "wh000000");
    }

    #[tokio::test]
    async fn generation_retries_past_taken_codes() {
        let f = fixture(SeqGenerator::with_prefix("wh"));

        f.processor
            .process([
                custom("https://a.example.com", "wh000000"),
                custom("https://b.example.com", "wh000001"),
            ])
            .await;
        let outcome = f.processor.process([request("https://c.example.com")]).await;

        assert_eq!(outcome.succeeded[0].shortcode.as_str(), "wh000002");
    }

    #[tokio::test]
    async fn generation_gives_up_after_bounded_attempts() {
        let f = fixture(StuckGenerator);
        let processor = f
            .processor
            .with_settings(BatchSettings::builder().max_generation_attempts(16).build());

        let outcome = processor
            .process([
                request("https://a.example.com"),
                request("https://b.example.com"),
            ])
            .await;

        assert_eq!(outcome.succeeded.len(), 1);
        assert_eq!(
            outcome.failed,
            vec![ShortenerError::ResourceExhausted {
                url: "https://b.example.com".into(),
                attempts: 16,
            }]
        );
    }

    #[tokio::test]
    async fn saves_once_per_batch_with_successes() {
        let f = fixture(RandomGenerator::new());

        f.processor
            .process([
                request("https://a.example.com"),
                request("https://b.example.com"),
                request("https://c.example.com"),
            ])
            .await;

        assert_eq!(f.persistence.save_count(), 1);
        assert_eq!(f.persistence.records().len(), 3);
    }

    #[tokio::test]
    async fn all_failed_batch_does_not_save() {
        let f = fixture(RandomGenerator::new());

        let outcome = f
            .processor
            .process([request("not-a-url"), request("ftp://example.com")])
            .await;

        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(f.persistence.save_count(), 0);
        assert!(f.registry.is_empty());
    }

    #[tokio::test]
    async fn creation_is_reported_to_the_sink() {
        let f = fixture(SeqGenerator::with_prefix("wh"));

        f.processor.process([request("https://example.com")]).await;

        assert_eq!(
            f.sink.events(),
            vec![Diagnostic::Created {
                shortcode: "wh000000".into(),
                long_url: "https://example.com".into(),
                expires_at: f.clock.now() + SignedDuration::from_mins(30),
            }]
        );
    }
}
