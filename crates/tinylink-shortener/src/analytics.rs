use crate::locator::{FixedLocator, Locator, UNKNOWN_LOCATION};
use crate::persist;
use crate::registry::Registry;
use std::sync::Arc;
use tinylink_core::{AccessEvent, Diagnostic, UrlRecord, DEFAULT_REFERRER};
use tinylink_storage::Persistence;
use uuid::Uuid;

/// Records accesses of live short codes.
pub struct AnalyticsRecorder {
    registry: Arc<Registry>,
    persistence: Arc<dyn Persistence>,
    locator: Arc<dyn Locator>,
}

impl AnalyticsRecorder {
    pub fn new(registry: Arc<Registry>, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            registry,
            persistence,
            locator: Arc::new(FixedLocator::default()),
        }
    }

    pub fn with_locator(mut self, locator: Arc<dyn Locator>) -> Self {
        self.locator = locator;
        self
    }

    /// Appends an access event to `shortcode`'s record.
    ///
    /// Returns `false`, without side effects, if the code is unknown or has
    /// expired. A blank referrer is recorded as `"direct"`.
    pub async fn record_access(&self, shortcode: &str, referrer: &str) -> bool {
        self.record(shortcode, referrer).await.is_some()
    }

    /// Like [`AnalyticsRecorder::record_access`], returning the updated record.
    pub async fn record(&self, shortcode: &str, referrer: &str) -> Option<UrlRecord> {
        let referrer = match referrer.trim() {
            "" => DEFAULT_REFERRER,
            trimmed => trimmed,
        };
        let location = self
            .locator
            .locate(referrer)
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_owned());

        let record = self
            .registry
            .append_access(shortcode, |now| AccessEvent {
                id: Uuid::new_v4().to_string(),
                timestamp: now,
                referrer: referrer.to_owned(),
                location,
            })
            .ok()?;

        self.registry.sink().emit(Diagnostic::ClickRecorded {
            shortcode: record.shortcode.to_string(),
            referrer: referrer.to_owned(),
            click_count: record.click_count(),
        });

        persist::flush(&self.registry, &*self.persistence).await;

        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NewRecord;
    use jiff::{SignedDuration, Timestamp};
    use tinylink_core::{Clock, ManualClock, MemorySink, ShortCode};
    use tinylink_storage::InMemoryPersistence;

    struct Fixture {
        recorder: AnalyticsRecorder,
        registry: Arc<Registry>,
        persistence: Arc<InMemoryPersistence>,
        clock: ManualClock,
        sink: Arc<MemorySink>,
    }

    fn fixture() -> Fixture {
        let clock = ManualClock::new(Timestamp::from_second(1_700_000_000).unwrap());
        let sink = Arc::new(MemorySink::new());
        let registry = Arc::new(Registry::new(Arc::new(clock.clone()), sink.clone()));
        registry
            .insert(NewRecord {
                id: "1".into(),
                long_url: "https://example.com".into(),
                shortcode: ShortCode::new("abc").unwrap(),
                validity: SignedDuration::from_mins(1),
            })
            .unwrap();
        sink.take();

        let persistence = Arc::new(InMemoryPersistence::new());
        let recorder = AnalyticsRecorder::new(registry.clone(), persistence.clone());
        Fixture {
            recorder,
            registry,
            persistence,
            clock,
            sink,
        }
    }

    #[tokio::test]
    async fn records_event_on_live_code() {
        let f = fixture();
        f.clock.advance(SignedDuration::from_secs(10));

        assert!(f.recorder.record_access("abc", "https://news.site").await);

        let record = f.registry.lookup("abc").unwrap();
        assert_eq!(record.click_count(), 1);
        let click = &record.clicks[0];
        assert_eq!(click.referrer, "https://news.site");
        assert_eq!(click.location, UNKNOWN_LOCATION);
        assert_eq!(click.timestamp, f.clock.now());
        assert!(!click.id.is_empty());
    }

    #[tokio::test]
    async fn appends_without_touching_earlier_events() {
        let f = fixture();

        f.recorder.record_access("abc", "first").await;
        let before = f.registry.lookup("abc").unwrap().clicks;
        f.recorder.record_access("abc", "second").await;
        let after = f.registry.lookup("abc").unwrap().clicks;

        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after[..before.len()], before[..]);
        assert_eq!(after[1].referrer, "second");
        assert_ne!(after[0].id, after[1].id);
    }

    #[tokio::test]
    async fn blank_referrer_is_direct() {
        let f = fixture();

        f.recorder.record_access("abc", "  ").await;

        let record = f.registry.lookup("abc").unwrap();
        assert_eq!(record.clicks[0].referrer, DEFAULT_REFERRER);
    }

    #[tokio::test]
    async fn unknown_code_is_a_no_op() {
        let f = fixture();
        let before = f.registry.snapshot();

        assert!(!f.recorder.record_access("missing", "direct").await);

        assert_eq!(f.registry.snapshot(), before);
        assert_eq!(f.persistence.save_count(), 0);
        assert_eq!(
            f.sink.events(),
            vec![Diagnostic::ShortcodeNotFound {
                shortcode: "missing".into()
            }]
        );
    }

    #[tokio::test]
    async fn expired_code_is_a_no_op() {
        let f = fixture();
        f.clock.advance(SignedDuration::from_mins(1));

        assert!(!f.recorder.record_access("abc", "direct").await);

        assert!(f.registry.is_empty());
        assert_eq!(f.persistence.save_count(), 0);
        assert!(f.sink.events().contains(&Diagnostic::ExpiredAccess {
            shortcode: "abc".into()
        }));
    }

    #[tokio::test]
    async fn uses_the_configured_locator() {
        let f = fixture();
        let recorder = f
            .recorder
            .with_locator(Arc::new(FixedLocator::new("India / AP")));

        let record = recorder.record("abc", "direct").await.unwrap();

        assert_eq!(record.clicks[0].location, "India / AP");
    }

    #[tokio::test]
    async fn each_click_is_saved_and_reported() {
        let f = fixture();

        f.recorder.record_access("abc", "direct").await;
        f.recorder.record_access("abc", "direct").await;

        assert_eq!(f.persistence.save_count(), 2);
        assert_eq!(f.persistence.records()[0].click_count(), 2);
        assert_eq!(
            f.sink.events().last(),
            Some(&Diagnostic::ClickRecorded {
                shortcode: "abc".into(),
                referrer: "direct".into(),
                click_count: 2,
            })
        );
    }
}
