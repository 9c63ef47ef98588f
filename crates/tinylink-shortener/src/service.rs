use crate::analytics::AnalyticsRecorder;
use crate::batch::{BatchOutcome, BatchProcessor, BatchSettings};
use crate::locator::Locator;
use crate::persist;
use crate::registry::Registry;
use std::sync::Arc;
use tinylink_core::{Clock, CreationRequest, DiagnosticSink, UrlRecord};
use tinylink_generator::Generator;
use tinylink_storage::Persistence;

/// The operations the presentation layer needs, wired to one registry and
/// one persistence backend.
///
/// This service wraps a [`Registry`], a [`BatchProcessor`] and an
/// [`AnalyticsRecorder`] to handle:
/// - loading the registry from persistence at startup
/// - batch creation of short links
/// - redirects, which resolve a code and record the access
/// - listing and clearing, with the cleared state persisted
pub struct ShortenerService<G> {
    registry: Arc<Registry>,
    batch: BatchProcessor<G>,
    analytics: AnalyticsRecorder,
    persistence: Arc<dyn Persistence>,
}

impl<G: Generator> ShortenerService<G> {
    /// Loads the registry from `persistence` and builds the service around it.
    pub async fn open(
        persistence: Arc<dyn Persistence>,
        generator: G,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let registry = Arc::new(Registry::load(&*persistence, clock, sink).await);
        Self::new(registry, generator, persistence)
    }

    pub fn new(registry: Arc<Registry>, generator: G, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            batch: BatchProcessor::new(registry.clone(), generator, persistence.clone()),
            analytics: AnalyticsRecorder::new(registry.clone(), persistence.clone()),
            registry,
            persistence,
        }
    }

    pub fn with_settings(mut self, settings: BatchSettings) -> Self {
        self.batch = self.batch.with_settings(settings);
        self
    }

    pub fn with_locator(mut self, locator: Arc<dyn Locator>) -> Self {
        self.analytics = self.analytics.with_locator(locator);
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub async fn shorten<I>(&self, requests: I) -> BatchOutcome
    where
        I: IntoIterator<Item = CreationRequest>,
    {
        self.batch.process(requests).await
    }

    /// Resolves a code for redirection, recording the access.
    ///
    /// Returns `None` if the code is unknown or expired.
    pub async fn redirect(&self, shortcode: &str, referrer: &str) -> Option<UrlRecord> {
        self.analytics.record(shortcode, referrer).await
    }

    /// Resolves a code without recording an access.
    pub fn lookup(&self, shortcode: &str) -> Option<UrlRecord> {
        self.registry.lookup(shortcode)
    }

    /// All live records, newest first.
    pub fn list(&self) -> Vec<UrlRecord> {
        self.registry.list_all()
    }

    /// Removes every record and persists the empty state.
    pub async fn clear(&self) -> usize {
        let removed = self.registry.clear();
        persist::flush(&self.registry, &*self.persistence).await;
        removed
    }
}
