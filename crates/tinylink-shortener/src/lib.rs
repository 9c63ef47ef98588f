//! URL shortener registry and click analytics.
//!
//! [`Registry`] is the single authoritative store of short code to record
//! mappings. It enforces uniqueness among live records and prunes expired
//! records at the start of every operation. [`BatchProcessor`] creates
//! records with partial-success semantics, [`AnalyticsRecorder`] appends
//! access events, and [`ShortenerService`] ties them to a persistence
//! backend for the presentation layer.

pub mod analytics;
pub mod batch;
pub mod locator;
mod persist;
pub mod registry;
pub mod service;

pub use analytics::AnalyticsRecorder;
pub use batch::{BatchOutcome, BatchProcessor, BatchSettings};
pub use locator::{FixedLocator, Locator, UNKNOWN_LOCATION};
pub use registry::{NewRecord, Registry};
pub use service::ShortenerService;
