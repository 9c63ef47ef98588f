//! Core types and traits for the tinylink URL shortener.
//!
//! This crate provides the domain model shared by the generator, storage
//! and shortener crates: validated short codes, URL records with their
//! click history, the validation predicates, the injectable clock and the
//! diagnostic sink.

pub mod clock;
pub mod diagnostics;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod validate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, NullSink, Severity, TracingSink};
pub use error::{Result, ShortenerError};
pub use record::{AccessEvent, CreationRequest, UrlRecord, DEFAULT_REFERRER};
pub use shortcode::ShortCode;
pub use validate::{is_valid_shortcode, is_valid_url, is_valid_validity};
