use jiff::{SignedDuration, Timestamp};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tinylink_core::{
    AccessEvent, Clock, Diagnostic, DiagnosticSink, Result, ShortCode, ShortenerError, UrlRecord,
};
use tinylink_storage::Persistence;

/// A record waiting to be inserted.
///
/// `created_at` and `expires_at` are stamped by the registry at insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub id: String,
    pub long_url: String,
    pub shortcode: ShortCode,
    pub validity: SignedDuration,
}

#[derive(Debug)]
struct Entry {
    /// Insertion sequence, used to break `created_at` ties.
    seq: u64,
    record: UrlRecord,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<ShortCode, Entry>,
    next_seq: u64,
}

impl State {
    fn push(&mut self, record: UrlRecord) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries
            .insert(record.shortcode.clone(), Entry { seq, record });
    }

    fn in_insertion_order(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    fn prune(&mut self, now: Timestamp) -> Vec<ShortCode> {
        let expired: Vec<ShortCode> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.record.is_expired_at(now))
            .map(|(code, _)| code.clone())
            .collect();

        for code in &expired {
            self.entries.remove(code);
        }
        expired
    }
}

/// Bookkeeping for one critical section. Diagnostics raised under the lock
/// are queued here and emitted once the lock is released.
struct Pass {
    now: Timestamp,
    pruned: Vec<ShortCode>,
    diagnostics: Vec<Diagnostic>,
}

impl Pass {
    fn miss(&mut self, shortcode: &str) -> ShortenerError {
        if self.pruned.iter().any(|code| code.as_str() == shortcode) {
            self.diagnostics.push(Diagnostic::ExpiredAccess {
                shortcode: shortcode.to_owned(),
            });
            ShortenerError::Expired(shortcode.to_owned())
        } else {
            self.diagnostics.push(Diagnostic::ShortcodeNotFound {
                shortcode: shortcode.to_owned(),
            });
            ShortenerError::NotFound(shortcode.to_owned())
        }
    }
}

/// The authoritative in-memory store of short code to record mappings.
///
/// All state sits behind a single mutex and every public operation runs as
/// one critical section. Each operation starts by pruning records whose
/// `expires_at` has been reached, so expired records are never returned and
/// their codes can be reused immediately.
///
/// Diagnostics are handed to the sink only after the mutex is released, so a
/// sink may call back into the registry.
///
/// Pruning scans every live record, so a single call costs time proportional
/// to the store size.
pub struct Registry {
    state: Mutex<State>,
    /// Held from snapshot to the end of a save, so saves land in snapshot order.
    flush_lock: tokio::sync::Mutex<()>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            flush_lock: tokio::sync::Mutex::new(()),
            clock,
            sink,
        }
    }

    /// Creates a registry seeded with previously stored records.
    ///
    /// Records keep their stored order. If the same short code appears more
    /// than once, the first occurrence wins and each skipped copy is reported
    /// as [`Diagnostic::DuplicateStoredRecord`].
    pub fn with_records(
        records: Vec<UrlRecord>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        let registry = Self::new(clock, sink);
        let mut skipped = Vec::new();
        {
            let mut state = registry.state.lock();
            for record in records {
                if state.entries.contains_key(&record.shortcode) {
                    skipped.push(Diagnostic::DuplicateStoredRecord {
                        shortcode: record.shortcode.to_string(),
                    });
                    continue;
                }
                state.push(record);
            }
        }
        registry.report(skipped);
        registry
    }

    /// Creates a registry from whatever `persistence` holds.
    ///
    /// A failed load is reported to the sink and yields an empty registry.
    pub async fn load(
        persistence: &dyn Persistence,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        match persistence.load().await {
            Ok(records) => Self::with_records(records, clock, sink),
            Err(e) => {
                sink.emit(Diagnostic::LoadFailed {
                    reason: e.to_string(),
                });
                Self::new(clock, sink)
            }
        }
    }

    /// Inserts a new record and returns it as stored.
    ///
    /// Fails with `InvalidValidity` for a non-positive validity or one that
    /// overflows the timestamp range, and with `DuplicateShortcode` if a live
    /// record already uses the code.
    pub fn insert(&self, new: NewRecord) -> Result<UrlRecord> {
        self.run(|state, pass| {
            if new.validity <= SignedDuration::ZERO {
                return Err(ShortenerError::InvalidValidity(new.long_url));
            }

            if state.entries.contains_key(&new.shortcode) {
                return Err(ShortenerError::DuplicateShortcode(new.shortcode.to_string()));
            }

            let Ok(expires_at) = pass.now.checked_add(new.validity) else {
                return Err(ShortenerError::InvalidValidity(new.long_url));
            };

            let record = UrlRecord {
                id: new.id,
                long_url: new.long_url,
                shortcode: new.shortcode,
                created_at: pass.now,
                expires_at,
                clicks: Vec::new(),
            };
            state.push(record.clone());

            Ok(record)
        })
    }

    /// Returns the live record for `shortcode`, if any.
    pub fn lookup(&self, shortcode: &str) -> Option<UrlRecord> {
        self.resolve(shortcode).ok()
    }

    /// Like [`Registry::lookup`], but tells apart a code that never existed
    /// (`NotFound`) from one that expired during this call's pruning (`Expired`).
    pub fn resolve(&self, shortcode: &str) -> Result<UrlRecord> {
        self.run(|state, pass| match state.entries.get(shortcode) {
            Some(entry) => Ok(entry.record.clone()),
            None => Err(pass.miss(shortcode)),
        })
    }

    /// All live records, newest first. Records created at the same instant
    /// keep their insertion order.
    pub fn list_all(&self) -> Vec<UrlRecord> {
        self.run(|state, _| {
            let mut entries: Vec<&Entry> = state.entries.values().collect();
            entries.sort_by(|a, b| {
                b.record
                    .created_at
                    .cmp(&a.record.created_at)
                    .then(a.seq.cmp(&b.seq))
            });
            entries.into_iter().map(|entry| entry.record.clone()).collect()
        })
    }

    /// All live records in insertion order, as handed to persistence.
    pub fn snapshot(&self) -> Vec<UrlRecord> {
        self.run(|state, _| {
            state
                .in_insertion_order()
                .into_iter()
                .map(|entry| entry.record.clone())
                .collect()
        })
    }

    /// Removes every record, expired or not. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let count = {
            let mut state = self.state.lock();
            let count = state.entries.len();
            state.entries.clear();
            count
        };
        self.sink.emit(Diagnostic::Cleared { count });
        count
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.run(|state, _| state.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends an access event to a live record and returns the updated record.
    ///
    /// `event` receives the registry clock's current time.
    pub(crate) fn append_access(
        &self,
        shortcode: &str,
        event: impl FnOnce(Timestamp) -> AccessEvent,
    ) -> Result<UrlRecord> {
        self.run(|state, pass| {
            let Some(entry) = state.entries.get_mut(shortcode) else {
                return Err(pass.miss(shortcode));
            };

            entry.record.clicks.push(event(pass.now));
            Ok(entry.record.clone())
        })
    }

    pub(crate) fn sink(&self) -> &dyn DiagnosticSink {
        &*self.sink
    }

    pub(crate) fn flush_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.flush_lock
    }

    /// Runs `op` under the lock after reading the clock and pruning expired
    /// records, then emits whatever diagnostics the pass collected.
    fn run<T>(&self, op: impl FnOnce(&mut State, &mut Pass) -> T) -> T {
        let (result, pass) = {
            let mut state = self.state.lock();
            let now = self.clock.now();
            let pruned = state.prune(now);

            let mut pass = Pass {
                now,
                diagnostics: Vec::new(),
                pruned,
            };
            if !pass.pruned.is_empty() {
                pass.diagnostics.push(Diagnostic::ExpiredPruned {
                    count: pass.pruned.len(),
                });
            }

            let result = op(&mut *state, &mut pass);
            (result, pass)
        };

        self.report(pass.diagnostics);
        result
    }

    fn report(&self, diagnostics: Vec<Diagnostic>) {
        for diagnostic in diagnostics {
            self.sink.emit(diagnostic);
        }
    }
}
