use crate::registry::Registry;
use tinylink_core::Diagnostic;
use tinylink_storage::Persistence;

/// Saves a snapshot of the registry.
///
/// The registry's flush lock is held from before the snapshot until the save
/// returns, so overlapping flushes reach the backend in snapshot order and an
/// older snapshot never overwrites a newer one. The registry state lock is
/// only held while the snapshot is copied.
///
/// A failed save leaves the in-memory state untouched and is only reported
/// to the diagnostic sink.
pub(crate) async fn flush(registry: &Registry, persistence: &dyn Persistence) {
    let _guard = registry.flush_lock().lock().await;
    let snapshot = registry.snapshot();
    if let Err(e) = persistence.save(&snapshot).await {
        registry.sink().emit(Diagnostic::SaveFailed {
            reason: e.to_string(),
        });
    }
}
