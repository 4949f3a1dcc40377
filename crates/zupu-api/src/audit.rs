//! Audit recording for handlers.

use zupu_core::{audit::NewAuditEntry, store::AuditSink};

/// Append `entry`. Failures are logged, never returned: a lost audit entry
/// does not fail the action it describes.
pub async fn record<S: AuditSink>(store: &S, entry: NewAuditEntry) {
  let action = entry.action.clone();
  if let Err(e) = store.append(entry).await {
    tracing::warn!(action = %action, error = %e, "failed to write audit entry");
  }
}
