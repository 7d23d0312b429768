//! Audit recorder: append and query the audit trail.

use std::time::Duration;

use foriam_core::error::IamResult;
use foriam_core::models::audit::AuditLogEntry;
use foriam_core::repository::{AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::event::AuditEvent;

/// Outcome of a recording attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditReceipt {
    Recorded { id: Uuid },
    Dropped { reason: String },
    /// The write outlived the caller's wait budget and continues in the
    /// background.
    Deferred,
}

impl AuditReceipt {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditReceipt::Recorded { .. })
    }
}

/// Best-effort audit recorder.
///
/// Generic over the audit store so that callers do not depend on the
/// database crate.
#[derive(Clone)]
pub struct AuditRecorder<A: AuditLogRepository> {
    repo: A,
}

impl<A: AuditLogRepository> AuditRecorder<A> {
    pub fn new(repo: A) -> Self {
        Self { repo }
    }

    /// Append an event. Store failures are logged and returned as
    /// [`AuditReceipt::Dropped`], never as an error.
    pub async fn record(&self, event: AuditEvent) -> AuditReceipt {
        append(&self.repo, event).await
    }

    /// Newest entries first, always within one tenant.
    pub async fn query(
        &self,
        tenant_id: Uuid,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> IamResult<PaginatedResult<AuditLogEntry>> {
        self.repo.list(tenant_id, filter, pagination).await
    }
}

impl<A: AuditLogRepository + Clone + 'static> AuditRecorder<A> {
    /// Append on a spawned task so the caller does not wait for the store.
    /// Must be called from within a tokio runtime.
    pub fn record_detached(&self, event: AuditEvent) -> JoinHandle<AuditReceipt> {
        let repo = self.repo.clone();
        tokio::spawn(async move { append(&repo, event).await })
    }

    /// Append on a spawned task and wait at most `budget` for it. A slow
    /// store yields [`AuditReceipt::Deferred`]; the write is not cancelled.
    pub async fn record_within(&self, event: AuditEvent, budget: Duration) -> AuditReceipt {
        let tenant_id = event.tenant_id();
        let action = event.action().to_string();

        match tokio::time::timeout(budget, self.record_detached(event)).await {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(e)) => {
                warn!(%tenant_id, %action, error = %e, "Audit task failed");
                AuditReceipt::Dropped {
                    reason: e.to_string(),
                }
            }
            Err(_) => {
                debug!(%tenant_id, %action, ?budget, "Audit write still pending");
                AuditReceipt::Deferred
            }
        }
    }
}

async fn append<A: AuditLogRepository>(repo: &A, event: AuditEvent) -> AuditReceipt {
    let tenant_id = event.tenant_id();
    let action = event.action().to_string();

    match repo.append(event.into_entry()).await {
        Ok(entry) => {
            debug!(audit_id = %entry.id, %tenant_id, %action, "Audit entry recorded");
            AuditReceipt::Recorded { id: entry.id }
        }
        Err(e) => {
            warn!(%tenant_id, %action, error = %e, "Dropping audit entry");
            AuditReceipt::Dropped {
                reason: e.to_string(),
            }
        }
    }
}
