//! ForIAM Audit — best-effort recording of security-relevant actions and
//! read-only access to the audit trail.
//!
//! Recording never fails the caller: a store error is logged and reported
//! back as [`AuditReceipt::Dropped`], and a bounded wait on a slow store
//! gives up with [`AuditReceipt::Deferred`] while the write carries on.

pub mod actions;
mod event;
mod recorder;

pub use event::{AuditEvent, ClientInfo};
pub use recorder::{AuditReceipt, AuditRecorder};
