//! Tenant domain model.
//!
//! Tenants are the root of data isolation. Users, roles and groups are
//! each owned by exactly one tenant and are removed with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An isolated organizational namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    /// Globally unique human-readable name (e.g., `acme`).
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    pub name: String,
}
