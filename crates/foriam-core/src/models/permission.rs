//! Permission domain model.
//!
//! Permissions form a single catalog shared by all tenants; only the
//! role that grants a permission is tenant-scoped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    /// Dotted action name (e.g., `doc.write`), globally unique.
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub description: String,
}
