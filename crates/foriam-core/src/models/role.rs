//! Role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::Patch;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// Unique within the owning tenant only.
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRole {
    pub name: Patch<String>,
    pub description: Patch<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleFilter {
    pub name: Option<String>,
}
