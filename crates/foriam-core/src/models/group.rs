//! Group domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::patch::Patch;

/// A set of users that receive roles collectively. Roles assigned to a
/// group apply to every member; groups do not contain other groups.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroup {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateGroup {
    pub name: Patch<String>,
    pub description: Patch<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub name: Option<String>,
}
