//! Audit event builder.

use foriam_core::models::audit::{AuditStatus, CreateAuditLogEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Network origin of a request, as reported by the transport layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(ip_address: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip_address.into()),
            user_agent: Some(user_agent.into()),
        }
    }
}

/// A single action to be written to the audit trail.
///
/// ```
/// use foriam_audit::{AuditEvent, actions};
/// use foriam_core::models::audit::AuditStatus;
/// use uuid::Uuid;
///
/// let tenant_id = Uuid::new_v4();
/// let user_id = Uuid::new_v4();
/// let event = AuditEvent::new(tenant_id, actions::USER_CREATE, AuditStatus::Success)
///     .actor(user_id)
///     .resource("user", Uuid::new_v4());
/// assert_eq!(event.action(), "user.create");
/// ```
#[derive(Debug, Clone)]
pub struct AuditEvent {
    entry: CreateAuditLogEntry,
}

impl AuditEvent {
    pub fn new(tenant_id: Uuid, action: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            entry: CreateAuditLogEntry {
                tenant_id,
                user_id: None,
                action: action.into(),
                resource: None,
                resource_id: None,
                ip_address: None,
                user_agent: None,
                status,
            },
        }
    }

    /// The user who performed the action.
    pub fn actor(mut self, user_id: Uuid) -> Self {
        self.entry.user_id = Some(user_id);
        self
    }

    /// The entity the action was applied to.
    pub fn resource(mut self, kind: impl Into<String>, id: Uuid) -> Self {
        self.entry.resource = Some(kind.into());
        self.entry.resource_id = Some(id);
        self
    }

    pub fn client(mut self, client: &ClientInfo) -> Self {
        self.entry.ip_address = client.ip_address.clone();
        self.entry.user_agent = client.user_agent.clone();
        self
    }

    pub fn tenant_id(&self) -> Uuid {
        self.entry.tenant_id
    }

    pub fn action(&self) -> &str {
        &self.entry.action
    }

    pub(crate) fn into_entry(self) -> CreateAuditLogEntry {
        self.entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;

    #[test]
    fn builder_fills_optional_fields() {
        let tenant_id = Uuid::new_v4();
        let actor = Uuid::new_v4();
        let target = Uuid::new_v4();
        let client = ClientInfo::new("198.51.100.4", "foriam-cli/1.0");

        let entry = AuditEvent::new(tenant_id, actions::ROLE_ASSIGN, AuditStatus::Success)
            .actor(actor)
            .resource("role", target)
            .client(&client)
            .into_entry();

        assert_eq!(entry.tenant_id, tenant_id);
        assert_eq!(entry.user_id, Some(actor));
        assert_eq!(entry.resource.as_deref(), Some("role"));
        assert_eq!(entry.resource_id, Some(target));
        assert_eq!(entry.ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(entry.user_agent.as_deref(), Some("foriam-cli/1.0"));
    }

    #[test]
    fn bare_event_has_no_actor_or_client() {
        let entry = AuditEvent::new(Uuid::new_v4(), actions::AUTH_LOGOUT, AuditStatus::Failure)
            .client(&ClientInfo::default())
            .into_entry();

        assert!(entry.user_id.is_none());
        assert!(entry.resource.is_none());
        assert!(entry.ip_address.is_none());
        assert_eq!(entry.status, AuditStatus::Failure);
    }
}
