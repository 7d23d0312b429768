//! SurrealDB implementation of [`AuditLogRepository`].
//!
//! Append-only: the trait exposes no update or delete, and the table
//! denies both at the schema level.

use chrono::{DateTime, Utc};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::audit::{AuditLogEntry, AuditStatus, CreateAuditLogEntry};
use foriam_core::repository::{AuditLogFilter, AuditLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid, total_of};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AuditRow {
    tenant_id: String,
    user_id: Option<String>,
    action: String,
    resource: Option<String>,
    resource_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct AuditRowWithId {
    record_id: String,
    tenant_id: String,
    user_id: Option<String>,
    action: String,
    resource: Option<String>,
    resource_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<AuditStatus, DbError> {
    AuditStatus::parse(s).ok_or_else(|| DbError::Decode(format!("unknown audit status: {s}")))
}

fn parse_optional_uuid(raw: Option<&str>, what: &str) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| parse_uuid(s, what)).transpose()
}

impl AuditRow {
    fn into_entry(self, id: Uuid) -> Result<AuditLogEntry, DbError> {
        Ok(AuditLogEntry {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            user_id: parse_optional_uuid(self.user_id.as_deref(), "user")?,
            action: self.action,
            resource: self.resource,
            resource_id: parse_optional_uuid(self.resource_id.as_deref(), "resource")?,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

impl AuditRowWithId {
    fn try_into_entry(self) -> Result<AuditLogEntry, DbError> {
        Ok(AuditLogEntry {
            id: parse_uuid(&self.record_id, "audit entry")?,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            user_id: parse_optional_uuid(self.user_id.as_deref(), "user")?,
            action: self.action,
            resource: self.resource,
            resource_id: parse_optional_uuid(self.resource_id.as_deref(), "resource")?,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the audit log repository.
#[derive(Clone)]
pub struct SurrealAuditLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAuditLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AuditLogRepository for SurrealAuditLogRepository<C> {
    async fn append(&self, input: CreateAuditLogEntry) -> IamResult<AuditLogEntry> {
        let id = Uuid::new_v4();

        let mut result = self
            .db
            .query(
                "CREATE type::record('audit_log', $id) SET \
                 tenant_id = $tenant_id, \
                 user_id = $user_id, \
                 action = $action, \
                 resource = $resource, \
                 resource_id = $resource_id, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 status = $status",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("user_id", input.user_id.map(|u| u.to_string())))
            .bind(("action", input.action))
            .bind(("resource", input.resource))
            .bind(("resource_id", input.resource_id.map(|r| r.to_string())))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("status", input.status.as_str()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        let rows: Vec<AuditRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("audit_log", id))?;

        Ok(row.into_entry(id)?)
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> IamResult<PaginatedResult<AuditLogEntry>> {
        let by_action = filter.action.is_some();
        let by_user = filter.user_id.is_some();

        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM audit_log \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_action OR action = $action) \
                 AND (!$by_user OR user_id = $user_id) \
                 GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM audit_log \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_action OR action = $action) \
                 AND (!$by_user OR user_id = $user_id) \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset;",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("by_action", by_action))
            .bind(("action", filter.action))
            .bind(("by_user", by_user))
            .bind(("user_id", filter.user_id.map(|u| u.to_string())))
            .bind(("limit", pagination.limit()))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<AuditRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total_of(count_rows),
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }
}
