//! SurrealDB repository implementations.

mod audit;
mod group;
mod permission;
mod role;
mod tenant;
mod user;

pub use audit::SurrealAuditLogRepository;
pub use group::SurrealGroupRepository;
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use tenant::SurrealTenantRepository;
pub use user::SurrealUserRepository;

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for `SELECT count() AS total ... GROUP ALL` queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// `GROUP ALL` yields no row at all when nothing matched.
pub(crate) fn total_of(rows: Vec<CountRow>) -> u64 {
    rows.first().map(|r| r.total).unwrap_or(0)
}

pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

/// Fails with `NotFound` unless `table:id` exists and belongs to the tenant.
pub(crate) async fn ensure_in_tenant<C: Connection>(
    db: &Surreal<C>,
    table: &'static str,
    id: Uuid,
    tenant_id: Uuid,
) -> Result<(), DbError> {
    let id_str = id.to_string();
    let mut result = db
        .query(
            "SELECT count() AS total FROM type::record($table, $id) \
             WHERE tenant_id = $tenant_id GROUP ALL",
        )
        .bind(("table", table))
        .bind(("id", id_str.clone()))
        .bind(("tenant_id", tenant_id.to_string()))
        .await?;
    let rows: Vec<CountRow> = result.take(0)?;
    if total_of(rows) == 0 {
        return Err(DbError::NotFound {
            entity: table.into(),
            id: id_str,
        });
    }
    Ok(())
}
