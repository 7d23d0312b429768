//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::tenant::{CreateTenant, Tenant};
use foriam_core::repository::{PaginatedResult, Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid, total_of};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    created_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Tenant {
        Tenant {
            id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id: parse_uuid(&self.record_id, "tenant")?,
            name: self.name,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> IamResult<Tenant> {
        let id = Uuid::new_v4();
        let name = input.name;

        let mut result = self
            .db
            .query("CREATE type::record('tenant', $id) SET name = $name")
            .bind(("id", id.to_string()))
            .bind(("name", name.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                DbError::from_check(e).or_duplicate(|| IamError::DuplicateName {
                    entity: "tenant".into(),
                    name: name.clone(),
                })
            })?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("tenant", id))?;

        Ok(row.into_tenant(id))
    }

    async fn get_by_id(&self, id: Uuid) -> IamResult<Tenant> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("tenant", id))?;

        Ok(row.into_tenant(id))
    }

    async fn get_by_name(&self, name: &str) -> IamResult<Tenant> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE name = $name LIMIT 1",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("tenant", name))?;

        Ok(row.try_into_tenant()?)
    }

    async fn list(&self, pagination: Pagination) -> IamResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = total_of(count_rows);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit()))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_tenant())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    async fn delete(&self, id: Uuid) -> IamResult<()> {
        let id_str = id.to_string();

        // Junction rows go first: their tenant guard walks through the
        // endpoint records, which must still exist.
        let mut result = self
            .db
            .query(
                "DELETE has_role WHERE out.tenant_id = $id; \
                 DELETE member_of WHERE out.tenant_id = $id; \
                 DELETE grants WHERE in.tenant_id = $id; \
                 DELETE user WHERE tenant_id = $id; \
                 DELETE role WHERE tenant_id = $id; \
                 DELETE group WHERE tenant_id = $id; \
                 DELETE audit_log WHERE tenant_id = $id; \
                 DELETE type::record('tenant', $id) RETURN BEFORE;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        let removed: Vec<TenantRow> = result.take(7).map_err(DbError::from)?;
        if removed.is_empty() {
            return Err(DbError::NotFound {
                entity: "tenant".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }
}
