//! SurrealDB implementation of [`PermissionRepository`].
//!
//! Permissions form a global catalog shared by all tenants. Grants are
//! `grants` edges from a tenant's role to a catalog entry; every grant
//! operation is guarded by the role's tenant.

use chrono::{DateTime, Utc};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::permission::{CreatePermission, Permission};
use foriam_core::repository::{PaginatedResult, Pagination, PermissionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, ensure_in_tenant, parse_uuid, total_of};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PermissionRow {
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_permission(self, id: Uuid) -> Permission {
        Permission {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, SurrealValue)]
struct PermissionRowWithId {
    record_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl PermissionRowWithId {
    fn try_into_permission(self) -> Result<Permission, DbError> {
        Ok(Permission {
            id: parse_uuid(&self.record_id, "permission")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Permission repository.
#[derive(Clone)]
pub struct SurrealPermissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPermissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PermissionRepository for SurrealPermissionRepository<C> {
    async fn create(&self, input: CreatePermission) -> IamResult<Permission> {
        let id = Uuid::new_v4();
        let name = input.name;

        let mut result = self
            .db
            .query(
                "CREATE type::record('permission', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id.to_string()))
            .bind(("name", name.clone()))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                DbError::from_check(e).or_duplicate(|| IamError::DuplicateName {
                    entity: "permission".into(),
                    name: name.clone(),
                })
            })?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("permission", id))?;

        Ok(row.into_permission(id))
    }

    async fn get_by_id(&self, id: Uuid) -> IamResult<Permission> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('permission', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("permission", id))?;

        Ok(row.into_permission(id))
    }

    async fn get_by_name(&self, name: &str) -> IamResult<Permission> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE name = $name LIMIT 1",
            )
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("permission", name))?;

        Ok(row.try_into_permission()?)
    }

    async fn list(&self, pagination: Pagination) -> IamResult<PaginatedResult<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM permission GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM permission \
                 ORDER BY name ASC \
                 LIMIT $limit START $offset;",
            )
            .bind(("limit", pagination.limit()))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<PermissionRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total_of(count_rows),
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    async fn delete(&self, id: Uuid) -> IamResult<()> {
        let mut result = self
            .db
            .query(
                "DELETE grants WHERE out = type::record('permission', $id); \
                 DELETE type::record('permission', $id) RETURN BEFORE;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        let removed: Vec<PermissionRow> = result.take(1).map_err(DbError::from)?;
        if removed.is_empty() {
            return Err(IamError::not_found("permission", id));
        }

        Ok(())
    }

    async fn grant_to_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> IamResult<()> {
        ensure_in_tenant(&self.db, "role", role_id, tenant_id).await?;
        self.get_by_id(permission_id).await?;

        let outcome = self
            .db
            .query(
                "LET $role = type::record('role', $role_id); \
                 LET $permission = type::record('permission', $permission_id); \
                 RELATE $role->grants->$permission;",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check);

        match outcome {
            Ok(_) => Ok(()),
            Err(e) if e.is_conflict() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn revoke_from_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> IamResult<()> {
        self.db
            .query(
                "DELETE grants WHERE \
                 in = type::record('role', $role_id) AND \
                 in.tenant_id = $tenant_id AND \
                 out = type::record('permission', $permission_id)",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("permission_id", permission_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        Ok(())
    }

    async fn get_role_permissions(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> IamResult<Vec<Permission>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM permission \
                 WHERE id IN (\
                     SELECT VALUE out FROM grants \
                     WHERE in = type::record('role', $role_id) \
                     AND in.tenant_id = $tenant_id\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("role_id", role_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PermissionRowWithId> = result.take(0).map_err(DbError::from)?;
        let permissions = rows
            .into_iter()
            .map(|row| row.try_into_permission())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(permissions)
    }
}
