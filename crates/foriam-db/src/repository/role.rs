//! SurrealDB implementation of [`RoleRepository`].
//!
//! Role assignments are `has_role` graph edges pointing from a user or a
//! group to a role. A unique `(in, out)` index keeps at most one edge per
//! pair, so repeating an assignment is a no-op.

use chrono::{DateTime, Utc};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::role::{CreateRole, Role, RoleFilter, UpdateRole};
use foriam_core::repository::{PaginatedResult, Pagination, RoleRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, ensure_in_tenant, parse_uuid, total_of};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct RoleRow {
    tenant_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        Ok(Role {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        Ok(Role {
            id: parse_uuid(&self.record_id, "role")?,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn duplicate_role(name: String) -> IamError {
    IamError::DuplicateName {
        entity: "role".into(),
        name,
    }
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Run a fixed-shape role listing query bound to a single subject id.
    async fn roles_where(
        &self,
        query: &'static str,
        tenant_id: Uuid,
        subject_id: Uuid,
    ) -> IamResult<Vec<Role>> {
        let mut result = self
            .db
            .query(query)
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("subject_id", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }

    /// Create the `has_role` edge `subject -> role` after checking that
    /// both endpoints live in the tenant.
    async fn relate(
        &self,
        tenant_id: Uuid,
        subject_table: &'static str,
        subject_id: Uuid,
        role_id: Uuid,
    ) -> IamResult<()> {
        ensure_in_tenant(&self.db, subject_table, subject_id, tenant_id).await?;
        ensure_in_tenant(&self.db, "role", role_id, tenant_id).await?;

        let outcome = self
            .db
            .query(
                "LET $subject = type::record($subject_table, $subject_id); \
                 LET $role = type::record('role', $role_id); \
                 RELATE $subject->has_role->$role;",
            )
            .bind(("subject_table", subject_table))
            .bind(("subject_id", subject_id.to_string()))
            .bind(("role_id", role_id.to_string()))
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

    async fn unrelate(
        &self,
        tenant_id: Uuid,
        subject_table: &'static str,
        subject_id: Uuid,
        role_id: Uuid,
    ) -> IamResult<()> {
        self.db
            .query(
                "DELETE has_role WHERE \
                 in = type::record($subject_table, $subject_id) AND \
                 out = type::record('role', $role_id) AND \
                 out.tenant_id = $tenant_id",
            )
            .bind(("subject_table", subject_table))
            .bind(("subject_id", subject_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        Ok(())
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> IamResult<Role> {
        let id = Uuid::new_v4();
        let name = input.name;

        let mut result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, description = $description",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("name", name.clone()))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(e).or_duplicate(|| duplicate_role(name.clone())))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("role", id))?;

        Ok(row.into_role(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> IamResult<Role> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("role", id))?;

        Ok(row.into_role(id)?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateRole) -> IamResult<Role> {
        let new_name = input.name.into_option();
        let attempted = new_name.clone().unwrap_or_default();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('role', $id) SET \
                 name = $name ?? name, \
                 description = $description ?? description, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("name", new_name))
            .bind(("description", input.description.into_option()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_check(e).or_duplicate(|| duplicate_role(attempted)))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("role", id))?;

        Ok(row.into_role(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> IamResult<()> {
        // Assignment and grant edges first, then the role record.
        let mut result = self
            .db
            .query(
                "DELETE has_role WHERE out = type::record('role', $id) \
                 AND out.tenant_id = $tenant_id; \
                 DELETE grants WHERE in = type::record('role', $id) \
                 AND in.tenant_id = $tenant_id; \
                 DELETE type::record('role', $id) \
                 WHERE tenant_id = $tenant_id RETURN BEFORE;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        let removed: Vec<RoleRow> = result.take(2).map_err(DbError::from)?;
        if removed.is_empty() {
            return Err(IamError::not_found("role", id));
        }

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: RoleFilter,
        pagination: Pagination,
    ) -> IamResult<PaginatedResult<Role>> {
        let by_name = filter.name.is_some();

        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM role \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_name OR name = $name) \
                 GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_name OR name = $name) \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset;",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("by_name", by_name))
            .bind(("name", filter.name))
            .bind(("limit", pagination.limit()))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<RoleRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total_of(count_rows),
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    async fn assign_to_user(&self, tenant_id: Uuid, user_id: Uuid, role_id: Uuid) -> IamResult<()> {
        self.relate(tenant_id, "user", user_id, role_id).await
    }

    async fn unassign_from_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> IamResult<()> {
        self.unrelate(tenant_id, "user", user_id, role_id).await
    }

    async fn assign_to_group(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        role_id: Uuid,
    ) -> IamResult<()> {
        self.relate(tenant_id, "group", group_id, role_id).await
    }

    async fn unassign_from_group(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        role_id: Uuid,
    ) -> IamResult<()> {
        self.unrelate(tenant_id, "group", group_id, role_id).await
    }

    async fn get_user_roles(&self, tenant_id: Uuid, user_id: Uuid) -> IamResult<Vec<Role>> {
        self.roles_where(
            "SELECT meta::id(id) AS record_id, * FROM role \
             WHERE tenant_id = $tenant_id \
             AND id IN (\
                 SELECT VALUE out FROM has_role \
                 WHERE in = type::record('user', $subject_id)\
             ) \
             ORDER BY name ASC",
            tenant_id,
            user_id,
        )
        .await
    }

    async fn get_user_group_roles(&self, tenant_id: Uuid, user_id: Uuid) -> IamResult<Vec<Role>> {
        self.roles_where(
            "SELECT meta::id(id) AS record_id, * FROM role \
             WHERE tenant_id = $tenant_id \
             AND id IN (\
                 SELECT VALUE out FROM has_role \
                 WHERE in IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $subject_id)\
                 )\
             ) \
             ORDER BY name ASC",
            tenant_id,
            user_id,
        )
        .await
    }

    async fn get_group_roles(&self, tenant_id: Uuid, group_id: Uuid) -> IamResult<Vec<Role>> {
        self.roles_where(
            "SELECT meta::id(id) AS record_id, * FROM role \
             WHERE tenant_id = $tenant_id \
             AND id IN (\
                 SELECT VALUE out FROM has_role \
                 WHERE in = type::record('group', $subject_id)\
             ) \
             ORDER BY name ASC",
            tenant_id,
            group_id,
        )
        .await
    }
}
