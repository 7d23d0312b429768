//! SurrealDB implementation of [`GroupRepository`].

use chrono::{DateTime, Utc};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::group::{CreateGroup, Group, GroupFilter, UpdateGroup};
use foriam_core::models::user::User;
use foriam_core::repository::{GroupRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::user::UserRowWithId;
use super::{CountRow, ensure_in_tenant, parse_uuid, total_of};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct GroupRow {
    tenant_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRow {
    fn into_group(self, id: Uuid) -> Result<Group, DbError> {
        Ok(Group {
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
struct GroupRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl GroupRowWithId {
    fn try_into_group(self) -> Result<Group, DbError> {
        Ok(Group {
            id: parse_uuid(&self.record_id, "group")?,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn duplicate_group(name: String) -> IamError {
    IamError::DuplicateName {
        entity: "group".into(),
        name,
    }
}

/// SurrealDB implementation of the Group repository.
#[derive(Clone)]
pub struct SurrealGroupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealGroupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> GroupRepository for SurrealGroupRepository<C> {
    async fn create(&self, input: CreateGroup) -> IamResult<Group> {
        let id = Uuid::new_v4();
        let name = input.name;

        let mut result = self
            .db
            .query(
                "CREATE type::record('group', $id) SET \
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
            .map_err(|e| DbError::from_check(e).or_duplicate(|| duplicate_group(name.clone())))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("group", id))?;

        Ok(row.into_group(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> IamResult<Group> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('group', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("group", id))?;

        Ok(row.into_group(id)?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateGroup) -> IamResult<Group> {
        let new_name = input.name.into_option();
        let attempted = new_name.clone().unwrap_or_default();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('group', $id) SET \
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
            .map_err(|e| DbError::from_check(e).or_duplicate(|| duplicate_group(attempted)))?;

        let rows: Vec<GroupRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("group", id))?;

        Ok(row.into_group(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> IamResult<()> {
        // Membership and role edges first, then the group record.
        let mut result = self
            .db
            .query(
                "DELETE member_of WHERE out = type::record('group', $id) \
                 AND out.tenant_id = $tenant_id; \
                 DELETE has_role WHERE in = type::record('group', $id) \
                 AND in.tenant_id = $tenant_id; \
                 DELETE type::record('group', $id) \
                 WHERE tenant_id = $tenant_id RETURN BEFORE;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        let removed: Vec<GroupRow> = result.take(2).map_err(DbError::from)?;
        if removed.is_empty() {
            return Err(IamError::not_found("group", id));
        }

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: GroupFilter,
        pagination: Pagination,
    ) -> IamResult<PaginatedResult<Group>> {
        let by_name = filter.name.is_some();

        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM group \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_name OR name = $name) \
                 GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM group \
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
        let rows: Vec<GroupRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total_of(count_rows),
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    async fn add_member(&self, tenant_id: Uuid, user_id: Uuid, group_id: Uuid) -> IamResult<()> {
        // Verify both user and group belong to the same tenant.
        ensure_in_tenant(&self.db, "user", user_id, tenant_id).await?;
        ensure_in_tenant(&self.db, "group", group_id, tenant_id).await?;

        let outcome = self
            .db
            .query(
                "LET $member = type::record('user', $user_id); \
                 LET $target = type::record('group', $group_id); \
                 RELATE $member->member_of->$target;",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check);

        match outcome {
            Ok(_) => Ok(()),
            // Already a member.
            Err(e) if e.is_conflict() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_member(&self, tenant_id: Uuid, user_id: Uuid, group_id: Uuid) -> IamResult<()> {
        self.db
            .query(
                "DELETE member_of WHERE \
                 in = type::record('user', $user_id) AND \
                 out = type::record('group', $group_id) AND \
                 out.tenant_id = $tenant_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        Ok(())
    }

    async fn get_members(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        pagination: Pagination,
    ) -> IamResult<PaginatedResult<User>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM member_of \
                 WHERE out = type::record('group', $group_id) \
                 AND out.tenant_id = $tenant_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id \
                 AND id IN (\
                     SELECT VALUE in FROM member_of \
                     WHERE out = type::record('group', $group_id)\
                 ) \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset;",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("group_id", group_id.to_string()))
            .bind(("limit", pagination.limit()))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<UserRowWithId> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total_of(count_rows),
            page: pagination.page(),
            limit: pagination.limit(),
        })
    }

    async fn get_user_groups(&self, tenant_id: Uuid, user_id: Uuid) -> IamResult<Vec<Group>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM group \
                 WHERE tenant_id = $tenant_id \
                 AND id IN (\
                     SELECT VALUE out FROM member_of \
                     WHERE in = type::record('user', $user_id)\
                 ) \
                 ORDER BY name ASC",
            )
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<GroupRowWithId> = result.take(0).map_err(DbError::from)?;
        let groups = rows
            .into_iter()
            .map(|row| row.try_into_group())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(groups)
    }
}
