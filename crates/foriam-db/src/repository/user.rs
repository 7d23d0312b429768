//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::user::{CreateUser, UpdateUser, User, UserFilter};
use foriam_core::repository::{PaginatedResult, Pagination, UserRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{CountRow, parse_uuid, total_of};
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant_id: String,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            email: self.email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct UserRowWithId {
    record_id: String,
    tenant_id: String,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    pub(crate) fn try_into_user(self) -> Result<User, DbError> {
        Ok(User {
            id: parse_uuid(&self.record_id, "user")?,
            tenant_id: parse_uuid(&self.tenant_id, "tenant")?,
            email: self.email,
            password_hash: self.password_hash,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
///
/// Stores the already-computed password hash; hashing belongs to the
/// authentication layer.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> IamResult<User> {
        let id = Uuid::new_v4();
        let email = input.email;

        let mut result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, \
                 email = $email, \
                 password_hash = $password_hash",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", input.tenant_id.to_string()))
            .bind(("email", email.clone()))
            .bind(("password_hash", input.password_hash))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                DbError::from_check(e).or_duplicate(|| IamError::DuplicateEmail {
                    email: email.clone(),
                })
            })?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("user", id))?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> IamResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('user', $id) \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("user", id))?;

        Ok(row.into_user(id)?)
    }

    async fn get_active_by_email(&self, email: &str) -> IamResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email AND is_active = true LIMIT 1",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("user", email))?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, tenant_id: Uuid, id: Uuid, input: UpdateUser) -> IamResult<User> {
        let new_email = input.email.into_option();
        let duplicate = new_email.clone().unwrap_or_default();

        // Unset fields bind NONE and fall back to the stored value.
        let mut result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 email = $email ?? email, \
                 is_active = $is_active ?? is_active, \
                 updated_at = time::now() \
                 WHERE tenant_id = $tenant_id",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .bind(("email", new_email))
            .bind(("is_active", input.is_active.into_option()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| {
                DbError::from_check(e)
                    .or_duplicate(|| IamError::DuplicateEmail { email: duplicate })
            })?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| IamError::not_found("user", id))?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> IamResult<()> {
        let mut result = self
            .db
            .query(
                "DELETE has_role WHERE in = type::record('user', $id) \
                 AND in.tenant_id = $tenant_id; \
                 DELETE member_of WHERE in = type::record('user', $id) \
                 AND in.tenant_id = $tenant_id; \
                 DELETE type::record('user', $id) \
                 WHERE tenant_id = $tenant_id RETURN BEFORE;",
            )
            .bind(("id", id.to_string()))
            .bind(("tenant_id", tenant_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from_check)?;

        let removed: Vec<UserRow> = result.take(2).map_err(DbError::from)?;
        if removed.is_empty() {
            return Err(IamError::not_found("user", id));
        }

        Ok(())
    }

    async fn list(
        &self,
        tenant_id: Uuid,
        filter: UserFilter,
        pagination: Pagination,
    ) -> IamResult<PaginatedResult<User>> {
        let tenant_id_str = tenant_id.to_string();
        let by_email = filter.email.is_some();
        let by_active = filter.is_active.is_some();

        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_email OR email = $email) \
                 AND (!$by_active OR is_active = $is_active) \
                 GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE tenant_id = $tenant_id \
                 AND (!$by_email OR email = $email) \
                 AND (!$by_active OR is_active = $is_active) \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset;",
            )
            .bind(("tenant_id", tenant_id_str))
            .bind(("by_email", by_email))
            .bind(("email", filter.email))
            .bind(("by_active", by_active))
            .bind(("is_active", filter.is_active))
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
}
