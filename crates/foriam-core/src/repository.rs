//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `tenant_id` parameter and must apply it as a filter on
//! every statement they run: a row owned by another tenant behaves
//! exactly like a row that does not exist.

use uuid::Uuid;

use crate::error::IamResult;
use crate::models::{
    audit::{AuditLogEntry, CreateAuditLogEntry},
    group::{CreateGroup, Group, GroupFilter, UpdateGroup},
    permission::{CreatePermission, Permission},
    role::{CreateRole, Role, RoleFilter, UpdateRole},
    tenant::{CreateTenant, Tenant},
    user::{CreateUser, UpdateUser, User, UserFilter},
};

pub const DEFAULT_PAGE_LIMIT: u64 = 50;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Pagination parameters for list queries.
///
/// Construct with [`Pagination::new`], which clamps `limit` into
/// `1..=100` and floors `page` at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    limit: u64,
}

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Number of rows skipped before this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_LIMIT)
    }
}

/// A paginated result set. `total` counts every matching row, not just
/// the ones in `items`.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenant (global scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    /// Fails with `DuplicateName` if the name is taken.
    fn create(&self, input: CreateTenant) -> impl Future<Output = IamResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = IamResult<Tenant>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = IamResult<Tenant>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<Tenant>>> + Send;
    /// Deletes the tenant together with its users, roles, groups, their
    /// junction rows and its audit entries.
    fn delete(&self, id: Uuid) -> impl Future<Output = IamResult<()>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail` if the email exists in any tenant.
    fn create(&self, input: CreateUser) -> impl Future<Output = IamResult<User>> + Send;
    fn get_by_id(&self, tenant_id: Uuid, id: Uuid)
    -> impl Future<Output = IamResult<User>> + Send;
    /// The one unscoped user lookup: resolves an active account by email
    /// for the credential check, before any tenant is known.
    fn get_active_by_email(&self, email: &str) -> impl Future<Output = IamResult<User>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = IamResult<User>> + Send;
    /// Hard delete; removes the user's role assignments and group
    /// memberships.
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = IamResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        filter: UserFilter,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<User>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    /// Fails with `DuplicateName` if the tenant already has the name.
    fn create(&self, input: CreateRole) -> impl Future<Output = IamResult<Role>> + Send;
    fn get_by_id(&self, tenant_id: Uuid, id: Uuid)
    -> impl Future<Output = IamResult<Role>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = IamResult<Role>> + Send;
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = IamResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        filter: RoleFilter,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<Role>>> + Send;

    /// Assign a role to a user. Idempotent.
    fn assign_to_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    fn unassign_from_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    /// Assign a role to a group. Idempotent.
    fn assign_to_group(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    fn unassign_from_group(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    /// Roles assigned directly to a user.
    fn get_user_roles(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = IamResult<Vec<Role>>> + Send;

    /// Roles a user holds through the groups it belongs to.
    fn get_user_group_roles(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = IamResult<Vec<Role>>> + Send;

    /// Roles assigned to a group.
    fn get_group_roles(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = IamResult<Vec<Role>>> + Send;
}

pub trait GroupRepository: Send + Sync {
    fn create(&self, input: CreateGroup) -> impl Future<Output = IamResult<Group>> + Send;
    fn get_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = IamResult<Group>> + Send;
    fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        input: UpdateGroup,
    ) -> impl Future<Output = IamResult<Group>> + Send;
    fn delete(&self, tenant_id: Uuid, id: Uuid) -> impl Future<Output = IamResult<()>> + Send;
    fn list(
        &self,
        tenant_id: Uuid,
        filter: GroupFilter,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<Group>>> + Send;

    /// Add a user to a group (creates a `member_of` edge). Idempotent.
    fn add_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    fn remove_member(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        group_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    fn get_members(
        &self,
        tenant_id: Uuid,
        group_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<User>>> + Send;

    fn get_user_groups(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = IamResult<Vec<Group>>> + Send;
}

// ---------------------------------------------------------------------------
// Permission catalog (global scope)
// ---------------------------------------------------------------------------

pub trait PermissionRepository: Send + Sync {
    /// Fails with `DuplicateName` if the name is taken.
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = IamResult<Permission>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = IamResult<Permission>> + Send;
    fn get_by_name(&self, name: &str) -> impl Future<Output = IamResult<Permission>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<Permission>>> + Send;
    /// Removes the permission and every grant of it.
    fn delete(&self, id: Uuid) -> impl Future<Output = IamResult<()>> + Send;

    /// Grant a permission to a tenant's role (creates a `grants` edge).
    /// Idempotent.
    fn grant_to_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    fn revoke_from_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> impl Future<Output = IamResult<()>> + Send;

    fn get_role_permissions(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = IamResult<Vec<Permission>>> + Send;
}

// ---------------------------------------------------------------------------
// Audit (append-only, tenant-scoped)
// ---------------------------------------------------------------------------

/// Exact-match filters for audit log queries.
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub action: Option<String>,
    pub user_id: Option<Uuid>,
}

pub trait AuditLogRepository: Send + Sync {
    /// Append a new audit log entry. No update or delete operations exist.
    fn append(
        &self,
        input: CreateAuditLogEntry,
    ) -> impl Future<Output = IamResult<AuditLogEntry>> + Send;
    /// Newest entries first.
    fn list(
        &self,
        tenant_id: Uuid,
        filter: AuditLogFilter,
        pagination: Pagination,
    ) -> impl Future<Output = IamResult<PaginatedResult<AuditLogEntry>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(Pagination::new(1, 0).limit(), 1);
        assert_eq!(Pagination::new(1, 500).limit(), MAX_PAGE_LIMIT);
        assert_eq!(Pagination::new(1, 25).limit(), 25);
    }

    #[test]
    fn page_floor_is_one() {
        let p = Pagination::new(0, 10);
        assert_eq!(p.page(), 1);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn offset_follows_page() {
        assert_eq!(Pagination::new(3, 20).offset(), 40);
        assert_eq!(Pagination::default().limit(), DEFAULT_PAGE_LIMIT);
    }
}
