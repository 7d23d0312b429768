//! RBAC resolution: the set of permissions a user holds in a tenant.
//!
//! A user's roles are the union of the roles assigned directly and the
//! roles assigned to the groups the user belongs to. Both are single
//! hops: groups do not nest and roles do not inherit.

use std::collections::{BTreeMap, BTreeSet};

use foriam_core::error::IamResult;
use foriam_core::models::permission::Permission;
use foriam_core::repository::{PermissionRepository, RoleRepository};
use tracing::debug;
use uuid::Uuid;

/// A deduplicated set of permissions, keyed by permission id.
#[derive(Debug, Clone, Default)]
pub struct EffectivePermissions {
    by_id: BTreeMap<Uuid, Permission>,
}

impl EffectivePermissions {
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_id.values().any(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.by_id.values()
    }

    /// Permission names in lexical order.
    pub fn names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self.by_id.values().map(|p| p.name.as_str()).collect();
        names.into_iter().collect()
    }

    fn extend(&mut self, permissions: Vec<Permission>) {
        for permission in permissions {
            self.by_id.entry(permission.id).or_insert(permission);
        }
    }
}

/// Resolves effective permissions from role assignments.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct PermissionResolver<R: RoleRepository, P: PermissionRepository> {
    roles: R,
    permissions: P,
}

impl<R: RoleRepository, P: PermissionRepository> PermissionResolver<R, P> {
    pub fn new(roles: R, permissions: P) -> Self {
        Self { roles, permissions }
    }

    /// Union of the permissions granted to every role the user holds,
    /// directly or through a group. Unknown users resolve to an empty set.
    pub async fn effective_permissions(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> IamResult<EffectivePermissions> {
        let (direct, via_groups) = tokio::try_join!(
            self.roles.get_user_roles(tenant_id, user_id),
            self.roles.get_user_group_roles(tenant_id, user_id),
        )?;

        let role_ids: BTreeSet<Uuid> = direct
            .iter()
            .chain(via_groups.iter())
            .map(|role| role.id)
            .collect();

        let mut effective = EffectivePermissions::default();
        for role_id in &role_ids {
            let granted = self
                .permissions
                .get_role_permissions(tenant_id, *role_id)
                .await?;
            effective.extend(granted);
        }

        debug!(
            %user_id,
            %tenant_id,
            roles = role_ids.len(),
            permissions = effective.len(),
            "Resolved effective permissions"
        );

        Ok(effective)
    }

    pub async fn has_permission(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        permission: &str,
    ) -> IamResult<bool> {
        Ok(self
            .effective_permissions(user_id, tenant_id)
            .await?
            .contains(permission))
    }
}
