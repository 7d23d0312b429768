//! Bootstrap seeding of the `system` tenant and its administrator.

use foriam_core::error::{IamError, IamResult};
use foriam_core::models::permission::{CreatePermission, Permission};
use foriam_core::models::role::CreateRole;
use foriam_core::models::tenant::CreateTenant;
use foriam_core::models::user::CreateUser;
use foriam_core::repository::{
    PermissionRepository, RoleRepository, TenantRepository, UserRepository,
};
use surrealdb::{Connection, Surreal};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::repository::{
    SurrealPermissionRepository, SurrealRoleRepository, SurrealTenantRepository,
    SurrealUserRepository,
};

pub const SYSTEM_TENANT: &str = "system";
pub const ADMIN_ROLE: &str = "admin";

/// The permission catalog installed on first boot.
pub const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("user.read", "Read users"),
    ("user.write", "Create and modify users"),
    ("user.delete", "Delete users"),
    ("group.read", "Read groups"),
    ("group.write", "Create and modify groups"),
    ("group.delete", "Delete groups"),
    ("role.read", "Read roles"),
    ("role.write", "Create and modify roles"),
    ("role.delete", "Delete roles"),
    ("audit.read", "Read the audit log"),
    ("system.admin", "Full administrative access"),
];

/// Credentials of the bootstrap administrator. The password must already
/// be hashed by the caller.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { tenant_id: Uuid, admin_user_id: Uuid },
    AlreadySeeded { tenant_id: Uuid },
}

/// Install the `system` tenant, its administrator and the default
/// permission catalog. Does nothing when the `system` tenant exists.
///
/// If any step after the tenant is created fails, the tenant is deleted
/// again (cascading to whatever was created inside it), so a later run
/// starts from scratch instead of seeing a half-seeded tenant.
pub async fn seed<C: Connection>(db: &Surreal<C>, admin: BootstrapAdmin) -> IamResult<SeedOutcome> {
    let tenants = SurrealTenantRepository::new(db.clone());
    match tenants.get_by_name(SYSTEM_TENANT).await {
        Ok(existing) => {
            info!(tenant_id = %existing.id, "System tenant present, skipping seed");
            return Ok(SeedOutcome::AlreadySeeded {
                tenant_id: existing.id,
            });
        }
        Err(IamError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    let tenant = tenants
        .create(CreateTenant {
            name: SYSTEM_TENANT.into(),
        })
        .await?;

    let admin_user_id = match populate(db, tenant.id, admin).await {
        Ok(id) => id,
        Err(e) => {
            warn!(tenant_id = %tenant.id, error = %e, "Seed failed, removing system tenant");
            if let Err(rollback) = tenants.delete(tenant.id).await {
                error!(
                    tenant_id = %tenant.id,
                    error = %rollback,
                    "Could not remove partially seeded system tenant"
                );
            }
            return Err(e);
        }
    };

    info!(
        tenant_id = %tenant.id,
        %admin_user_id,
        permissions = DEFAULT_PERMISSIONS.len(),
        "Seeded system tenant"
    );

    Ok(SeedOutcome::Seeded {
        tenant_id: tenant.id,
        admin_user_id,
    })
}

/// Admin user, `admin` role, catalog grants and the role assignment.
async fn populate<C: Connection>(
    db: &Surreal<C>,
    tenant_id: Uuid,
    admin: BootstrapAdmin,
) -> IamResult<Uuid> {
    let users = SurrealUserRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db.clone());

    let admin_user = users
        .create(CreateUser {
            tenant_id,
            email: admin.email,
            password_hash: admin.password_hash,
        })
        .await?;

    let admin_role = roles
        .create(CreateRole {
            tenant_id,
            name: ADMIN_ROLE.into(),
            description: "System administrator".into(),
        })
        .await?;

    for (name, description) in DEFAULT_PERMISSIONS {
        let permission = ensure_permission(&permissions, name, description).await?;
        permissions
            .grant_to_role(tenant_id, admin_role.id, permission.id)
            .await?;
    }

    roles
        .assign_to_user(tenant_id, admin_user.id, admin_role.id)
        .await?;

    Ok(admin_user.id)
}

/// The catalog is global, so entries may survive a deleted `system` tenant.
async fn ensure_permission<P: PermissionRepository>(
    permissions: &P,
    name: &str,
    description: &str,
) -> IamResult<Permission> {
    match permissions
        .create(CreatePermission {
            name: name.into(),
            description: description.into(),
        })
        .await
    {
        Ok(permission) => Ok(permission),
        Err(IamError::DuplicateName { .. }) => permissions.get_by_name(name).await,
        Err(e) => Err(e),
    }
}
