//! Integration tests for the Tenant repository, including the cascade
//! performed when a tenant is deleted.

use foriam_core::error::IamError;
use foriam_core::models::audit::{AuditStatus, CreateAuditLogEntry};
use foriam_core::models::group::CreateGroup;
use foriam_core::models::permission::CreatePermission;
use foriam_core::models::role::CreateRole;
use foriam_core::models::tenant::CreateTenant;
use foriam_core::models::user::{CreateUser, UserFilter};
use foriam_core::repository::{
    AuditLogFilter, AuditLogRepository, GroupRepository, Pagination, PermissionRepository,
    RoleRepository, TenantRepository, UserRepository,
};
use foriam_db::repository::{
    SurrealAuditLogRepository, SurrealGroupRepository, SurrealPermissionRepository,
    SurrealRoleRepository, SurrealTenantRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use surrealdb_types::SurrealValue;

#[derive(Debug, SurrealValue)]
struct EdgeCount {
    total: u64,
}

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    foriam_db::run_migrations(&db).await.unwrap();
    db
}

fn tenant(name: &str) -> CreateTenant {
    CreateTenant { name: name.into() }
}

#[tokio::test]
async fn create_and_get_tenant() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let created = repo.create(tenant("acme")).await.unwrap();
    assert_eq!(created.name, "acme");

    let by_id = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(by_id.name, "acme");

    let by_name = repo.get_by_name("acme").await.unwrap();
    assert_eq!(by_name.id, created.id);
}

#[tokio::test]
async fn duplicate_tenant_name_rejected() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    repo.create(tenant("acme")).await.unwrap();
    let err = repo.create(tenant("acme")).await.unwrap_err();
    assert!(
        matches!(err, IamError::DuplicateName { ref entity, .. } if entity == "tenant"),
        "expected DuplicateName, got {err:?}"
    );
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    let err = repo.get_by_id(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));

    let err = repo.get_by_name("nobody").await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));

    let err = repo.delete(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));
}

#[tokio::test]
async fn list_tenants_paginates() {
    let db = setup().await;
    let repo = SurrealTenantRepository::new(db);

    for i in 0..3 {
        repo.create(tenant(&format!("tenant-{i}"))).await.unwrap();
    }

    let page1 = repo.list(Pagination::new(1, 2)).await.unwrap();
    assert_eq!(page1.items.len(), 2);
    assert_eq!(page1.total, 3);
    assert_eq!(page1.page, 1);
    assert_eq!(page1.limit, 2);

    let page2 = repo.list(Pagination::new(2, 2)).await.unwrap();
    assert_eq!(page2.items.len(), 1);
    assert_eq!(page2.total, 3);
}

#[tokio::test]
async fn delete_tenant_cascades_to_owned_rows_only() {
    let db = setup().await;
    let tenants = SurrealTenantRepository::new(db.clone());
    let users = SurrealUserRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let groups = SurrealGroupRepository::new(db.clone());
    let permissions = SurrealPermissionRepository::new(db.clone());
    let audit = SurrealAuditLogRepository::new(db.clone());

    let doomed = tenants.create(tenant("doomed")).await.unwrap();
    let survivor = tenants.create(tenant("survivor")).await.unwrap();

    let perm = permissions
        .create(CreatePermission {
            name: "user.read".into(),
            description: String::new(),
        })
        .await
        .unwrap();

    let mut owners = Vec::new();
    for t in [&doomed, &survivor] {
        let user = users
            .create(CreateUser {
                tenant_id: t.id,
                email: format!("owner@{}.io", t.name),
                password_hash: "hash".into(),
            })
            .await
            .unwrap();
        let role = roles
            .create(CreateRole {
                tenant_id: t.id,
                name: "reader".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        let group = groups
            .create(CreateGroup {
                tenant_id: t.id,
                name: "staff".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        roles.assign_to_user(t.id, user.id, role.id).await.unwrap();
        roles.assign_to_group(t.id, group.id, role.id).await.unwrap();
        groups.add_member(t.id, user.id, group.id).await.unwrap();
        owners.push(user.id);
        permissions
            .grant_to_role(t.id, role.id, perm.id)
            .await
            .unwrap();
        audit
            .append(CreateAuditLogEntry {
                tenant_id: t.id,
                user_id: Some(user.id),
                action: "auth.login".into(),
                resource: None,
                resource_id: None,
                ip_address: None,
                user_agent: None,
                status: AuditStatus::Success,
            })
            .await
            .unwrap();
    }

    tenants.delete(doomed.id).await.unwrap();

    assert!(matches!(
        tenants.get_by_id(doomed.id).await.unwrap_err(),
        IamError::NotFound { .. }
    ));
    let gone = users
        .list(doomed.id, UserFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(gone.total, 0);

    // A former user is gone under every tenant; the survivor's owner stays.
    let former = owners[0];
    for tenant_id in [doomed.id, survivor.id] {
        let err = users.get_by_id(tenant_id, former).await.unwrap_err();
        assert!(matches!(err, IamError::NotFound { .. }));
    }
    let err = users.get_active_by_email("owner@doomed.io").await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));
    users.get_by_id(survivor.id, owners[1]).await.unwrap();

    let gone = audit
        .list(doomed.id, AuditLogFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(gone.total, 0);

    let mut edges = db
        .query(
            "SELECT count() AS total FROM has_role GROUP ALL; \
             SELECT count() AS total FROM member_of GROUP ALL; \
             SELECT count() AS total FROM grants GROUP ALL;",
        )
        .await
        .unwrap();
    // Only the survivor's junction rows remain.
    for (stmt, expected) in [(0usize, 2u64), (1, 1), (2, 1)] {
        let rows: Vec<EdgeCount> = edges.take(stmt).unwrap();
        assert_eq!(rows.first().map(|r| r.total), Some(expected));
    }

    // The survivor and the global catalog are untouched.
    let kept = users
        .list(survivor.id, UserFilter::default(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(kept.total, 1);
    let survivor_user = &kept.items[0];
    let survivor_roles = roles
        .get_user_roles(survivor.id, survivor_user.id)
        .await
        .unwrap();
    assert_eq!(survivor_roles.len(), 1);
    assert_eq!(
        roles
            .get_user_group_roles(survivor.id, survivor_user.id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        permissions
            .get_role_permissions(survivor.id, survivor_roles[0].id)
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(permissions.get_by_id(perm.id).await.is_ok());
}
