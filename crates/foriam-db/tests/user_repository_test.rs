//! Integration tests for the User repository using in-memory SurrealDB.

use foriam_core::Patch;
use foriam_core::error::IamError;
use foriam_core::models::tenant::CreateTenant;
use foriam_core::models::user::{CreateUser, UpdateUser, UserFilter};
use foriam_core::repository::{Pagination, TenantRepository, UserRepository};
use foriam_db::repository::{SurrealTenantRepository, SurrealUserRepository};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

/// Helper: spin up in-memory DB, run migrations, create two tenants.
async fn setup() -> (SurrealUserRepository<Db>, Uuid, Uuid) {
    let db: Surreal<Db> = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    foriam_db::run_migrations(&db).await.unwrap();

    let tenants = SurrealTenantRepository::new(db.clone());
    let acme = tenants
        .create(CreateTenant {
            name: "acme".into(),
        })
        .await
        .unwrap();
    let globex = tenants
        .create(CreateTenant {
            name: "globex".into(),
        })
        .await
        .unwrap();

    (SurrealUserRepository::new(db), acme.id, globex.id)
}

fn new_user(tenant_id: Uuid, email: &str) -> CreateUser {
    CreateUser {
        tenant_id,
        email: email.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
    }
}

#[tokio::test]
async fn create_and_get_user() {
    let (repo, acme, _) = setup().await;

    let user = repo.create(new_user(acme, "alice@acme.io")).await.unwrap();
    assert_eq!(user.tenant_id, acme);
    assert_eq!(user.email, "alice@acme.io");
    assert!(user.is_active, "users start active");
    assert!(user.password_hash.starts_with("$argon2id$"));

    let fetched = repo.get_by_id(acme, user.id).await.unwrap();
    assert_eq!(fetched.id, user.id);
    assert_eq!(fetched.email, "alice@acme.io");
}

#[tokio::test]
async fn duplicate_email_rejected_across_tenants() {
    let (repo, acme, globex) = setup().await;

    repo.create(new_user(acme, "dup@example.com")).await.unwrap();
    let err = repo
        .create(new_user(globex, "dup@example.com"))
        .await
        .unwrap_err();
    assert!(
        matches!(err, IamError::DuplicateEmail { ref email } if email == "dup@example.com"),
        "expected DuplicateEmail, got {err:?}"
    );
}

#[tokio::test]
async fn foreign_tenant_sees_not_found() {
    let (repo, acme, globex) = setup().await;
    let user = repo.create(new_user(acme, "bob@acme.io")).await.unwrap();

    let err = repo.get_by_id(globex, user.id).await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));

    let err = repo
        .update(
            globex,
            user.id,
            UpdateUser {
                is_active: Patch::Set(false),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));

    let err = repo.delete(globex, user.id).await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));

    // Nothing above touched the row.
    let still = repo.get_by_id(acme, user.id).await.unwrap();
    assert!(still.is_active);
}

#[tokio::test]
async fn patch_updates_only_set_fields() {
    let (repo, acme, _) = setup().await;
    let user = repo.create(new_user(acme, "carol@acme.io")).await.unwrap();

    let updated = repo
        .update(
            acme,
            user.id,
            UpdateUser {
                is_active: Patch::Set(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert_eq!(updated.email, "carol@acme.io");
    assert!(updated.updated_at >= user.updated_at);

    let renamed = repo
        .update(
            acme,
            user.id,
            UpdateUser {
                email: Patch::Set("carol@acme.dev".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.email, "carol@acme.dev");
    assert!(!renamed.is_active, "unset fields keep their value");
}

#[tokio::test]
async fn empty_patch_touches_only_timestamp() {
    let (repo, acme, _) = setup().await;
    let user = repo.create(new_user(acme, "dan@acme.io")).await.unwrap();

    let same = repo
        .update(acme, user.id, UpdateUser::default())
        .await
        .unwrap();
    assert_eq!(same.email, user.email);
    assert_eq!(same.is_active, user.is_active);
    assert!(same.updated_at >= user.updated_at);

    let err = repo
        .update(acme, Uuid::new_v4(), UpdateUser::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));
}

#[tokio::test]
async fn update_to_taken_email_is_duplicate() {
    let (repo, acme, globex) = setup().await;
    repo.create(new_user(globex, "taken@globex.io")).await.unwrap();
    let user = repo.create(new_user(acme, "erin@acme.io")).await.unwrap();

    let err = repo
        .update(
            acme,
            user.id,
            UpdateUser {
                email: Patch::Set("taken@globex.io".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, IamError::DuplicateEmail { .. }));
}

#[tokio::test]
async fn active_lookup_skips_inactive_accounts() {
    let (repo, acme, _) = setup().await;
    let user = repo.create(new_user(acme, "frank@acme.io")).await.unwrap();

    let found = repo.get_active_by_email("frank@acme.io").await.unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.tenant_id, acme);

    repo.update(
        acme,
        user.id,
        UpdateUser {
            is_active: Patch::Set(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let err = repo.get_active_by_email("frank@acme.io").await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));
}

#[tokio::test]
async fn delete_user_is_hard() {
    let (repo, acme, _) = setup().await;
    let user = repo.create(new_user(acme, "gina@acme.io")).await.unwrap();

    repo.delete(acme, user.id).await.unwrap();

    let err = repo.get_by_id(acme, user.id).await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));
    let err = repo.delete(acme, user.id).await.unwrap_err();
    assert!(matches!(err, IamError::NotFound { .. }));

    // The email is free again.
    repo.create(new_user(acme, "gina@acme.io")).await.unwrap();
}

#[tokio::test]
async fn list_users_with_filters_and_pagination() {
    let (repo, acme, globex) = setup().await;

    for i in 0..5 {
        repo.create(new_user(acme, &format!("user{i}@acme.io")))
            .await
            .unwrap();
    }
    repo.create(new_user(globex, "other@globex.io")).await.unwrap();

    let page1 = repo
        .list(acme, UserFilter::default(), Pagination::new(1, 3))
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(acme, UserFilter::default(), Pagination::new(2, 3))
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);
    assert!(page2.items.iter().all(|u| u.tenant_id == acme));

    let by_email = repo
        .list(
            acme,
            UserFilter {
                email: Some("user3@acme.io".into()),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(by_email.total, 1);
    assert_eq!(by_email.items[0].email, "user3@acme.io");

    let inactive = repo
        .list(
            acme,
            UserFilter {
                is_active: Some(false),
                ..Default::default()
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(inactive.total, 0);
    assert!(inactive.items.is_empty());
}
