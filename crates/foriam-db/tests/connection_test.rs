//! Integration tests for opening the identity store.

use foriam_core::models::tenant::CreateTenant;
use foriam_core::repository::TenantRepository;
use foriam_db::repository::SurrealTenantRepository;
use foriam_db::{Database, DbConfig};

fn in_memory() -> DbConfig {
    DbConfig {
        url: "mem://".into(),
        ..DbConfig::default()
    }
}

#[tokio::test]
async fn open_in_memory_is_migrated() {
    let config = in_memory();
    assert!(config.is_in_memory());

    let store = Database::open(&config).await.unwrap();

    // Schema is in place: unique tenant names are enforced.
    let tenants = SurrealTenantRepository::new(store.handle().clone());
    tenants
        .create(CreateTenant {
            name: "acme".into(),
        })
        .await
        .unwrap();
    assert!(
        tenants
            .create(CreateTenant {
                name: "acme".into(),
            })
            .await
            .is_err()
    );
}

#[test]
fn defaults_point_at_a_server() {
    let config = DbConfig::default();
    assert_eq!(config.url, "ws://127.0.0.1:8000");
    assert_eq!(config.namespace, "foriam");
    assert!(!config.is_in_memory());
}
