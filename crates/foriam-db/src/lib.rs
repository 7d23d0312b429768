//! ForIAM Database — SurrealDB connection management, identity store and
//! audit store implementations.
//!
//! This crate provides:
//! - Opening and migrating the store ([`Database`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Repository implementations of the `foriam-core` traits
//! - Bootstrap seeding of the `system` tenant ([`seed`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;
pub mod seed;

pub use connection::{Database, DbConfig};
pub use error::DbError;
pub use repository::{
    SurrealAuditLogRepository, SurrealGroupRepository, SurrealPermissionRepository,
    SurrealRoleRepository, SurrealTenantRepository, SurrealUserRepository,
};
pub use schema::{latest_version, run_migrations};
pub use seed::{BootstrapAdmin, SeedOutcome, seed};
