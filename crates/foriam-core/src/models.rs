//! Domain models for ForIAM.
//!
//! These are the core types shared across all crates.

pub mod audit;
pub mod group;
pub mod patch;
pub mod permission;
pub mod role;
pub mod tenant;
pub mod user;
