//! ForIAM Core — domain models, repository contracts, and the error
//! taxonomy shared by every other crate.

pub mod error;
pub mod models;
pub mod repository;

pub use error::{IamError, IamResult};
pub use models::patch::Patch;
pub use repository::{PaginatedResult, Pagination};
