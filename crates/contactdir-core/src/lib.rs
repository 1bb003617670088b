//! Ordered directory of contact microservices.
//!
//! - `directory`: forward-linked, insertion-ordered directory with neighbor lookup
//! - `shared`: lock-guarded handle for use behind a request router
//! - `seed`: start-up population from static configuration
//! - `config`: layered settings

pub mod config;
pub mod directory;
pub mod entry;
pub mod error;
pub mod seed;
pub mod shared;

pub use config::*;
pub use directory::*;
pub use entry::*;
pub use error::*;
pub use seed::*;
pub use shared::*;
