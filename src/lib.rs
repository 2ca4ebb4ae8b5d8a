// lib.rs - Root module for the large_in_repro library
//
// The library holds everything the integration tests share: configuration,
// the store client, fixtures and the suite runner. The tests themselves live
// under tests/, one file per entity family.

/// Environment-driven configuration (database URL, batch size, defect flag)
pub mod config;

/// Typed errors for configuration and store access
pub mod error;

/// Thin store client over SQLite: batched writes, chunked IN reads, raw SQL
pub mod store;

/// The fixtures module contains reusable seed data and the cleaner
pub mod fixtures;

/// Suite registry, conditional suite gate and runner
pub mod harness;

pub use config::{Expectation, StoreConfig};
pub use error::{ConfigError, StoreError};
pub use store::Store;
