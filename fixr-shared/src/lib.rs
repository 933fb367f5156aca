//! # Fixr Shared Library
//!
//! Types and data access shared by the Fixr API server and worker.
//!
//! ## Module Organization
//!
//! - `db`: pool, migrations and the parametrized query builder
//! - `repository`: owner-scoped Postgres repositories
//! - `models`: categories, services, attachments, pagination
//! - `jobs`: Redis task queue (envelope, broker, producer client)
//! - `redis`: managed Redis connection
//! - `auth`: bearer token validation and the request identity
//! - `error`: repository error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod redis;
pub mod repository;

/// Current version of the Fixr shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
