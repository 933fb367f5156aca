/// Database layer
///
/// - `pool`: connection pool creation, health check, shutdown
/// - `migrations`: embedded schema migrations
/// - `query`: parametrized clause builder used by the repositories

pub mod migrations;
pub mod pool;
pub mod query;
