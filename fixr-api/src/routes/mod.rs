/// API route handlers
///
/// - `health`: liveness of the server, Postgres and Redis
/// - `categories`: category CRUD
/// - `services`: service-tree CRUD
/// - `webhooks`: identity-provider callbacks

pub mod categories;
pub mod health;
pub mod services;
pub mod webhooks;
