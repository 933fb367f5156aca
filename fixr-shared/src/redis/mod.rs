/// Redis connectivity
///
/// The job queue is the only Redis consumer; see [`crate::jobs`] for the key
/// layout it uses.

pub mod client;

pub use client::{RedisClient, RedisClientError, RedisConfig};
