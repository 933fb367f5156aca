/// Priority task queue on Redis
///
/// - `task`: envelope, lanes and the welcome-email payload
/// - `broker`: key layout and the Lua scripts that move tasks between states
/// - `client`: [`JobClient`], the producer used by the API
///
/// The consumer side (worker pool, handlers) lives in the worker crate.

pub mod broker;
pub mod client;
pub mod task;

use thiserror::Error;

pub use broker::{Delivery, KeyKind, RedisBroker};
pub use client::JobClient;
pub use task::{lane_order, retry_backoff, Lane, TaskMessage, WelcomeEmailPayload, TASK_WELCOME_EMAIL};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue broker error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("task serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("job client is closed")]
    Closed,
}
