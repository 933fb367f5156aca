/// Producer side of the task queue
///
/// # Example
///
/// ```no_run
/// use fixr_shared::jobs::{JobClient, Lane, WelcomeEmailPayload};
/// use fixr_shared::redis::{RedisClient, RedisConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let redis = RedisClient::connect(RedisConfig::from_env()?).await?;
/// let jobs = JobClient::new(redis.connection());
///
/// let task = WelcomeEmailPayload {
///     to: "ada@example.com".to_string(),
///     first_name: "Ada".to_string(),
/// }
/// .into_task()?;
///
/// let id = jobs.enqueue(task, Lane::Default).await?;
/// println!("enqueued {}", id);
///
/// jobs.close();
/// # Ok(())
/// # }
/// ```

use redis::aio::ConnectionManager;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use super::broker::RedisBroker;
use super::task::{Lane, TaskMessage};
use super::QueueError;

/// Enqueues tasks; cheap to clone, all clones share the closed flag
#[derive(Clone)]
pub struct JobClient {
    broker: RedisBroker,
    closed: Arc<AtomicBool>,
}

impl JobClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self::from_broker(RedisBroker::new(conn))
    }

    pub fn from_broker(broker: RedisBroker) -> Self {
        Self {
            broker,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Puts `task` on `lane` and returns its id once Redis has accepted it
    ///
    /// # Errors
    ///
    /// `Closed` after [`close`](Self::close); `Redis` when the write fails.
    pub async fn enqueue(&self, mut task: TaskMessage, lane: Lane) -> Result<Uuid, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        task.queue = lane;
        self.broker.push(&task).await?;

        tracing::info!(
            task_id = %task.id,
            task_type = %task.task_type,
            queue = %lane,
            "Task enqueued"
        );
        Ok(task.id)
    }

    /// Stops accepting tasks; idempotent
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!("Job client closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn broker(&self) -> &RedisBroker {
        &self.broker
    }
}
