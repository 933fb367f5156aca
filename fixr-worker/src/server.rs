/// Worker pool
///
/// Runs `concurrency` identical workers plus one recoverer on the tokio
/// runtime.
///
/// ```text
/// JobServer
///   ├─> worker × N:  lane_order → pop → handler → ack | retry | archive
///   │                (lease extended while the handler runs)
///   └─> recoverer:   expired leases → pending, due retries → pending
/// ```
///
/// # Shutdown
///
/// Cancelling the token stops polling. A worker in the middle of a task
/// finishes it and settles it (ack/retry/archive) before exiting; handlers
/// are never aborted. [`JobServer::shutdown`] returns once every worker and
/// the recoverer have exited.

use fixr_shared::jobs::{lane_order, retry_backoff, Delivery, Lane, RedisBroker, TaskMessage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::handlers::{HandlerError, HandlerRegistry};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Number of workers
    pub concurrency: usize,

    /// Sleep between polls when every lane is empty
    pub poll_interval: Duration,

    /// How long a task may stay unacknowledged before redelivery
    pub lease: Duration,

    /// Period of the recoverer
    pub recover_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            poll_interval: Duration::from_millis(1000),
            lease: Duration::from_secs(60),
            recover_interval: Duration::from_secs(5),
        }
    }
}

/// What happens to a task after its handler returned
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ack,
    Retry(Duration),
    Archive,
}

/// Decides the fate of `task` given its handler result
pub fn outcome(task: &TaskMessage, result: &Result<(), HandlerError>) -> Outcome {
    match result {
        Ok(()) => Outcome::Ack,
        Err(e) if e.is_retryable() && task.can_retry() => Outcome::Retry(retry_backoff(task.retried)),
        Err(_) => Outcome::Archive,
    }
}

pub struct JobServer {
    broker: RedisBroker,
    registry: Arc<HandlerRegistry>,
    config: ServerConfig,
    shutdown: CancellationToken,
    tasks: JoinSet<()>,
}

impl JobServer {
    pub fn new(broker: RedisBroker, registry: HandlerRegistry, config: ServerConfig) -> Self {
        Self {
            broker,
            registry: Arc::new(registry),
            config,
            shutdown: CancellationToken::new(),
            tasks: JoinSet::new(),
        }
    }

    /// Token that stops the pool when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Recovers leftovers from a previous run, then spawns the workers
    pub async fn start(&mut self) {
        let recovered = recover_all(&self.broker).await;
        tracing::info!(
            concurrency = self.config.concurrency,
            handlers = self.registry.len(),
            recovered,
            "Starting job server"
        );

        self.tasks.spawn(run_recoverer(
            self.broker.clone(),
            self.config.recover_interval,
            self.shutdown.clone(),
        ));

        for worker_id in 0..self.config.concurrency.max(1) {
            self.tasks.spawn(run_worker(
                worker_id,
                self.broker.clone(),
                self.registry.clone(),
                self.config.clone(),
                self.shutdown.clone(),
            ));
        }
    }

    /// Stops polling and waits for in-flight tasks to settle
    pub async fn shutdown(&mut self) {
        tracing::info!("Job server shutting down, waiting for active tasks");
        self.shutdown.cancel();

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Worker task panicked");
            }
        }

        tracing::info!("Job server stopped");
    }
}

async fn run_worker(
    worker_id: usize,
    broker: RedisBroker,
    registry: Arc<HandlerRegistry>,
    config: ServerConfig,
    shutdown: CancellationToken,
) {
    let mut rng = StdRng::from_entropy();
    tracing::debug!(worker_id, "Worker started");

    while !shutdown.is_cancelled() {
        let lanes = lane_order(&mut rng);

        match broker.pop(&lanes, config.lease).await {
            Ok(Some(delivery)) => {
                process(&broker, &registry, config.lease, delivery).await;
                continue;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(worker_id, error = %e, "Failed to poll queue"),
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(config.poll_interval) => {}
        }
    }

    tracing::debug!(worker_id, "Worker stopped");
}

async fn run_recoverer(broker: RedisBroker, interval: Duration, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => {
                recover_all(&broker).await;
            }
        }
    }
}

/// One recovery pass over every lane; returns the number of tasks moved
async fn recover_all(broker: &RedisBroker) -> usize {
    let mut moved = 0;

    for lane in Lane::ALL {
        match broker.recover_expired(lane).await {
            Ok(0) => {}
            Ok(n) => {
                tracing::warn!(queue = %lane, count = n, "Requeued tasks with expired lease");
                moved += n;
            }
            Err(e) => tracing::error!(queue = %lane, error = %e, "Lease recovery failed"),
        }

        match broker.forward_due_retries(lane).await {
            Ok(0) => {}
            Ok(n) => {
                tracing::debug!(queue = %lane, count = n, "Forwarded due retries");
                moved += n;
            }
            Err(e) => tracing::error!(queue = %lane, error = %e, "Retry forwarding failed"),
        }
    }

    moved
}

async fn process(broker: &RedisBroker, registry: &HandlerRegistry, lease: Duration, delivery: Delivery) {
    let task = match delivery.decode() {
        Ok(task) => task,
        Err(e) => {
            tracing::error!(queue = %delivery.lane, error = %e, "Undecodable task, archiving");
            settle(broker, &delivery, None, Outcome::Archive).await;
            return;
        }
    };

    let Some(handler) = registry.get(&task.task_type) else {
        tracing::error!(
            task_id = %task.id,
            task_type = %task.task_type,
            "No handler registered, archiving"
        );
        let dead = task.failed(format!("no handler for task type {}", task.task_type));
        settle(broker, &delivery, Some(&dead), Outcome::Archive).await;
        return;
    };

    tracing::debug!(task_id = %task.id, task_type = %task.task_type, queue = %delivery.lane, "Processing task");
    let result = with_lease(broker, &delivery, lease, handler.handle(&task)).await;
    let next = outcome(&task, &result);

    match result {
        Ok(()) => {
            tracing::info!(task_id = %task.id, task_type = %task.task_type, "Task completed");
            settle(broker, &delivery, None, next).await;
        }
        Err(e) => {
            tracing::warn!(
                task_id = %task.id,
                task_type = %task.task_type,
                retried = task.retried,
                outcome = ?next,
                error = %e,
                "Task failed"
            );
            let failed = task.failed(e.to_string());
            settle(broker, &delivery, Some(&failed), next).await;
        }
    }
}

/// Drives `work` while periodically pushing the task's lease forward
async fn with_lease<F>(broker: &RedisBroker, delivery: &Delivery, lease: Duration, work: F) -> F::Output
where
    F: Future,
{
    let period = (lease / 2).max(Duration::from_millis(100));
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    tokio::pin!(work);

    loop {
        tokio::select! {
            output = &mut work => return output,
            _ = ticker.tick() => {
                match broker.extend_lease(delivery, lease).await {
                    Ok(true) => {}
                    Ok(false) => tracing::warn!(queue = %delivery.lane, "Lease lost while task was running"),
                    Err(e) => tracing::warn!(queue = %delivery.lane, error = %e, "Failed to extend lease"),
                }
            }
        }
    }
}

/// Applies `next`; `record` is the updated envelope when the task decoded
async fn settle(broker: &RedisBroker, delivery: &Delivery, record: Option<&TaskMessage>, next: Outcome) {
    let result = match (next, record) {
        (Outcome::Ack, _) => broker.ack(delivery).await,
        (Outcome::Retry(delay), Some(updated)) => broker.retry(delivery, updated, delay).await,
        (Outcome::Retry(_), None) | (Outcome::Archive, None) => broker.archive(delivery, &delivery.raw).await,
        (Outcome::Archive, Some(updated)) => match serde_json::to_string(updated) {
            Ok(raw) => broker.archive(delivery, &raw).await,
            Err(_) => broker.archive(delivery, &delivery.raw).await,
        },
    };

    // the lease stays in place, so the recoverer will redeliver
    if let Err(e) = result {
        tracing::error!(queue = %delivery.lane, error = %e, "Failed to settle task");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixr_shared::jobs::{WelcomeEmailPayload, TASK_WELCOME_EMAIL};
    use serde_json::json;

    fn task() -> TaskMessage {
        WelcomeEmailPayload {
            to: "ada@example.com".to_string(),
            first_name: "Ada".to_string(),
        }
        .into_task()
        .unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.lease, Duration::from_secs(60));
    }

    #[test]
    fn test_success_acks() {
        assert_eq!(outcome(&task(), &Ok(())), Outcome::Ack);
    }

    #[test]
    fn test_retryable_failure_backs_off_by_attempt() {
        let first = task();
        let err = Err(HandlerError::Failed("timeout".into()));
        assert_eq!(outcome(&first, &err), Outcome::Retry(Duration::from_secs(10)));

        let third = first.failed("timeout").failed("timeout");
        assert_eq!(outcome(&third, &err), Outcome::Retry(Duration::from_secs(40)));
    }

    #[test]
    fn test_exhausted_retries_archive() {
        let task = task().with_max_retry(1).failed("timeout");
        let err = Err(HandlerError::Failed("timeout".into()));
        assert_eq!(outcome(&task, &err), Outcome::Archive);
    }

    #[test]
    fn test_permanent_failure_archives_immediately() {
        let task = TaskMessage::new(TASK_WELCOME_EMAIL, &json!({})).unwrap();
        let err = serde_json::from_value::<WelcomeEmailPayload>(json!({})).unwrap_err();
        assert_eq!(outcome(&task, &Err(HandlerError::from(err))), Outcome::Archive);
    }
}
