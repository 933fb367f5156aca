/// Worker lifecycle
///
/// [`JobService`] owns the pool and a producer client on the same Redis
/// connection. `start` registers the handlers and starts polling; `stop`
/// drains the pool and closes the client.
///
/// # Example
///
/// ```no_run
/// use fixr_worker::config::WorkerConfig;
/// use fixr_worker::service::JobService;
/// use fixr_shared::redis::RedisClient;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = WorkerConfig::from_env()?;
/// let redis = RedisClient::connect(config.redis.clone()).await?;
///
/// let service = JobService::start(&redis, &config).await?;
/// tokio::signal::ctrl_c().await?;
/// service.stop().await;
/// # Ok(())
/// # }
/// ```

use fixr_shared::jobs::{JobClient, RedisBroker};
use fixr_shared::redis::RedisClient;
use std::sync::Arc;

use crate::config::WorkerConfig;
use crate::email::{EmailClient, EmailError};
use crate::handlers::{HandlerRegistry, WelcomeEmailHandler};
use crate::server::JobServer;

pub struct JobService {
    server: JobServer,
    client: JobClient,
}

impl JobService {
    /// Builds the handler registry for `config` and starts the pool
    pub async fn start(redis: &RedisClient, config: &WorkerConfig) -> Result<Self, EmailError> {
        let registry = default_registry(EmailClient::new(config.email.clone())?);
        Ok(Self::start_with(redis, registry, config).await)
    }

    /// Starts the pool with a caller-supplied registry
    pub async fn start_with(redis: &RedisClient, registry: HandlerRegistry, config: &WorkerConfig) -> Self {
        let broker = RedisBroker::new(redis.connection());
        let client = JobClient::from_broker(broker.clone());

        let mut server = JobServer::new(broker, registry, config.server.clone());
        server.start().await;

        Self { server, client }
    }

    /// Producer sharing the pool's connection
    pub fn client(&self) -> &JobClient {
        &self.client
    }

    /// Stops polling, waits for in-flight handlers, then closes the client
    pub async fn stop(mut self) {
        self.server.shutdown().await;
        self.client.close();
    }
}

/// Registry with every handler this worker serves
pub fn default_registry(email: EmailClient) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry.register(Arc::new(WelcomeEmailHandler::new(email)));
    registry
}
