/// Worker configuration from environment variables
///
/// # Environment Variables
///
/// - `REDIS_URL`: Redis connection string (required)
/// - `WORKER_CONCURRENCY`: number of workers (default: 10)
/// - `WORKER_POLL_INTERVAL_MS`: idle poll interval (default: 1000)
/// - `WORKER_LEASE_SECS`: unacknowledged task lease (default: 60)
/// - `EMAIL_API_URL`: email provider base URL (default: https://api.resend.com)
/// - `EMAIL_API_KEY`: provider key; unset means log-only delivery
/// - `EMAIL_FROM`: sender address

use fixr_shared::redis::RedisConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::email::EmailConfig;
use crate::server::ServerConfig;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub redis: RedisConfig,
    pub server: ServerConfig,
    pub email: EmailConfig,
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let redis = RedisConfig::from_env()?;
        let defaults = ServerConfig::default();

        let concurrency: usize = parse_var("WORKER_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            anyhow::bail!("WORKER_CONCURRENCY must be at least 1");
        }

        let poll_ms: u64 = parse_var("WORKER_POLL_INTERVAL_MS", 1000)?;
        let lease_secs: u64 = parse_var("WORKER_LEASE_SECS", 60)?;
        if lease_secs == 0 {
            anyhow::bail!("WORKER_LEASE_SECS must be at least 1");
        }

        Ok(Self {
            redis,
            server: ServerConfig {
                concurrency,
                poll_interval: Duration::from_millis(poll_ms),
                lease: Duration::from_secs(lease_secs),
                ..defaults
            },
            email: EmailConfig::from_env(),
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {}={:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default_when_unset() {
        let value: u64 = parse_var("FIXR_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("FIXR_TEST_BAD_CONCURRENCY", "ten");
        let result: anyhow::Result<usize> = parse_var("FIXR_TEST_BAD_CONCURRENCY", 10);
        assert!(result.unwrap_err().to_string().contains("FIXR_TEST_BAD_CONCURRENCY"));
    }
}
