/// Configuration management for the API server
///
/// Loaded once at startup from environment variables (a `.env` file is
/// honored in development).
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `REDIS_URL`: Redis connection string (required)
/// - `JWT_SECRET`: Secret key for JWT validation (required, 32+ chars)
/// - `WEBHOOK_SECRET`: Shared secret for inbound webhooks (required)
///
/// # Example
///
/// ```no_run
/// use fixr_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use fixr_shared::db::pool::DatabaseConfig;
use fixr_shared::redis::RedisConfig;
use std::env;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub redis: RedisConfig,

    pub jwt: JwtConfig,

    pub webhook: WebhookConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    /// Allowed CORS origins; `*` means permissive
    pub cors_origins: Vec<String>,
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HS256 secret shared with the identity provider
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Inbound webhook configuration
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Expected value of the `X-Webhook-Secret` header
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let redis = RedisConfig::from_env()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let webhook_secret = env::var("WEBHOOK_SECRET")
            .map_err(|_| anyhow::anyhow!("WEBHOOK_SECRET environment variable is required"))?;
        if webhook_secret.is_empty() {
            anyhow::bail!("WEBHOOK_SECRET must not be empty");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            redis,
            jwt: JwtConfig { secret: jwt_secret },
            webhook: WebhookConfig {
                secret: webhook_secret,
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
        },
        database: DatabaseConfig {
            url: "postgresql://localhost/fixr_test".to_string(),
            ..Default::default()
        },
        redis: RedisConfig::new("redis://localhost:6379"),
        jwt: JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
        },
        webhook: WebhookConfig {
            secret: "webhook-test-secret".to_string(),
        },
    }
}
