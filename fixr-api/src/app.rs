/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use fixr_api::{app::{build_router, AppState}, config::Config, services::Services};
/// use fixr_shared::db::pool::create_pool;
/// use fixr_shared::jobs::JobClient;
/// use fixr_shared::redis::RedisClient;
/// use fixr_shared::repository::Repositories;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let db = create_pool(config.database.clone()).await?;
/// let redis = RedisClient::connect(config.redis.clone()).await?;
/// let services = Services::new(Repositories::new(db.clone()), JobClient::new(redis.connection()));
/// let app = build_router(AppState::new(services, db, redis, config));
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use crate::error::ApiError;
use crate::services::Services;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use fixr_shared::auth::{jwt, AuthContext};
use fixr_shared::redis::RedisClient;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler via `State`; everything inside is a handle.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,

    /// Database pool, used directly only by `/health`
    pub db: PgPool,

    pub redis: RedisClient,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(services: Services, db: PgPool, redis: RedisClient, config: Config) -> Self {
        Self {
            services: Arc::new(services),
            db,
            redis,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                         # public
/// └── /v1/
///     ├── /categories                     # bearer JWT
///     │   ├── POST   /
///     │   ├── GET    /
///     │   ├── GET    /:id
///     │   ├── PATCH  /:id
///     │   └── DELETE /:id
///     ├── /services                       # bearer JWT
///     │   └── (same shape as categories)
///     └── POST /webhooks/user-created     # X-Webhook-Secret
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let category_routes = Router::new()
        .route(
            "/",
            post(routes::categories::create_category).get(routes::categories::list_categories),
        )
        .route(
            "/:id",
            get(routes::categories::get_category)
                .patch(routes::categories::update_category)
                .delete(routes::categories::delete_category),
        );

    let service_routes = Router::new()
        .route(
            "/",
            post(routes::services::create_service).get(routes::services::list_services),
        )
        .route(
            "/:id",
            get(routes::services::get_service)
                .patch(routes::services::update_service)
                .delete(routes::services::delete_service),
        );

    let authenticated = Router::new()
        .nest("/categories", category_routes)
        .nest("/services", service_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.config.clone(),
            jwt_auth_layer,
        ));

    let webhook_routes =
        Router::new().route("/user-created", post(routes::webhooks::user_created));

    let v1_routes = Router::new()
        .merge(authenticated)
        .nest("/webhooks", webhook_routes);

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_permissive() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware
///
/// Validates the bearer token and injects [`AuthContext`] into the request
/// extensions; the token subject becomes the owner id for every query.
async fn jwt_auth_layer(
    State(config): State<Arc<Config>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, &config.jwt.secret)?;

    req.extensions_mut().insert(AuthContext::from(claims));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::{body::Body, http::StatusCode, Extension};
    use fixr_shared::auth::jwt::{create_token, Claims};
    use tower::ServiceExt;

    async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
        auth.user_id
    }

    fn auth_router(config: Arc<Config>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(axum::middleware::from_fn_with_state(config, jwt_auth_layer))
    }

    fn request(authorization: Option<String>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let response = auth_router(Arc::new(test_config()))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_unauthorized() {
        let response = auth_router(Arc::new(test_config()))
            .oneshot(request(Some("Basic dXNlcjpwYXNz".to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_rejected() {
        let token = create_token(
            &Claims::new("user_1"),
            "a-completely-different-secret-of-32-chars",
        )
        .unwrap();

        let response = auth_router(Arc::new(test_config()))
            .oneshot(request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_sets_owner() {
        let config = Arc::new(test_config());
        let claims = Claims::with_expiration("user_2abc", chrono::Duration::minutes(5));
        let token = create_token(&claims, &config.jwt.secret).unwrap();

        let response = auth_router(config)
            .oneshot(request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"user_2abc");
    }

    #[test]
    fn test_cors_layer_builds_for_explicit_origins() {
        let mut config = test_config();
        config.api.cors_origins = vec!["https://app.fixr.dev".to_string()];
        let _layer = cors_layer(&config);
    }
}
