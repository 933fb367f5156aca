/// Inbound webhooks from the identity provider
///
/// Authenticated by a shared secret in the `X-Webhook-Secret` header rather
/// than a user token.
///
/// # Endpoints
///
/// - `POST /v1/webhooks/user-created` - Queue the welcome email for a new account

use crate::{
    app::AppState,
    error::{validate, ApiError, ApiResult},
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// `user.created` event body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedEvent {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreatedResponse {
    pub task_id: Uuid,
}

/// Queue the welcome email
///
/// ```text
/// POST /v1/webhooks/user-created
/// X-Webhook-Secret: <secret>
///
/// { "email": "ada@example.com", "firstName": "Ada" }
/// ```
///
/// Returns `202 Accepted` once the task is in Redis. A wrong or missing
/// secret is a `401`; the queue being unreachable is a `500`.
pub async fn user_created(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(event): Json<UserCreatedEvent>,
) -> ApiResult<(StatusCode, Json<UserCreatedResponse>)> {
    verify_secret(&headers, &state.config.webhook.secret)?;
    validate(&event)?;

    let task_id = state
        .services
        .auth
        .send_welcome_email(&event.email, &event.first_name)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(UserCreatedResponse { task_id })))
}

fn verify_secret(headers: &HeaderMap, expected: &str) -> ApiResult<()> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing webhook secret".to_string()))?;

    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        tracing::warn!("Rejected webhook with wrong secret");
        return Err(ApiError::Unauthorized("Invalid webhook secret".to_string()));
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
