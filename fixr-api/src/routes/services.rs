/// Service endpoints
///
/// Services form a per-owner forest: a service may have a parent service and
/// any number of children. Reads return the populated view (category,
/// direct children, attachments).
///
/// # Endpoints
///
/// - `POST /v1/services` - Create service
/// - `GET /v1/services` - List services; root services unless `parentServiceId` is given
/// - `GET /v1/services/:id` - Get populated service
/// - `PATCH /v1/services/:id` - Update service (re-parenting is cycle-checked)
/// - `DELETE /v1/services/:id` - Delete service and its subtree

use crate::{
    app::AppState,
    error::{validate, ApiResult},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use fixr_shared::{
    auth::AuthContext,
    models::pagination::Paginated,
    models::service::{CreateService, ListServicesQuery, PopulatedService, Service, UpdateService},
};
use uuid::Uuid;

/// Create service
///
/// ```text
/// POST /v1/services
/// Authorization: Bearer <jwt_token>
///
/// {
///   "name": "Deep clean",
///   "rate": 4500,
///   "method": "hourly",
///   "parentServiceId": "7d1c...",
///   "categoryId": "0b9e..."
/// }
/// ```
///
/// A parent or category that the caller does not own is a `400`.
pub async fn create_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateService>,
) -> ApiResult<(StatusCode, Json<Service>)> {
    validate(&req)?;

    let service = state.services.service.create(&auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list_services(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListServicesQuery>,
) -> ApiResult<Json<Paginated<PopulatedService>>> {
    validate(&query)?;

    let page = state.services.service.list(&auth.user_id, &query).await?;
    Ok(Json(page))
}

pub async fn get_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PopulatedService>> {
    let service = state.services.service.get(&auth.user_id, id).await?;
    Ok(Json(service))
}

pub async fn update_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateService>,
) -> ApiResult<Json<Service>> {
    validate(&req)?;

    let service = state.services.service.update(&auth.user_id, id, req).await?;
    Ok(Json(service))
}

pub async fn delete_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.service.delete(&auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
