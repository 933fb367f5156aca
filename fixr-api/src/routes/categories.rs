/// Category endpoints
///
/// All endpoints require JWT authentication; the token subject is the owner.
///
/// # Endpoints
///
/// - `POST /v1/categories` - Create category
/// - `GET /v1/categories` - List categories (`page`, `limit`, `sort`, `order`, `search`)
/// - `GET /v1/categories/:id` - Get category
/// - `PATCH /v1/categories/:id` - Update category
/// - `DELETE /v1/categories/:id` - Delete category

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
    models::category::{Category, CreateCategory, ListCategoriesQuery, UpdateCategory},
    models::pagination::Paginated,
};
use uuid::Uuid;

/// Create category
///
/// ```text
/// POST /v1/categories
/// Authorization: Bearer <jwt_token>
///
/// { "name": "Cleaning", "color": "#22c55e" }
/// ```
///
/// Returns `201 Created` with the stored row, `409` if the owner already has
/// a category with that name.
pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    validate(&req)?;

    let category = state.services.category.create(&auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListCategoriesQuery>,
) -> ApiResult<Json<Paginated<Category>>> {
    validate(&query)?;

    let page = state.services.category.list(&auth.user_id, &query).await?;
    Ok(Json(page))
}

pub async fn get_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    let category = state.services.category.get(&auth.user_id, id).await?;
    Ok(Json(category))
}

/// Update category
///
/// Only the fields present in the body are written; `"description": null`
/// clears the description. An empty body is a `400`.
pub async fn update_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCategory>,
) -> ApiResult<Json<Category>> {
    validate(&req)?;

    let category = state.services.category.update(&auth.user_id, id, req).await?;
    Ok(Json(category))
}

/// Delete category
///
/// Services in the category are kept and lose their category.
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.services.category.delete(&auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
