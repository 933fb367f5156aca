/// Service categories
///
/// A category groups a user's services (e.g. "Cleaning", "Repairs"). Every
/// category belongs to exactly one owner; reads and writes are always scoped
/// by `user_id` in addition to `id`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE service_categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id TEXT NOT NULL,
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(255),
///     color VARCHAR(32) NOT NULL DEFAULT '#6b7280',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::deserialize_some;
use super::pagination::{PageRequest, SortOrder};

/// Category row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,

    /// Owning user
    pub user_id: String,

    pub name: String,

    pub description: Option<String>,

    /// Display color, e.g. "#22c55e"
    pub color: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: Option<String>,

    #[serde(default = "default_color")]
    #[validate(length(min = 1, max = 32, message = "Color must be 1-32 characters"))]
    pub color: String,
}

fn default_color() -> String {
    "#6b7280".to_string()
}

/// Partial update for a category
///
/// `None` leaves a column untouched. `description` is nullable, so
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: Option<Option<String>>,

    #[validate(length(min = 1, max = 32, message = "Color must be 1-32 characters"))]
    pub color: Option<String>,
}

/// Columns a category list can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategorySortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
}

impl CategorySortField {
    pub fn column(&self) -> &'static str {
        match self {
            CategorySortField::CreatedAt => "c.created_at",
            CategorySortField::UpdatedAt => "c.updated_at",
            CategorySortField::Name => "c.name",
        }
    }
}

/// Query string for listing categories
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Limit must be 1-100"))]
    pub limit: Option<i64>,

    pub sort: Option<CategorySortField>,

    pub order: Option<SortOrder>,

    #[validate(length(min = 1, message = "Search must not be empty"))]
    pub search: Option<String>,
}

impl ListCategoriesQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_category_default_color() {
        let payload: CreateCategory = serde_json::from_str(r#"{"name":"Cleaning"}"#).unwrap();
        assert_eq!(payload.color, "#6b7280");
        assert!(payload.description.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_create_category_rejects_empty_name() {
        let payload: CreateCategory = serde_json::from_str(r#"{"name":""}"#).unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_update_category_distinguishes_null_from_absent() {
        let absent: UpdateCategory = serde_json::from_str(r#"{"name":"Repairs"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateCategory = serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateCategory = serde_json::from_str(r#"{"description":"Indoor"}"#).unwrap();
        assert_eq!(set.description, Some(Some("Indoor".to_string())));
    }

    #[test]
    fn test_sort_field_columns() {
        assert_eq!(CategorySortField::default().column(), "c.created_at");
        let field: CategorySortField = serde_json::from_str(r#""updated_at""#).unwrap();
        assert_eq!(field.column(), "c.updated_at");
    }

    #[test]
    fn test_category_serializes_camel_case() {
        let category = Category {
            id: Uuid::nil(),
            user_id: "user_1".to_string(),
            name: "Cleaning".to_string(),
            description: None,
            color: "#fff".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["userId"], "user_1");
        assert!(json.get("createdAt").is_some());
    }
}
