/// Services offered by a user, arranged as a forest
///
/// A service may point at a parent service (same owner), which turns a flat
/// catalog into trees: "Cleaning" → "Deep clean" → "Oven". Services without
/// a parent are root services; list queries return roots unless a parent
/// filter is given.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE service_status AS ENUM ('active', 'inactive');
/// CREATE TYPE service_method AS ENUM ('hourly');
///
/// CREATE TABLE services (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id TEXT NOT NULL,
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(255),
///     status service_status NOT NULL DEFAULT 'active',
///     rate INTEGER CHECK (rate IS NULL OR rate > 0),
///     method service_method NOT NULL DEFAULT 'hourly',
///     parent_service_id UUID REFERENCES services(id) ON DELETE CASCADE,
///     category_id UUID REFERENCES service_categories(id) ON DELETE SET NULL,
///     metadata JSONB,
///     sort_order INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};
use uuid::Uuid;
use validator::Validate;

use super::attachment::ServiceAttachment;
use super::category::Category;
use super::deserialize_some;
use super::pagination::{PageRequest, SortOrder};

/// Whether a service is currently offered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "service_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    #[default]
    Active,
    Inactive,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Inactive => "inactive",
        }
    }
}

/// How a service is billed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "service_method", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ServiceMethod {
    #[default]
    Hourly,
}

impl ServiceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMethod::Hourly => "hourly",
        }
    }
}

/// Service row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,

    /// Owning user
    pub user_id: String,

    pub name: String,

    pub description: Option<String>,

    pub status: ServiceStatus,

    /// Price per billing unit; positive when set
    pub rate: Option<i32>,

    pub method: ServiceMethod,

    /// Parent in the service tree (None for root services)
    pub parent_service_id: Option<Uuid>,

    pub category_id: Option<Uuid>,

    /// Free-form client data, stored as JSONB
    pub metadata: Option<JsonValue>,

    /// Position among siblings
    pub sort_order: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// A service together with its category, direct children and attachments
///
/// Built only by read queries; never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedService {
    #[serde(flatten)]
    pub service: Service,

    pub category: Option<Category>,

    /// Ordered by `sortOrder`, then creation time
    pub children: Vec<Service>,

    pub attachments: Vec<ServiceAttachment>,
}

impl<'r> FromRow<'r, PgRow> for PopulatedService {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let service = Service::from_row(row)?;
        let category: Option<Json<Category>> = row.try_get("category")?;
        let Json(children): Json<Vec<Service>> = row.try_get("children")?;
        let Json(attachments): Json<Vec<ServiceAttachment>> = row.try_get("attachments")?;

        Ok(Self {
            service,
            category: category.map(|Json(c)| c),
            children,
            attachments,
        })
    }
}

/// Input for creating a service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateService {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub status: ServiceStatus,

    #[validate(range(min = 1, message = "Rate must be positive"))]
    pub rate: Option<i32>,

    #[serde(default)]
    pub method: ServiceMethod,

    pub parent_service_id: Option<Uuid>,

    pub category_id: Option<Uuid>,

    pub metadata: Option<JsonValue>,

    #[serde(default)]
    pub sort_order: i32,
}

/// Partial update for a service
///
/// `None` leaves a column untouched. Nullable columns use
/// `Option<Option<T>>`, where `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateService {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[validate(length(min = 1, max = 255, message = "Description must be 1-255 characters"))]
    pub description: Option<Option<String>>,

    pub status: Option<ServiceStatus>,

    #[serde(default, deserialize_with = "deserialize_some")]
    #[validate(range(min = 1, message = "Rate must be positive"))]
    pub rate: Option<Option<i32>>,

    pub method: Option<ServiceMethod>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub parent_service_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub category_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    pub metadata: Option<Option<JsonValue>>,

    pub sort_order: Option<i32>,
}

/// Columns a service list can be ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    SortOrder,
}

impl ServiceSortField {
    pub fn column(&self) -> &'static str {
        match self {
            ServiceSortField::CreatedAt => "s.created_at",
            ServiceSortField::UpdatedAt => "s.updated_at",
            ServiceSortField::Name => "s.name",
            ServiceSortField::SortOrder => "s.sort_order",
        }
    }
}

/// Query string for listing services
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListServicesQuery {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "Limit must be 1-100"))]
    pub limit: Option<i64>,

    pub sort: Option<ServiceSortField>,

    pub order: Option<SortOrder>,

    /// Case-insensitive substring of name or description
    #[validate(length(min = 1, message = "Search must not be empty"))]
    pub search: Option<String>,

    pub status: Option<ServiceStatus>,

    /// Children of this service; root services when absent
    pub parent_service_id: Option<Uuid>,

    pub category_id: Option<Uuid>,
}

impl ListServicesQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}
