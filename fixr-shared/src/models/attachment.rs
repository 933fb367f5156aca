/// Files attached to a service
///
/// Attachment rows are read as part of a [`PopulatedService`](super::service::PopulatedService);
/// the blob itself lives in object storage under `download_key`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAttachment {
    pub id: Uuid,

    /// Original file name
    pub name: String,

    pub service_id: Uuid,

    /// User who uploaded the file
    pub uploaded_by: String,

    /// Object storage key
    pub download_key: String,

    /// Size in bytes
    pub file_size: Option<i64>,

    pub mime_type: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}
