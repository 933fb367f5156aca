/// Domain models
///
/// Plain value types with serde (camelCase JSON) and sqlx row mapping. They
/// carry no behavior beyond DTO validation; SQL lives in `repository`.
///
/// - `category`: service categories and their DTOs
/// - `service`: services, the populated read projection and DTOs
/// - `attachment`: files attached to a service
/// - `pagination`: page requests, sort order and the page wrapper

pub mod attachment;
pub mod category;
pub mod pagination;
pub mod service;

use serde::{Deserialize, Deserializer};

/// Marks a present field as `Some`, even when its value is `null`
///
/// Used with `#[serde(default)]` on `Option<Option<T>>` fields so a patch
/// can tell "absent" (`None`) from "set to null" (`Some(None)`).
pub(crate) fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
