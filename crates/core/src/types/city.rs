//! Delivery city model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::CityId;

/// A city orders can be delivered to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    #[serde(rename = "_id")]
    pub id: CityId,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
