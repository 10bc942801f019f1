use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Club id stored on events that belong to no club.
pub const GLOBAL_SCOPE: &str = "global";
pub const GLOBAL_SCOPE_NAME: &str = "Global";

/// Document ids are assigned by the store and never serialized into the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip)]
    pub id: Uuid,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwd_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(skip_deserializing, default)]
    pub id: String,
    pub title: String,
    /// `YYYY-MM-DD`, compared as a plain string.
    pub date: String,
    /// `HH:MM`, absent or empty for all-day events.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub category: String,
    pub club_id: String,
    #[serde(default)]
    pub club_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    #[serde(skip_deserializing, default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    /// Embedded `data:image/...` thumbnail.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Denormalized copy of an event taken when the user marked it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestMark {
    #[serde(skip_deserializing, default)]
    pub id: String,
    pub event_id: String,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Global admin allow-list entry, keyed by e-mail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRecord {
    pub role: String,
    pub added_by: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Link,
    Pdf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(skip_deserializing, default)]
    pub id: String,
    pub club_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
    pub created_at: DateTime<Utc>,
}
