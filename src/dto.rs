use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ResourceKind;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewUserDto {
    pub email: String,
    pub pwd: String,
    pub pwd_confirm: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginUserRequest {
    pub email: String,
    pub pwd: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct FederatedLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Refresh,
    Access
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub kind: TokenType,
    pub exp: usize
}

impl Claims {
    pub fn new(user_id: Uuid, email: &str, kind: TokenType, exp: usize) -> Self {
        Self {
            user_id,
            email: email.to_string(),
            kind,
            exp
        }
    }
}

/// Assertion issued by the federated sign-in broker.
#[derive(Debug, Deserialize, Serialize)]
pub struct FederatedClaims {
    pub sub: String,
    pub email: String,
    pub iss: String,
    pub exp: usize,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub user_id: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub admin_club_ids: Vec<String>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub session: SessionInfo,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewClubDto {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
}

/// Full form snapshot; `image: None` keeps the existing picture.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClubDto {
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClubFilterQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewAdminDto {
    pub email: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewResourceDto {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewEventDto {
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    #[serde(default)]
    pub category: String,
    /// Absent for events on the global calendar.
    pub club_id: Option<String>,
}

/// Every editable field is rewritten; a missing `time` makes it all-day.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventDto {
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScopeQuery {
    pub club: Option<String>,
}

/// `month` is zero-based; both default to the current month. `offset`
/// moves the cursor afterwards.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub offset: Option<i64>,
    pub club: Option<String>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct InterestStateResponse {
    pub interested: bool,
}

#[derive(Debug, Serialize, Clone)]
pub struct ReminderLinkResponse {
    pub url: String,
}
