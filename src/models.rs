use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::content::ContentItem;

// --- Accounts ---

/// AdminAccount
///
/// A row of the `admins` table. Provisioned at startup; never created at runtime.
/// The password hash is an Argon2id PHC string and is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AdminAccount {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    #[ts(skip)]
    pub password_hash: String,
    pub nickname: String,
    // super_admin or admin.
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// UserAccount
///
/// A row of the `users` table, keyed by the externally issued identity.
/// Created lazily on the first successful login and updated in place afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserAccount {
    pub id: i64,
    pub identity: String,
    pub nickname: String,
    pub avatar: String,
    // One of super_admin, admin, vip, user, banned.
    pub role: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub last_login_at: DateTime<Utc>,
}

// --- Personal lists ---

/// Favorite
///
/// One saved item, unique per (identity, item_kind, item_id).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Favorite {
    pub item_kind: String,
    pub item_id: i64,
    pub title: String,
    pub image: String,
    #[ts(type = "string")]
    pub saved_at: DateTime<Utc>,
}

/// HistoryEntry
///
/// One viewed item. Viewing the same item again moves it to the front.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct HistoryEntry {
    pub item_kind: String,
    pub item_id: i64,
    pub title: String,
    pub image: String,
    #[ts(type = "string")]
    pub viewed_at: DateTime<Utc>,
}

/// ItemRef
///
/// Payload shared by favorite and history writes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ItemRef {
    pub item_kind: String,
    pub item_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
}

/// ItemKey
///
/// Identifies an entry to remove from a personal list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct ItemKey {
    pub item_kind: String,
    pub item_id: i64,
}

// --- Feedback & site settings ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Feedback {
    pub id: i64,
    #[serde(rename = "type")]
    pub feedback_type: String,
    pub content: String,
    pub contact: String,
    pub identity: String,
    pub nickname: String,
    // unread or read.
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct CreateFeedbackRequest {
    #[serde(rename = "type")]
    pub feedback_type: String,
    pub content: String,
    #[serde(default)]
    pub contact: String,
}

/// Banner
///
/// One carousel slide. The full list is stored as JSON under the `banners` setting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Banner {
    pub url: String,
    pub title: String,
}

// --- Auth payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

/// AdminLoginResponse
///
/// `identity` is the string to assert in the identity header from now on.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminLoginResponse {
    pub identity: String,
    pub admin: AdminAccount,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserLoginRequest {
    pub identity: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Profile
///
/// The caller's own account, whichever identity space it lives in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Profile {
    Admin(AdminAccount),
    User(UserAccount),
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateNicknameRequest {
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAvatarRequest {
    pub avatar: String,
}

// --- Role management payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub user_id: i64,
    pub new_role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GrantRoleRequest {
    pub user_identity: String,
    pub new_role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoleChanged {
    pub identity: String,
    pub nickname: String,
    pub new_role: String,
}

/// UserPage
///
/// Output of the admin user listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UserPage {
    pub list: Vec<UserAccount>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

// --- Permission check payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct PermissionCheckRequest {
    pub identity: String,
    pub content_kind: String,
    pub content_id: i64,
}

/// PermissionCheckResponse
///
/// `publisher_identity` is echoed back for auditing.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PermissionCheckResponse {
    pub can_delete: bool,
    pub publisher_identity: String,
    pub identity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Created {
    pub id: i64,
}

/// PublishedGroup
///
/// Items one identity has published under a single content kind.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublishedGroup {
    pub kind: String,
    pub items: Vec<ContentItem>,
}
