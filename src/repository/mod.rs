use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    content::{ContentDraft, ContentItem, ContentKind},
    error::StoreError,
    models::{AdminAccount, CreateFeedbackRequest, Favorite, Feedback, HistoryEntry, ItemRef, UserAccount},
    roles::Role,
};

mod memory;
mod sqlite;

pub use memory::MemoryRepository;
pub use sqlite::{MIGRATOR, SqliteRepository};

/// Username of the administrator guaranteed to exist after startup.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_NICKNAME: &str = "超级管理员";

/// Nickname clients send when the user has not chosen one.
const PLACEHOLDER_NICKNAME: &str = "微信用户";
/// Host of the stock avatars clients fall back to.
const PLACEHOLDER_AVATAR_HOST: &str = "unsplash.com";

/// ContentFilter
///
/// Listing filter. `keyword` is matched case-insensitively against the kind's two
/// search columns; `category` of `全部` or empty means no category filter.
/// `urgency` only narrows help requests. `limit` caps the newest-first result.
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<String>,
    pub limit: Option<i64>,
}

impl ContentFilter {
    const MAX_KEYWORD_CHARS: usize = 100;
    const MAX_CATEGORY_CHARS: usize = 50;

    /// Lowercased, trimmed keyword, capped in length. `None` when blank.
    pub fn normalized_keyword(&self) -> Option<String> {
        normalize(self.keyword.as_deref(), Self::MAX_KEYWORD_CHARS).map(|k| k.to_lowercase())
    }

    pub fn normalized_category(&self) -> Option<String> {
        normalize(self.category.as_deref(), Self::MAX_CATEGORY_CHARS).filter(|c| c != "全部")
    }

    pub fn normalized_urgency(&self) -> Option<String> {
        normalize(self.urgency.as_deref(), Self::MAX_CATEGORY_CHARS).filter(|u| u != "全部")
    }

    /// Keyword as a LIKE pattern, with `%`, `_` and `\` matched literally.
    pub fn keyword_pattern(&self) -> Option<String> {
        let keyword = self.normalized_keyword()?;
        let mut pattern = String::with_capacity(keyword.len() + 2);
        pattern.push('%');
        for c in keyword.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

fn normalize(value: Option<&str>, max_chars: usize) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

/// Row offset of a 1-based page. Saturates instead of overflowing on huge pages.
pub(crate) fn page_offset(page: i64, page_size: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(page_size.max(0))
}

/// A nickname worth storing over the current one.
pub(crate) fn meaningful_nickname(nickname: Option<&str>) -> Option<&str> {
    nickname.filter(|n| !n.is_empty() && *n != PLACEHOLDER_NICKNAME)
}

/// An avatar worth storing over the current one.
pub(crate) fn meaningful_avatar(avatar: Option<&str>) -> Option<&str> {
    avatar.filter(|a| !a.is_empty() && !a.contains(PLACEHOLDER_AVATAR_HOST))
}

/// Repository Trait
///
/// The store contract consumed by the authorization layer and the handlers.
/// Every method reports failures as `StoreError`; implementations must surface
/// single-writer contention as `StoreError::Busy` so writes can be retried.
///
/// Passed around as `RepositoryState` so a fake can stand in for the embedded store.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Administrator accounts ---
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError>;
    async fn touch_admin_login(&self, username: &str) -> Result<(), StoreError>;
    /// Startup invariant: exactly one administrator, `admin`, with role super_admin.
    /// Other administrator rows are removed. An existing `admin` keeps its password.
    async fn provision_default_admin(&self, password_hash: &str) -> Result<(), StoreError>;

    // --- User accounts ---
    async fn get_user_by_identity(&self, identity: &str) -> Result<Option<UserAccount>, StoreError>;
    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserAccount>, StoreError>;
    /// Creates the account with role `user` on first sight, otherwise refreshes
    /// `last_login_at` and any meaningful nickname/avatar.
    async fn get_or_create_user(
        &self,
        identity: &str,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserAccount, StoreError>;
    async fn update_user_nickname(&self, identity: &str, nickname: &str) -> Result<bool, StoreError>;
    async fn update_user_avatar(&self, identity: &str, avatar: &str) -> Result<bool, StoreError>;
    /// One page of users, newest first, plus the total matching `role`.
    async fn list_users(
        &self,
        page: i64,
        page_size: i64,
        role: Option<&str>,
    ) -> Result<(Vec<UserAccount>, i64), StoreError>;
    async fn set_user_role(&self, user_id: i64, role: Role) -> Result<bool, StoreError>;
    async fn set_user_role_by_identity(&self, identity: &str, role: Role) -> Result<bool, StoreError>;

    // --- Content ---
    async fn get_content(&self, kind: ContentKind, id: i64) -> Result<Option<ContentItem>, StoreError>;
    async fn list_content(&self, kind: ContentKind, filter: &ContentFilter) -> Result<Vec<ContentItem>, StoreError>;
    async fn list_content_by_publisher(
        &self,
        kind: ContentKind,
        publisher: &str,
    ) -> Result<Vec<ContentItem>, StoreError>;
    /// Inserts the draft with `publisher` as its immutable publisher identity.
    async fn create_content(&self, publisher: &str, draft: &ContentDraft) -> Result<i64, StoreError>;
    /// Overwrites the editable fields of `(draft.kind(), id)`. Publisher, counters,
    /// status and timestamps are left as stored. `false` when the row is gone.
    async fn update_content(&self, id: i64, draft: &ContentDraft) -> Result<bool, StoreError>;
    async fn delete_content(&self, kind: ContentKind, id: i64) -> Result<bool, StoreError>;
    async fn increment_views(&self, kind: ContentKind, id: i64) -> Result<(), StoreError>;

    // --- Favorites & history ---
    async fn upsert_favorite(&self, identity: &str, item: &ItemRef) -> Result<(), StoreError>;
    async fn remove_favorite(&self, identity: &str, item_kind: &str, item_id: i64) -> Result<bool, StoreError>;
    async fn list_favorites(&self, identity: &str) -> Result<Vec<Favorite>, StoreError>;
    async fn upsert_history(&self, identity: &str, item: &ItemRef) -> Result<(), StoreError>;
    async fn list_history(&self, identity: &str, limit: i64) -> Result<Vec<HistoryEntry>, StoreError>;
    async fn clear_history(&self, identity: &str) -> Result<u64, StoreError>;

    // --- Feedback & settings ---
    async fn create_feedback(
        &self,
        identity: &str,
        nickname: &str,
        req: &CreateFeedbackRequest,
    ) -> Result<i64, StoreError>;
    async fn list_feedback(&self) -> Result<Vec<Feedback>, StoreError>;
    async fn mark_feedback_read(&self, id: i64) -> Result<bool, StoreError>;
    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// RepositoryState
///
/// The shared handle to the store used across the application state.
pub type RepositoryState = Arc<dyn Repository>;
