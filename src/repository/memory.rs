use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{
    ContentFilter, DEFAULT_ADMIN_NICKNAME, DEFAULT_ADMIN_USERNAME, Repository, meaningful_avatar,
    meaningful_nickname, page_offset,
};
use crate::{
    content::{ContentDraft, ContentItem, ContentKind},
    error::StoreError,
    models::{AdminAccount, CreateFeedbackRequest, Favorite, Feedback, HistoryEntry, ItemRef, UserAccount},
    roles::Role,
};

#[derive(Default)]
struct State {
    next_id: i64,
    admins: Vec<AdminAccount>,
    users: Vec<UserAccount>,
    content: Vec<ContentItem>,
    favorites: Vec<(String, Favorite)>,
    history: Vec<(String, HistoryEntry)>,
    feedback: Vec<Feedback>,
    settings: HashMap<String, String>,
    fail_reads: bool,
    busy_writes: u32,
    write_attempts: u32,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// MemoryRepository
///
/// A process-local `Repository` for tests and demos. Behaves like the embedded
/// store, plus two failure switches: reads can be made to fail outright, and the
/// next N writes can be made to report contention.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(StoreError::Corrupt("reads disabled".into()));
        }
        Ok(state)
    }

    /// Every mutation goes through here so contention can be injected.
    fn write(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        let mut state = self.lock();
        state.write_attempts += 1;
        if state.busy_writes > 0 {
            state.busy_writes -= 1;
            return Err(StoreError::Busy);
        }
        Ok(state)
    }

    /// Seeds an administrator row directly, bypassing provisioning.
    pub fn insert_admin(&self, username: &str, role: &str) -> AdminAccount {
        let mut state = self.lock();
        let now = Utc::now();
        let admin = AdminAccount {
            id: state.next_id(),
            username: username.to_string(),
            password_hash: String::new(),
            nickname: username.to_string(),
            role: role.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.admins.retain(|a| a.username != username);
        state.admins.push(admin.clone());
        admin
    }

    pub fn fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    /// The next `count` write attempts report `StoreError::Busy`.
    pub fn fail_next_writes(&self, count: u32) {
        self.lock().busy_writes = count;
    }

    /// Total write attempts seen, including injected failures.
    pub fn write_attempts(&self) -> u32 {
        self.lock().write_attempts
    }

    pub fn admins(&self) -> Vec<AdminAccount> {
        self.lock().admins.clone()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(self.read()?.admins.iter().find(|a| a.username == username).cloned())
    }

    async fn touch_admin_login(&self, username: &str) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if let Some(admin) = state.admins.iter_mut().find(|a| a.username == username) {
            admin.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn provision_default_admin(&self, password_hash: &str) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let now = Utc::now();
        state.admins.retain(|a| a.username == DEFAULT_ADMIN_USERNAME);
        if let Some(admin) = state.admins.first_mut() {
            admin.role = Role::SuperAdmin.as_str().to_string();
            admin.nickname = DEFAULT_ADMIN_NICKNAME.to_string();
            admin.updated_at = now;
            return Ok(());
        }
        let id = state.next_id();
        state.admins.push(AdminAccount {
            id,
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password_hash: password_hash.to_string(),
            nickname: DEFAULT_ADMIN_NICKNAME.to_string(),
            role: Role::SuperAdmin.as_str().to_string(),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn get_user_by_identity(&self, identity: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.identity == identity).cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserAccount>, StoreError> {
        Ok(self.read()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_or_create_user(
        &self,
        identity: &str,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserAccount, StoreError> {
        let mut state = self.write()?;
        let now = Utc::now();
        if let Some(user) = state.users.iter_mut().find(|u| u.identity == identity) {
            user.last_login_at = now;
            user.updated_at = now;
            if let Some(nickname) = meaningful_nickname(nickname) {
                user.nickname = nickname.to_string();
            }
            if let Some(avatar) = meaningful_avatar(avatar) {
                user.avatar = avatar.to_string();
            }
            return Ok(user.clone());
        }

        let user = UserAccount {
            id: state.next_id(),
            identity: identity.to_string(),
            nickname: nickname.unwrap_or_default().to_string(),
            avatar: avatar.unwrap_or_default().to_string(),
            role: Role::User.as_str().to_string(),
            created_at: now,
            updated_at: now,
            last_login_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update_user_nickname(&self, identity: &str, nickname: &str) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(match state.users.iter_mut().find(|u| u.identity == identity) {
            Some(user) => {
                user.nickname = nickname.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_user_avatar(&self, identity: &str, avatar: &str) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(match state.users.iter_mut().find(|u| u.identity == identity) {
            Some(user) => {
                user.avatar = avatar.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn list_users(
        &self,
        page: i64,
        page_size: i64,
        role: Option<&str>,
    ) -> Result<(Vec<UserAccount>, i64), StoreError> {
        let state = self.read()?;
        let mut matching: Vec<UserAccount> = state
            .users
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let offset = usize::try_from(page_offset(page, page_size)).unwrap_or(usize::MAX);
        let list = matching.into_iter().skip(offset).take(page_size.max(0) as usize).collect();
        Ok((list, total))
    }

    async fn set_user_role(&self, user_id: i64, role: Role) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(match state.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.role = role.as_str().to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_user_role_by_identity(&self, identity: &str, role: Role) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(match state.users.iter_mut().find(|u| u.identity == identity) {
            Some(user) => {
                user.role = role.as_str().to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn get_content(&self, kind: ContentKind, id: i64) -> Result<Option<ContentItem>, StoreError> {
        Ok(self
            .read()?
            .content
            .iter()
            .find(|item| item.kind() == kind && item.id() == id)
            .cloned())
    }

    async fn list_content(&self, kind: ContentKind, filter: &ContentFilter) -> Result<Vec<ContentItem>, StoreError> {
        let keyword = filter.normalized_keyword();
        let category = filter.normalized_category();
        let urgency = filter.normalized_urgency();
        let state = self.read()?;

        let mut items: Vec<ContentItem> = state
            .content
            .iter()
            .filter(|item| item.kind() == kind)
            .filter(|item| {
                keyword.as_deref().is_none_or(|k| {
                    let (first, second) = item.search_fields();
                    first.to_lowercase().contains(k) || second.to_lowercase().contains(k)
                })
            })
            .filter(|item| match (&category, item.category_field()) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .filter(|item| match (&urgency, item.urgency_field()) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .cloned()
            .collect();
        items.sort_by_key(|item| std::cmp::Reverse(item.id()));
        if let Some(limit) = filter.limit {
            items.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(items)
    }

    async fn list_content_by_publisher(
        &self,
        kind: ContentKind,
        publisher: &str,
    ) -> Result<Vec<ContentItem>, StoreError> {
        use crate::ownership::HasOwner;

        let state = self.read()?;
        let mut items: Vec<ContentItem> = state
            .content
            .iter()
            .filter(|item| item.kind() == kind && item.publisher_identity() == publisher)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id())));
        Ok(items)
    }

    async fn create_content(&self, publisher: &str, draft: &ContentDraft) -> Result<i64, StoreError> {
        let mut state = self.write()?;
        let id = state.next_id();
        let item = draft.clone().into_item(id, publisher, Utc::now());
        state.content.push(item);
        Ok(id)
    }

    async fn update_content(&self, id: i64, draft: &ContentDraft) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let kind = draft.kind();
        Ok(match state.content.iter_mut().find(|item| item.kind() == kind && item.id() == id) {
            Some(item) => item.apply_draft(draft.clone()),
            None => false,
        })
    }

    async fn delete_content(&self, kind: ContentKind, id: i64) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let before = state.content.len();
        state.content.retain(|item| !(item.kind() == kind && item.id() == id));
        Ok(state.content.len() < before)
    }

    async fn increment_views(&self, kind: ContentKind, id: i64) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if let Some(item) = state
            .content
            .iter_mut()
            .find(|item| item.kind() == kind && item.id() == id)
        {
            item.bump_views();
        }
        Ok(())
    }

    async fn upsert_favorite(&self, identity: &str, item: &ItemRef) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .favorites
            .retain(|(owner, f)| !(owner == identity && f.item_kind == item.item_kind && f.item_id == item.item_id));
        state.favorites.push((
            identity.to_string(),
            Favorite {
                item_kind: item.item_kind.clone(),
                item_id: item.item_id,
                title: item.title.clone(),
                image: item.image.clone(),
                saved_at: Utc::now(),
            },
        ));
        Ok(())
    }

    async fn remove_favorite(&self, identity: &str, item_kind: &str, item_id: i64) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|(owner, f)| !(owner == identity && f.item_kind == item_kind && f.item_id == item_id));
        Ok(state.favorites.len() < before)
    }

    async fn list_favorites(&self, identity: &str) -> Result<Vec<Favorite>, StoreError> {
        // Entries are appended on every save, so reverse order is newest first.
        Ok(self
            .read()?
            .favorites
            .iter()
            .rev()
            .filter(|(owner, _)| owner == identity)
            .map(|(_, f)| f.clone())
            .collect())
    }

    async fn upsert_history(&self, identity: &str, item: &ItemRef) -> Result<(), StoreError> {
        let mut state = self.write()?;
        state
            .history
            .retain(|(owner, h)| !(owner == identity && h.item_kind == item.item_kind && h.item_id == item.item_id));
        state.history.push((
            identity.to_string(),
            HistoryEntry {
                item_kind: item.item_kind.clone(),
                item_id: item.item_id,
                title: item.title.clone(),
                image: item.image.clone(),
                viewed_at: Utc::now(),
            },
        ));
        Ok(())
    }

    async fn list_history(&self, identity: &str, limit: i64) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self
            .read()?
            .history
            .iter()
            .rev()
            .filter(|(owner, _)| owner == identity)
            .take(limit.max(0) as usize)
            .map(|(_, h)| h.clone())
            .collect())
    }

    async fn clear_history(&self, identity: &str) -> Result<u64, StoreError> {
        let mut state = self.write()?;
        let before = state.history.len();
        state.history.retain(|(owner, _)| owner != identity);
        Ok((before - state.history.len()) as u64)
    }

    async fn create_feedback(
        &self,
        identity: &str,
        nickname: &str,
        req: &CreateFeedbackRequest,
    ) -> Result<i64, StoreError> {
        let mut state = self.write()?;
        let id = state.next_id();
        state.feedback.push(Feedback {
            id,
            feedback_type: req.feedback_type.clone(),
            content: req.content.clone(),
            contact: req.contact.clone(),
            identity: identity.to_string(),
            nickname: nickname.to_string(),
            status: "unread".to_string(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StoreError> {
        Ok(self.read()?.feedback.iter().rev().cloned().collect())
    }

    async fn mark_feedback_read(&self, id: i64) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        Ok(match state.feedback.iter_mut().find(|f| f.id == id) {
            Some(feedback) => {
                feedback.status = "read".to_string();
                true
            }
            None => false,
        })
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read()?.settings.get(key).cloned())
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.write()?.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
