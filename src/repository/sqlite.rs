use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    FromRow, QueryBuilder, Sqlite, SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous},
};
use std::{str::FromStr, time::Duration};

use super::{
    ContentFilter, DEFAULT_ADMIN_NICKNAME, DEFAULT_ADMIN_USERNAME, Repository, meaningful_avatar,
    meaningful_nickname, page_offset,
};
use crate::{
    content::{
        Consultation, ContentDraft, ContentItem, ContentKind, Farmhouse, HELP_OPEN_STATUS, HelpRequest, Job,
        News, Policy, Tourism, CONSULTATION_OPEN_STATUS,
    },
    error::StoreError,
    models::{AdminAccount, CreateFeedbackRequest, Favorite, Feedback, HistoryEntry, ItemRef, UserAccount},
    roles::Role,
};

/// Schema migrations embedded from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

// SQLite primary result codes signalling that another connection holds the lock.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

// Floor for waiting on the pool, so a zero busy timeout still lets an idle connection be handed out.
const MIN_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(1);

/// Maps driver errors onto the store taxonomy. Contention is recognised from the
/// SQLite result code (extended codes carry the primary code in the low byte).
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let primary = db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            if matches!(primary, Some(SQLITE_BUSY | SQLITE_LOCKED)) {
                return StoreError::Busy;
            }
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
        }
        match err {
            // The pool holds the single writer connection; waiting it out is contention.
            sqlx::Error::PoolTimedOut => StoreError::Busy,
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => StoreError::Database(other),
        }
    }
}

/// What a content SELECT narrows down to.
enum Selection<'a> {
    Id(i64),
    Filter(&'a ContentFilter),
    Publisher(&'a str),
}

/// SqliteRepository
///
/// The embedded store. The pool holds one connection, so SQLite sees a single
/// writer and every mutation across all requests is serialized here.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` with WAL journaling and
    /// the given busy timeout.
    pub async fn connect(url: &str, busy_timeout: Duration) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(busy_timeout)
            .foreign_keys(true);

        // Waiting for the single connection is contention too; bound it by the same window.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(busy_timeout.max(MIN_ACQUIRE_TIMEOUT))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.pool).await.map_err(|e| match e {
            sqlx::migrate::MigrateError::Execute(inner) => inner.into(),
            other => StoreError::Corrupt(other.to_string()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn select_as<T>(&self, kind: ContentKind, selection: &Selection<'_>) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT * FROM {} WHERE 1 = 1", kind.table()));

        match selection {
            Selection::Id(id) => {
                builder.push(" AND id = ");
                builder.push_bind(*id);
            }
            Selection::Filter(filter) => {
                if let Some(pattern) = filter.keyword_pattern() {
                    let (first, second) = kind.search_columns();
                    builder.push(format!(" AND (lower({first}) LIKE "));
                    builder.push_bind(pattern.clone());
                    builder.push(format!(" ESCAPE '\\' OR lower({second}) LIKE "));
                    builder.push_bind(pattern);
                    builder.push(" ESCAPE '\\')");
                }
                if let (Some(category), Some(column)) = (filter.normalized_category(), kind.category_column()) {
                    builder.push(format!(" AND {column} = "));
                    builder.push_bind(category);
                }
                if let (Some(urgency), Some(column)) = (filter.normalized_urgency(), kind.urgency_column()) {
                    builder.push(format!(" AND {column} = "));
                    builder.push_bind(urgency);
                }
                builder.push(" ORDER BY id DESC");
                if let Some(limit) = filter.limit {
                    builder.push(" LIMIT ");
                    builder.push_bind(limit.max(0));
                }
            }
            Selection::Publisher(publisher) => {
                builder.push(format!(" AND {} = ", kind.owner_column()));
                builder.push_bind(publisher.to_string());
                builder.push(" ORDER BY created_at DESC, id DESC");
            }
        }

        Ok(builder.build_query_as::<T>().fetch_all(&self.pool).await?)
    }

    async fn select(&self, kind: ContentKind, selection: Selection<'_>) -> Result<Vec<ContentItem>, StoreError> {
        let items = match kind {
            ContentKind::News => wrap(self.select_as::<News>(kind, &selection).await?, ContentItem::News),
            ContentKind::Farmhouse => {
                wrap(self.select_as::<Farmhouse>(kind, &selection).await?, ContentItem::Farmhouse)
            }
            ContentKind::Policy => wrap(self.select_as::<Policy>(kind, &selection).await?, ContentItem::Policy),
            ContentKind::Tourism => wrap(self.select_as::<Tourism>(kind, &selection).await?, ContentItem::Tourism),
            ContentKind::Job => wrap(self.select_as::<Job>(kind, &selection).await?, ContentItem::Job),
            ContentKind::Help => wrap(self.select_as::<HelpRequest>(kind, &selection).await?, ContentItem::Help),
            ContentKind::Consultation => wrap(
                self.select_as::<Consultation>(kind, &selection).await?,
                ContentItem::Consultation,
            ),
        };
        Ok(items)
    }
}

fn wrap<T>(rows: Vec<T>, variant: fn(T) -> ContentItem) -> Vec<ContentItem> {
    rows.into_iter().map(variant).collect()
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn get_admin_by_username(&self, username: &str) -> Result<Option<AdminAccount>, StoreError> {
        Ok(sqlx::query_as::<_, AdminAccount>("SELECT * FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn touch_admin_login(&self, username: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE admins SET updated_at = ? WHERE username = ?")
            .bind(Utc::now())
            .bind(username)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn provision_default_admin(&self, password_hash: &str) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let pruned = sqlx::query("DELETE FROM admins WHERE username != ?")
            .bind(DEFAULT_ADMIN_USERNAME)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO admins (username, password_hash, nickname, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (username) DO UPDATE
            SET role = excluded.role, nickname = excluded.nickname, updated_at = excluded.updated_at
            "#,
        )
        .bind(DEFAULT_ADMIN_USERNAME)
        .bind(password_hash)
        .bind(DEFAULT_ADMIN_NICKNAME)
        .bind(Role::SuperAdmin.as_str())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(pruned, "default administrator provisioned");
        Ok(())
    }

    async fn get_user_by_identity(&self, identity: &str) -> Result<Option<UserAccount>, StoreError> {
        Ok(sqlx::query_as::<_, UserAccount>("SELECT * FROM users WHERE identity = ?")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<UserAccount>, StoreError> {
        Ok(sqlx::query_as::<_, UserAccount>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// One upsert statement: concurrent first logins of the same identity
    /// converge on a single row.
    async fn get_or_create_user(
        &self,
        identity: &str,
        nickname: Option<&str>,
        avatar: Option<&str>,
    ) -> Result<UserAccount, StoreError> {
        let now = Utc::now();
        let nickname_update = meaningful_nickname(nickname);
        let avatar_update = meaningful_avatar(avatar);

        sqlx::query(
            r#"
            INSERT INTO users (identity, nickname, avatar, role, created_at, updated_at, last_login_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (identity) DO UPDATE
            SET last_login_at = excluded.last_login_at,
                updated_at = excluded.updated_at,
                nickname = COALESCE(?, users.nickname),
                avatar = COALESCE(?, users.avatar)
            "#,
        )
        .bind(identity)
        .bind(nickname.unwrap_or_default())
        .bind(avatar.unwrap_or_default())
        .bind(Role::User.as_str())
        .bind(now)
        .bind(now)
        .bind(now)
        .bind(nickname_update)
        .bind(avatar_update)
        .execute(&self.pool)
        .await?;

        self.get_user_by_identity(identity).await?.ok_or(StoreError::NotFound)
    }

    async fn update_user_nickname(&self, identity: &str, nickname: &str) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE users SET nickname = ?, updated_at = ? WHERE identity = ?")
            .bind(nickname)
            .bind(Utc::now())
            .bind(identity)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn update_user_avatar(&self, identity: &str, avatar: &str) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE users SET avatar = ?, updated_at = ? WHERE identity = ?")
            .bind(avatar)
            .bind(Utc::now())
            .bind(identity)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_users(
        &self,
        page: i64,
        page_size: i64,
        role: Option<&str>,
    ) -> Result<(Vec<UserAccount>, i64), StoreError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE (? IS NULL OR role = ?)")
            .bind(role)
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        let offset = page_offset(page, page_size);
        let users = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT * FROM users
            WHERE (? IS NULL OR role = ?)
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(role)
        .bind(role)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    async fn set_user_role(&self, user_id: i64, role: Role) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_user_role_by_identity(&self, identity: &str, role: Role) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE identity = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(identity)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_content(&self, kind: ContentKind, id: i64) -> Result<Option<ContentItem>, StoreError> {
        Ok(self.select(kind, Selection::Id(id)).await?.into_iter().next())
    }

    async fn list_content(&self, kind: ContentKind, filter: &ContentFilter) -> Result<Vec<ContentItem>, StoreError> {
        self.select(kind, Selection::Filter(filter)).await
    }

    async fn list_content_by_publisher(
        &self,
        kind: ContentKind,
        publisher: &str,
    ) -> Result<Vec<ContentItem>, StoreError> {
        self.select(kind, Selection::Publisher(publisher)).await
    }

    async fn create_content(&self, publisher: &str, draft: &ContentDraft) -> Result<i64, StoreError> {
        let now = Utc::now();
        let publish_time = draft.publish_time(now);

        let query = match draft {
            ContentDraft::News(d) => sqlx::query(
                r#"INSERT INTO news (title, category, author, summary, content, image, is_hot, publisher_id, publish_time, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.author)
            .bind(&d.summary)
            .bind(&d.content)
            .bind(&d.image)
            .bind(d.is_hot),
            ContentDraft::Farmhouse(d) => sqlx::query(
                r#"INSERT INTO farmhouses (title, address, description, image, phone, price, open_time, publisher_id, publish_time, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&d.title)
            .bind(&d.address)
            .bind(&d.description)
            .bind(&d.image)
            .bind(&d.phone)
            .bind(&d.price)
            .bind(&d.open_time),
            ContentDraft::Policy(d) => sqlx::query(
                r#"INSERT INTO policies (title, category, department, summary, content, image, is_important, publisher_id, publish_time, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.department)
            .bind(&d.summary)
            .bind(&d.content)
            .bind(&d.image)
            .bind(d.is_important),
            ContentDraft::Job(d) => sqlx::query(
                r#"INSERT INTO jobs (title, company, location, salary, description, is_urgent, publisher_name, publisher_id, publish_time, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&d.title)
            .bind(&d.company)
            .bind(&d.location)
            .bind(&d.salary)
            .bind(&d.description)
            .bind(d.is_urgent)
            .bind(&d.publisher_name),
            ContentDraft::Help(d) => sqlx::query(
                r#"INSERT INTO help_requests (title, category, location, urgency, description, phone, reward, status, publisher_id, publish_time, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.location)
            .bind(&d.urgency)
            .bind(&d.description)
            .bind(&d.phone)
            .bind(&d.reward)
            .bind(HELP_OPEN_STATUS),
            ContentDraft::Consultation(d) => sqlx::query(
                r#"INSERT INTO consultations (title, category, content, author, status, author_id, publish_time, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.content)
            .bind(&d.author)
            .bind(CONSULTATION_OPEN_STATUS),
            // Tourism has no publish_time column; it is bound separately below.
            ContentDraft::Tourism(d) => {
                let res = sqlx::query(
                    r#"INSERT INTO tourism (name, category, location, description, image, phone, price, publisher_name, publisher_id, created_at)
                       VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                )
                .bind(&d.name)
                .bind(&d.category)
                .bind(&d.location)
                .bind(&d.description)
                .bind(&d.image)
                .bind(&d.phone)
                .bind(d.price)
                .bind(&d.publisher_name)
                .bind(publisher)
                .bind(now)
                .execute(&self.pool)
                .await?;
                return Ok(res.last_insert_rowid());
            }
        };

        let res = query
            .bind(publisher)
            .bind(publish_time)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(res.last_insert_rowid())
    }

    async fn update_content(&self, id: i64, draft: &ContentDraft) -> Result<bool, StoreError> {
        // The publisher column never appears in a SET list.
        let query = match draft {
            ContentDraft::News(d) => sqlx::query(
                r#"UPDATE news SET title = ?, category = ?, author = ?, summary = ?, content = ?, image = ?, is_hot = ?
                   WHERE id = ?"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.author)
            .bind(&d.summary)
            .bind(&d.content)
            .bind(&d.image)
            .bind(d.is_hot),
            ContentDraft::Farmhouse(d) => sqlx::query(
                r#"UPDATE farmhouses SET title = ?, address = ?, description = ?, image = ?, phone = ?, price = ?, open_time = ?
                   WHERE id = ?"#,
            )
            .bind(&d.title)
            .bind(&d.address)
            .bind(&d.description)
            .bind(&d.image)
            .bind(&d.phone)
            .bind(&d.price)
            .bind(&d.open_time),
            ContentDraft::Policy(d) => sqlx::query(
                r#"UPDATE policies SET title = ?, category = ?, department = ?, summary = ?, content = ?, image = ?, is_important = ?
                   WHERE id = ?"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.department)
            .bind(&d.summary)
            .bind(&d.content)
            .bind(&d.image)
            .bind(d.is_important),
            ContentDraft::Tourism(d) => sqlx::query(
                r#"UPDATE tourism SET name = ?, category = ?, location = ?, description = ?, image = ?, phone = ?, price = ?, publisher_name = ?
                   WHERE id = ?"#,
            )
            .bind(&d.name)
            .bind(&d.category)
            .bind(&d.location)
            .bind(&d.description)
            .bind(&d.image)
            .bind(&d.phone)
            .bind(d.price)
            .bind(&d.publisher_name),
            ContentDraft::Job(d) => sqlx::query(
                r#"UPDATE jobs SET title = ?, company = ?, location = ?, salary = ?, description = ?, is_urgent = ?, publisher_name = ?
                   WHERE id = ?"#,
            )
            .bind(&d.title)
            .bind(&d.company)
            .bind(&d.location)
            .bind(&d.salary)
            .bind(&d.description)
            .bind(d.is_urgent)
            .bind(&d.publisher_name),
            ContentDraft::Help(d) => sqlx::query(
                r#"UPDATE help_requests SET title = ?, category = ?, location = ?, urgency = ?, description = ?, phone = ?, reward = ?
                   WHERE id = ?"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.location)
            .bind(&d.urgency)
            .bind(&d.description)
            .bind(&d.phone)
            .bind(&d.reward),
            ContentDraft::Consultation(d) => sqlx::query(
                r#"UPDATE consultations SET title = ?, category = ?, content = ?, author = ?
                   WHERE id = ?"#,
            )
            .bind(&d.title)
            .bind(&d.category)
            .bind(&d.content)
            .bind(&d.author),
        };

        let res = query.bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_content(&self, kind: ContentKind, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.table()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_views(&self, kind: ContentKind, id: i64) -> Result<(), StoreError> {
        let column = kind.view_column();
        sqlx::query(&format!(
            "UPDATE {} SET {column} = {column} + 1 WHERE id = ?",
            kind.table()
        ))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_favorite(&self, identity: &str, item: &ItemRef) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO favorites (identity, item_kind, item_id, title, image, saved_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (identity, item_kind, item_id) DO UPDATE
            SET title = excluded.title, image = excluded.image, saved_at = excluded.saved_at
            "#,
        )
        .bind(identity)
        .bind(&item.item_kind)
        .bind(item.item_id)
        .bind(&item.title)
        .bind(&item.image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_favorite(&self, identity: &str, item_kind: &str, item_id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM favorites WHERE identity = ? AND item_kind = ? AND item_id = ?")
            .bind(identity)
            .bind(item_kind)
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_favorites(&self, identity: &str) -> Result<Vec<Favorite>, StoreError> {
        Ok(sqlx::query_as::<_, Favorite>(
            "SELECT item_kind, item_id, title, image, saved_at FROM favorites WHERE identity = ? ORDER BY saved_at DESC, id DESC",
        )
        .bind(identity)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn upsert_history(&self, identity: &str, item: &ItemRef) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO history (identity, item_kind, item_id, title, image, viewed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (identity, item_kind, item_id) DO UPDATE
            SET title = excluded.title, image = excluded.image, viewed_at = excluded.viewed_at
            "#,
        )
        .bind(identity)
        .bind(&item.item_kind)
        .bind(item.item_id)
        .bind(&item.title)
        .bind(&item.image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_history(&self, identity: &str, limit: i64) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(sqlx::query_as::<_, HistoryEntry>(
            "SELECT item_kind, item_id, title, image, viewed_at FROM history WHERE identity = ? ORDER BY viewed_at DESC, id DESC LIMIT ?",
        )
        .bind(identity)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn clear_history(&self, identity: &str) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM history WHERE identity = ?")
            .bind(identity)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    async fn create_feedback(
        &self,
        identity: &str,
        nickname: &str,
        req: &CreateFeedbackRequest,
    ) -> Result<i64, StoreError> {
        let res = sqlx::query(
            r#"INSERT INTO feedback (feedback_type, content, contact, identity, nickname, status, created_at)
               VALUES (?, ?, ?, ?, ?, 'unread', ?)"#,
        )
        .bind(&req.feedback_type)
        .bind(&req.content)
        .bind(&req.contact)
        .bind(identity)
        .bind(nickname)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(res.last_insert_rowid())
    }

    async fn list_feedback(&self) -> Result<Vec<Feedback>, StoreError> {
        Ok(sqlx::query_as::<_, Feedback>("SELECT * FROM feedback ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn mark_feedback_read(&self, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE feedback SET status = 'read' WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn put_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
