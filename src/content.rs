use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::AuthzError;

/// ContentKind
///
/// The closed set of publishable content. The wire tag (`as_str`) is what clients
/// send in paths and payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    News,
    Farmhouse,
    Policy,
    Tourism,
    Job,
    Help,
    Consultation,
}

impl ContentKind {
    pub const ALL: [ContentKind; 7] = [
        ContentKind::News,
        ContentKind::Farmhouse,
        ContentKind::Policy,
        ContentKind::Tourism,
        ContentKind::Job,
        ContentKind::Help,
        ContentKind::Consultation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Farmhouse => "farmhouse",
            ContentKind::Policy => "policy",
            ContentKind::Tourism => "tourism",
            ContentKind::Job => "job",
            ContentKind::Help => "help",
            ContentKind::Consultation => "consultation",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::News => "news",
            ContentKind::Farmhouse => "farmhouses",
            ContentKind::Policy => "policies",
            ContentKind::Tourism => "tourism",
            ContentKind::Job => "jobs",
            ContentKind::Help => "help_requests",
            ContentKind::Consultation => "consultations",
        }
    }

    /// Column holding the publisher identity. Consultations call it the author.
    pub fn owner_column(&self) -> &'static str {
        match self {
            ContentKind::Consultation => "author_id",
            _ => "publisher_id",
        }
    }

    pub fn view_column(&self) -> &'static str {
        match self {
            ContentKind::Policy => "read_count",
            _ => "view_count",
        }
    }

    /// The two text columns a keyword search looks at.
    pub fn search_columns(&self) -> (&'static str, &'static str) {
        match self {
            ContentKind::News | ContentKind::Policy => ("title", "summary"),
            ContentKind::Farmhouse => ("title", "address"),
            ContentKind::Tourism => ("name", "location"),
            ContentKind::Job => ("title", "company"),
            ContentKind::Help => ("title", "description"),
            ContentKind::Consultation => ("title", "content"),
        }
    }

    /// Column a category filter applies to. Farmhouses are not categorised;
    /// jobs filter by location instead.
    pub fn category_column(&self) -> Option<&'static str> {
        match self {
            ContentKind::Farmhouse => None,
            ContentKind::Job => Some("location"),
            _ => Some("category"),
        }
    }

    pub fn urgency_column(&self) -> Option<&'static str> {
        match self {
            ContentKind::Help => Some("urgency"),
            _ => None,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AuthzError::UnsupportedKind(s.to_string()))
    }
}

// --- Rows ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub author: String,
    pub summary: String,
    pub content: String,
    pub image: String,
    pub is_hot: bool,
    pub view_count: i64,
    pub publisher_id: String,
    pub publish_time: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Farmhouse {
    pub id: i64,
    pub title: String,
    pub address: String,
    pub description: String,
    pub image: String,
    pub phone: String,
    pub price: String,
    pub open_time: String,
    pub view_count: i64,
    pub publisher_id: String,
    pub publish_time: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Policy {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub department: String,
    pub summary: String,
    pub content: String,
    pub image: String,
    pub is_important: bool,
    pub read_count: i64,
    pub publisher_id: String,
    pub publish_time: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tourism {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub location: String,
    pub description: String,
    pub image: String,
    pub phone: String,
    pub price: i64,
    pub view_count: i64,
    pub publisher_id: String,
    pub publisher_name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub is_urgent: bool,
    pub view_count: i64,
    pub publisher_id: String,
    pub publisher_name: String,
    pub publish_time: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct HelpRequest {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub location: String,
    pub urgency: String,
    pub description: String,
    pub phone: String,
    pub reward: String,
    pub status: String,
    pub view_count: i64,
    pub publisher_id: String,
    pub publish_time: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Consultation {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub content: String,
    pub author: String,
    // Same meaning as `publisher_id` on the other kinds.
    pub author_id: String,
    pub status: String,
    pub view_count: i64,
    pub publish_time: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// ContentItem
///
/// Any stored content row, tagged by kind on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentItem {
    News(News),
    Farmhouse(Farmhouse),
    Policy(Policy),
    Tourism(Tourism),
    Job(Job),
    Help(HelpRequest),
    Consultation(Consultation),
}

impl ContentItem {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::News(_) => ContentKind::News,
            ContentItem::Farmhouse(_) => ContentKind::Farmhouse,
            ContentItem::Policy(_) => ContentKind::Policy,
            ContentItem::Tourism(_) => ContentKind::Tourism,
            ContentItem::Job(_) => ContentKind::Job,
            ContentItem::Help(_) => ContentKind::Help,
            ContentItem::Consultation(_) => ContentKind::Consultation,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ContentItem::News(n) => n.id,
            ContentItem::Farmhouse(f) => f.id,
            ContentItem::Policy(p) => p.id,
            ContentItem::Tourism(t) => t.id,
            ContentItem::Job(j) => j.id,
            ContentItem::Help(h) => h.id,
            ContentItem::Consultation(c) => c.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            ContentItem::News(n) => n.created_at,
            ContentItem::Farmhouse(f) => f.created_at,
            ContentItem::Policy(p) => p.created_at,
            ContentItem::Tourism(t) => t.created_at,
            ContentItem::Job(j) => j.created_at,
            ContentItem::Help(h) => h.created_at,
            ContentItem::Consultation(c) => c.created_at,
        }
    }

    /// Values of `ContentKind::search_columns`, in the same order.
    pub fn search_fields(&self) -> (&str, &str) {
        match self {
            ContentItem::News(n) => (&n.title, &n.summary),
            ContentItem::Farmhouse(f) => (&f.title, &f.address),
            ContentItem::Policy(p) => (&p.title, &p.summary),
            ContentItem::Tourism(t) => (&t.name, &t.location),
            ContentItem::Job(j) => (&j.title, &j.company),
            ContentItem::Help(h) => (&h.title, &h.description),
            ContentItem::Consultation(c) => (&c.title, &c.content),
        }
    }

    /// Value of `ContentKind::category_column`.
    pub fn category_field(&self) -> Option<&str> {
        match self {
            ContentItem::News(n) => Some(&n.category),
            ContentItem::Farmhouse(_) => None,
            ContentItem::Policy(p) => Some(&p.category),
            ContentItem::Tourism(t) => Some(&t.category),
            ContentItem::Job(j) => Some(&j.location),
            ContentItem::Help(h) => Some(&h.category),
            ContentItem::Consultation(c) => Some(&c.category),
        }
    }

    pub fn urgency_field(&self) -> Option<&str> {
        match self {
            ContentItem::Help(h) => Some(&h.urgency),
            _ => None,
        }
    }

    /// Copies the editable fields of `draft` onto this row. Identity, publisher,
    /// counters, status and timestamps stay as they are. `false` on a kind mismatch.
    pub fn apply_draft(&mut self, draft: ContentDraft) -> bool {
        match (self, draft) {
            (ContentItem::News(n), ContentDraft::News(d)) => {
                n.title = d.title;
                n.category = d.category;
                n.author = d.author;
                n.summary = d.summary;
                n.content = d.content;
                n.image = d.image;
                n.is_hot = d.is_hot;
            }
            (ContentItem::Farmhouse(f), ContentDraft::Farmhouse(d)) => {
                f.title = d.title;
                f.address = d.address;
                f.description = d.description;
                f.image = d.image;
                f.phone = d.phone;
                f.price = d.price;
                f.open_time = d.open_time;
            }
            (ContentItem::Policy(p), ContentDraft::Policy(d)) => {
                p.title = d.title;
                p.category = d.category;
                p.department = d.department;
                p.summary = d.summary;
                p.content = d.content;
                p.image = d.image;
                p.is_important = d.is_important;
            }
            (ContentItem::Tourism(t), ContentDraft::Tourism(d)) => {
                t.name = d.name;
                t.category = d.category;
                t.location = d.location;
                t.description = d.description;
                t.image = d.image;
                t.phone = d.phone;
                t.price = d.price;
                t.publisher_name = d.publisher_name;
            }
            (ContentItem::Job(j), ContentDraft::Job(d)) => {
                j.title = d.title;
                j.company = d.company;
                j.location = d.location;
                j.salary = d.salary;
                j.description = d.description;
                j.is_urgent = d.is_urgent;
                j.publisher_name = d.publisher_name;
            }
            (ContentItem::Help(h), ContentDraft::Help(d)) => {
                h.title = d.title;
                h.category = d.category;
                h.location = d.location;
                h.urgency = d.urgency;
                h.description = d.description;
                h.phone = d.phone;
                h.reward = d.reward;
            }
            (ContentItem::Consultation(c), ContentDraft::Consultation(d)) => {
                c.title = d.title;
                c.category = d.category;
                c.content = d.content;
                c.author = d.author;
            }
            _ => return false,
        }
        true
    }

    pub fn bump_views(&mut self) {
        match self {
            ContentItem::News(n) => n.view_count += 1,
            ContentItem::Farmhouse(f) => f.view_count += 1,
            ContentItem::Policy(p) => p.read_count += 1,
            ContentItem::Tourism(t) => t.view_count += 1,
            ContentItem::Job(j) => j.view_count += 1,
            ContentItem::Help(h) => h.view_count += 1,
            ContentItem::Consultation(c) => c.view_count += 1,
        }
    }
}

// --- Drafts (create payloads) ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct NewsDraft {
    pub title: String,
    pub category: String,
    pub author: String,
    pub summary: String,
    pub content: String,
    pub image: String,
    pub is_hot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct FarmhouseDraft {
    pub title: String,
    pub address: String,
    pub description: String,
    pub image: String,
    pub phone: String,
    pub price: String,
    pub open_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct PolicyDraft {
    pub title: String,
    pub category: String,
    pub department: String,
    pub summary: String,
    pub content: String,
    pub image: String,
    pub is_important: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct TourismDraft {
    pub name: String,
    pub category: String,
    pub location: String,
    pub description: String,
    pub image: String,
    pub phone: String,
    pub price: i64,
    pub publisher_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct JobDraft {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub description: String,
    pub is_urgent: bool,
    pub publisher_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct HelpDraft {
    pub title: String,
    pub category: String,
    pub location: String,
    pub urgency: String,
    pub description: String,
    pub phone: String,
    pub reward: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(default)]
pub struct ConsultationDraft {
    pub title: String,
    pub category: String,
    pub content: String,
    pub author: String,
}

/// ContentDraft
///
/// Create payload for one kind. The publisher identity is never part of the
/// draft: it is always the caller's asserted identity, stamped by the store.
#[derive(Debug, Clone)]
pub enum ContentDraft {
    News(NewsDraft),
    Farmhouse(FarmhouseDraft),
    Policy(PolicyDraft),
    Tourism(TourismDraft),
    Job(JobDraft),
    Help(HelpDraft),
    Consultation(ConsultationDraft),
}

pub const HELP_OPEN_STATUS: &str = "求助中";
pub const CONSULTATION_OPEN_STATUS: &str = "待回复";

impl ContentDraft {
    /// Decodes a JSON body as the draft type of `kind`.
    pub fn from_json(kind: ContentKind, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ContentKind::News => ContentDraft::News(serde_json::from_value(body)?),
            ContentKind::Farmhouse => ContentDraft::Farmhouse(serde_json::from_value(body)?),
            ContentKind::Policy => ContentDraft::Policy(serde_json::from_value(body)?),
            ContentKind::Tourism => ContentDraft::Tourism(serde_json::from_value(body)?),
            ContentKind::Job => ContentDraft::Job(serde_json::from_value(body)?),
            ContentKind::Help => ContentDraft::Help(serde_json::from_value(body)?),
            ContentKind::Consultation => ContentDraft::Consultation(serde_json::from_value(body)?),
        })
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentDraft::News(_) => ContentKind::News,
            ContentDraft::Farmhouse(_) => ContentKind::Farmhouse,
            ContentDraft::Policy(_) => ContentKind::Policy,
            ContentDraft::Tourism(_) => ContentKind::Tourism,
            ContentDraft::Job(_) => ContentKind::Job,
            ContentDraft::Help(_) => ContentKind::Help,
            ContentDraft::Consultation(_) => ContentKind::Consultation,
        }
    }

    /// The headline field every kind requires.
    pub fn title(&self) -> &str {
        match self {
            ContentDraft::News(d) => &d.title,
            ContentDraft::Farmhouse(d) => &d.title,
            ContentDraft::Policy(d) => &d.title,
            ContentDraft::Tourism(d) => &d.name,
            ContentDraft::Job(d) => &d.title,
            ContentDraft::Help(d) => &d.title,
            ContentDraft::Consultation(d) => &d.title,
        }
    }

    /// Date string shown to readers. Consultations carry minutes.
    pub fn publish_time(&self, now: DateTime<Utc>) -> String {
        match self {
            ContentDraft::Consultation(_) => now.format("%Y-%m-%d %H:%M").to_string(),
            _ => now.format("%Y-%m-%d").to_string(),
        }
    }

    /// Materialises the row a store would hold after inserting this draft.
    pub fn into_item(self, id: i64, publisher: &str, now: DateTime<Utc>) -> ContentItem {
        let publish_time = self.publish_time(now);
        let publisher_id = publisher.to_string();
        match self {
            ContentDraft::News(d) => ContentItem::News(News {
                id,
                title: d.title,
                category: d.category,
                author: d.author,
                summary: d.summary,
                content: d.content,
                image: d.image,
                is_hot: d.is_hot,
                view_count: 0,
                publisher_id,
                publish_time,
                created_at: now,
            }),
            ContentDraft::Farmhouse(d) => ContentItem::Farmhouse(Farmhouse {
                id,
                title: d.title,
                address: d.address,
                description: d.description,
                image: d.image,
                phone: d.phone,
                price: d.price,
                open_time: d.open_time,
                view_count: 0,
                publisher_id,
                publish_time,
                created_at: now,
            }),
            ContentDraft::Policy(d) => ContentItem::Policy(Policy {
                id,
                title: d.title,
                category: d.category,
                department: d.department,
                summary: d.summary,
                content: d.content,
                image: d.image,
                is_important: d.is_important,
                read_count: 0,
                publisher_id,
                publish_time,
                created_at: now,
            }),
            ContentDraft::Tourism(d) => ContentItem::Tourism(Tourism {
                id,
                name: d.name,
                category: d.category,
                location: d.location,
                description: d.description,
                image: d.image,
                phone: d.phone,
                price: d.price,
                view_count: 0,
                publisher_id,
                publisher_name: d.publisher_name,
                created_at: now,
            }),
            ContentDraft::Job(d) => ContentItem::Job(Job {
                id,
                title: d.title,
                company: d.company,
                location: d.location,
                salary: d.salary,
                description: d.description,
                is_urgent: d.is_urgent,
                view_count: 0,
                publisher_id,
                publisher_name: d.publisher_name,
                publish_time,
                created_at: now,
            }),
            ContentDraft::Help(d) => ContentItem::Help(HelpRequest {
                id,
                title: d.title,
                category: d.category,
                location: d.location,
                urgency: d.urgency,
                description: d.description,
                phone: d.phone,
                reward: d.reward,
                status: HELP_OPEN_STATUS.to_string(),
                view_count: 0,
                publisher_id,
                publish_time,
                created_at: now,
            }),
            ContentDraft::Consultation(d) => ContentItem::Consultation(Consultation {
                id,
                title: d.title,
                category: d.category,
                content: d.content,
                author: d.author,
                author_id: publisher_id,
                status: CONSULTATION_OPEN_STATUS.to_string(),
                view_count: 0,
                publish_time,
                created_at: now,
            }),
        }
    }
}
