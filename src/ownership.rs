//! Ownership resolution: who published a given piece of content.
//!
//! Each content row records the identity that created it. The field name differs
//! between kinds (`author_id` on consultations, `publisher_id` elsewhere), so every
//! row type exposes it through `HasOwner` and lookups dispatch on `ContentKind`.
//! The recorded identity is historical: it is never checked against the account
//! tables and never cached.

use crate::{
    content::{Consultation, ContentItem, ContentKind, Farmhouse, HelpRequest, Job, News, Policy, Tourism},
    error::AuthzError,
    repository::Repository,
};

pub trait HasOwner {
    fn publisher_identity(&self) -> &str;
}

impl HasOwner for News {
    fn publisher_identity(&self) -> &str {
        &self.publisher_id
    }
}

impl HasOwner for Farmhouse {
    fn publisher_identity(&self) -> &str {
        &self.publisher_id
    }
}

impl HasOwner for Policy {
    fn publisher_identity(&self) -> &str {
        &self.publisher_id
    }
}

impl HasOwner for Tourism {
    fn publisher_identity(&self) -> &str {
        &self.publisher_id
    }
}

impl HasOwner for Job {
    fn publisher_identity(&self) -> &str {
        &self.publisher_id
    }
}

impl HasOwner for HelpRequest {
    fn publisher_identity(&self) -> &str {
        &self.publisher_id
    }
}

impl HasOwner for Consultation {
    fn publisher_identity(&self) -> &str {
        &self.author_id
    }
}

impl HasOwner for ContentItem {
    fn publisher_identity(&self) -> &str {
        match self {
            ContentItem::News(n) => n.publisher_identity(),
            ContentItem::Farmhouse(f) => f.publisher_identity(),
            ContentItem::Policy(p) => p.publisher_identity(),
            ContentItem::Tourism(t) => t.publisher_identity(),
            ContentItem::Job(j) => j.publisher_identity(),
            ContentItem::Help(h) => h.publisher_identity(),
            ContentItem::Consultation(c) => c.publisher_identity(),
        }
    }
}

/// Publisher identity of `(kind, id)`.
///
/// `kind` is the raw tag from the caller; anything outside the recognised set is
/// `UnsupportedKind`. A missing row is `NotFound`.
pub async fn owner_of(repo: &dyn Repository, kind: &str, id: i64) -> Result<String, AuthzError> {
    let kind: ContentKind = kind.parse()?;
    owner_of_kind(repo, kind, id).await
}

pub async fn owner_of_kind(
    repo: &dyn Repository,
    kind: ContentKind,
    id: i64,
) -> Result<String, AuthzError> {
    let item = repo.get_content(kind, id).await?.ok_or(AuthzError::NotFound)?;
    Ok(item.publisher_identity().to_string())
}
