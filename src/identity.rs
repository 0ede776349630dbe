use crate::{
    error::{AuthzError, StoreError},
    models::{AdminAccount, UserAccount},
    repository::Repository,
};

/// Prefix marking an administrator identity: `admin_<username>`.
pub const ADMIN_PREFIX: &str = "admin_";

/// Identity
///
/// Shape of a caller-asserted identity string. The two namespaces are told apart
/// purely by the prefix; nothing validates that an external identifier cannot
/// start with it, which is why user sign-up refuses such identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity<'a> {
    Admin { username: &'a str },
    User { external_id: &'a str },
}

impl<'a> Identity<'a> {
    pub fn classify(raw: &'a str) -> Result<Self, AuthzError> {
        if raw.is_empty() {
            return Err(AuthzError::EmptyIdentity);
        }
        Ok(match raw.strip_prefix(ADMIN_PREFIX) {
            Some(username) => Identity::Admin { username },
            None => Identity::User { external_id: raw },
        })
    }

    pub fn is_admin_shaped(raw: &str) -> bool {
        raw.starts_with(ADMIN_PREFIX)
    }
}

pub fn admin_identity(username: &str) -> String {
    format!("{ADMIN_PREFIX}{username}")
}

/// ResolvedAccount
///
/// The account an identity points at, from whichever table it lives in.
#[derive(Debug, Clone)]
pub enum ResolvedAccount {
    Admin(AdminAccount),
    User(UserAccount),
}

impl ResolvedAccount {
    pub fn role(&self) -> &str {
        match self {
            ResolvedAccount::Admin(a) => &a.role,
            ResolvedAccount::User(u) => &u.role,
        }
    }

    pub fn nickname(&self) -> &str {
        match self {
            ResolvedAccount::Admin(a) => &a.nickname,
            ResolvedAccount::User(u) => &u.nickname,
        }
    }
}

/// Looks up the account behind `identity`.
///
/// `Ok(None)` is an ordinary outcome (unknown admin username, never-logged-in user);
/// callers decide what it means. Only store failures are errors.
pub async fn resolve(
    repo: &dyn Repository,
    identity: Identity<'_>,
) -> Result<Option<ResolvedAccount>, StoreError> {
    match identity {
        Identity::Admin { username } => Ok(repo
            .get_admin_by_username(username)
            .await?
            .map(ResolvedAccount::Admin)),
        Identity::User { external_id } => Ok(repo
            .get_user_by_identity(external_id)
            .await?
            .map(ResolvedAccount::User)),
    }
}

/// `classify` followed by `resolve`.
pub async fn resolve_raw(
    repo: &dyn Repository,
    raw: &str,
) -> Result<Option<ResolvedAccount>, AuthzError> {
    let identity = Identity::classify(raw)?;
    Ok(resolve(repo, identity).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[test]
    fn classify_splits_on_prefix() {
        assert_eq!(
            Identity::classify("admin_root").unwrap(),
            Identity::Admin { username: "root" }
        );
        assert_eq!(
            Identity::classify("wx_abc").unwrap(),
            Identity::User { external_id: "wx_abc" }
        );
        // The bare prefix still classifies as an admin with an empty username.
        assert_eq!(
            Identity::classify("admin_").unwrap(),
            Identity::Admin { username: "" }
        );
        assert!(matches!(Identity::classify(""), Err(AuthzError::EmptyIdentity)));
    }

    #[tokio::test]
    async fn resolves_both_namespaces() {
        let repo = MemoryRepository::new();
        repo.insert_admin("root", "admin");
        repo.get_or_create_user("wx_abc", None, None).await.unwrap();

        let admin = resolve_raw(&repo, "admin_root").await.unwrap();
        assert!(matches!(admin, Some(ResolvedAccount::Admin(a)) if a.username == "root"));

        let user = resolve_raw(&repo, "wx_abc").await.unwrap();
        assert!(matches!(user, Some(ResolvedAccount::User(u)) if u.identity == "wx_abc"));
    }

    #[tokio::test]
    async fn unknown_identities_are_not_errors() {
        let repo = MemoryRepository::new();
        assert!(resolve_raw(&repo, "admin_ghost").await.unwrap().is_none());
        assert!(resolve_raw(&repo, "wx_ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn repeated_resolution_yields_the_same_snapshot() {
        let repo = MemoryRepository::new();
        repo.get_or_create_user("wx_abc", Some("Li"), None).await.unwrap();

        let first = resolve_raw(&repo, "wx_abc").await.unwrap();
        let second = resolve_raw(&repo, "wx_abc").await.unwrap();
        match (first, second) {
            (Some(ResolvedAccount::User(a)), Some(ResolvedAccount::User(b))) => assert_eq!(a, b),
            other => panic!("unexpected resolution {other:?}"),
        }
    }
}
