//! Authorization decisions.
//!
//! Two independent procedures live here and share nothing but the role hierarchy:
//! `can_delete` (authorship or admin override) and `authorize_role_assignment`.
//! Neither reveals to the client why a request was refused.

use tracing::{debug, warn};

use crate::{
    error::AuthzError,
    identity::{self, Identity},
    repository::Repository,
    roles::{self, Role},
};

/// May `acting` delete content published by `publisher`?
///
/// Never fails: an empty identity, a missing account, or an unreachable store all
/// resolve to `false`. Order matters:
/// - admin-shaped: an account whose role satisfies admin wins; otherwise content
///   published under the bare username or the full identity is still self-owned.
/// - user-shaped: authorship is checked first, before touching the store, then
///   an account whose role satisfies admin.
pub async fn can_delete(repo: &dyn Repository, acting: &str, publisher: &str) -> bool {
    let identity = match Identity::classify(acting) {
        Ok(identity) => identity,
        Err(_) => {
            debug!("delete denied: empty identity");
            return false;
        }
    };

    match identity {
        Identity::Admin { username } => {
            match repo.get_admin_by_username(username).await {
                Ok(Some(admin)) if roles::satisfies(&admin.role, Role::Admin) => {
                    debug!(identity = acting, role = %admin.role, "delete allowed: admin account");
                    return true;
                }
                Ok(_) => {}
                Err(e) => warn!(identity = acting, error = %e, "admin lookup failed"),
            }
            if publisher == username || publisher == acting {
                debug!(identity = acting, "delete allowed: admin-published content");
                return true;
            }
            debug!(identity = acting, "delete denied: admin identity without rights");
            false
        }
        Identity::User { external_id } => {
            if publisher == external_id {
                debug!(identity = acting, "delete allowed: author");
                return true;
            }
            match repo.get_user_by_identity(external_id).await {
                Ok(Some(user)) if roles::satisfies(&user.role, Role::Admin) => {
                    debug!(identity = acting, role = %user.role, "delete allowed: user with admin role");
                    true
                }
                Ok(_) => {
                    debug!(identity = acting, "delete denied: not author, no admin role");
                    false
                }
                Err(e) => {
                    warn!(identity = acting, error = %e, "user lookup failed");
                    false
                }
            }
        }
    }
}

/// Coarse gate: does `acting` resolve to an account whose role satisfies admin?
pub async fn is_admin(repo: &dyn Repository, acting: &str) -> bool {
    match identity::resolve_raw(repo, acting).await {
        Ok(Some(account)) => roles::satisfies(account.role(), Role::Admin),
        Ok(None) => false,
        Err(e) => {
            debug!(identity = acting, error = %e, "admin gate denied");
            false
        }
    }
}

/// Consultations may only be published by admin-level identities.
pub async fn can_create_consultation(repo: &dyn Repository, acting: &str) -> bool {
    is_admin(repo, acting).await
}

/// Gate for changing another account's role to `target_role`.
///
/// - the acting identity must resolve to an account (`UnresolvedActor` otherwise)
/// - `target_role` must name one of the five roles
/// - `super_admin` is never assignable here
/// - `admin` may only be assigned by a `super_admin`
/// - any other role requires the actor to satisfy admin
///
/// Returns the parsed target role on success.
pub async fn authorize_role_assignment(
    repo: &dyn Repository,
    acting: &str,
    target_role: &str,
) -> Result<Role, AuthzError> {
    let actor = identity::resolve_raw(repo, acting)
        .await?
        .ok_or(AuthzError::UnresolvedActor)?;
    let actor_role = actor.role();

    let target: Role = target_role.parse()?;
    if target == Role::SuperAdmin {
        return Err(AuthzError::SuperAdminAssignment);
    }
    if target == Role::Admin && actor_role != Role::SuperAdmin.as_str() {
        return Err(AuthzError::AdminAssignmentRequiresSuperAdmin);
    }
    if !roles::satisfies(actor_role, Role::Admin) {
        return Err(AuthzError::InsufficientRole);
    }
    Ok(target)
}
