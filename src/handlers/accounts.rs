use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::info;

use super::{require_admin, required};
use crate::{
    AppState,
    auth::{self, Caller},
    error::ApiError,
    identity::{self, Identity, ResolvedAccount},
    models::{
        AdminLoginRequest, AdminLoginResponse, GrantRoleRequest, Profile, RoleChanged,
        UpdateAvatarRequest, UpdateNicknameRequest, UpdateRoleRequest, UserAccount, UserLoginRequest,
        UserPage,
    },
    permission,
    retry::execute_with_retry,
};

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

/// admin_login
///
/// [Public Route] Checks an administrator's password and returns the identity
/// string to assert on later requests. Unknown usernames and wrong passwords are
/// indistinguishable.
#[utoipa::path(
    post,
    path = "/auth/admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, ApiError> {
    let username = required(&req.username, "username")?;
    let admin = state
        .repo
        .get_admin_by_username(username)
        .await?
        .filter(|admin| auth::verify_password(&req.password, &admin.password_hash))
        .ok_or(ApiError::Unauthorized)?;

    let repo = state.repo.as_ref();
    execute_with_retry(&state.retry, "touch_admin_login", || repo.touch_admin_login(username)).await?;

    info!(username, "administrator logged in");
    Ok(Json(AdminLoginResponse {
        identity: identity::admin_identity(&admin.username),
        admin,
    }))
}

/// user_login
///
/// [Public Route] Get-or-create for an externally issued identity. Identities in
/// the administrator namespace are refused so no user row can ever shadow one.
#[utoipa::path(
    post,
    path = "/auth/user",
    request_body = UserLoginRequest,
    responses(
        (status = 200, description = "Account", body = UserAccount),
        (status = 400, description = "Invalid identity")
    )
)]
pub async fn user_login(
    State(state): State<AppState>,
    Json(req): Json<UserLoginRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let external_id = required(&req.identity, "identity")?;
    if Identity::is_admin_shaped(external_id) {
        return Err(ApiError::BadRequest("identity is reserved".into()));
    }

    let repo = state.repo.as_ref();
    let nickname = req.nickname.as_deref();
    let avatar = req.avatar.as_deref();
    let user = execute_with_retry(&state.retry, "get_or_create_user", || {
        repo.get_or_create_user(external_id, nickname, avatar)
    })
    .await?;

    info!(identity = external_id, user_id = user.id, "user logged in");
    Ok(Json(user))
}

/// get_me
///
/// [Authenticated Route] The account behind the caller's identity.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "No account for this identity")
    )
)]
pub async fn get_me(caller: Caller, State(state): State<AppState>) -> Result<Json<Profile>, ApiError> {
    let account = identity::resolve_raw(state.repo.as_ref(), caller.as_str())
        .await?
        .ok_or(ApiError::NotFound("account"))?;

    Ok(Json(match account {
        ResolvedAccount::Admin(admin) => Profile::Admin(admin),
        ResolvedAccount::User(user) => Profile::User(user),
    }))
}

/// update_nickname
///
/// [Authenticated Route] Renames the caller's user account.
#[utoipa::path(
    put,
    path = "/me/nickname",
    request_body = UpdateNicknameRequest,
    responses((status = 200, description = "Updated", body = UserAccount))
)]
pub async fn update_nickname(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<UpdateNicknameRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let nickname = required(&req.nickname, "nickname")?;
    let repo = state.repo.as_ref();
    let identity = caller.as_str();

    let updated = execute_with_retry(&state.retry, "update_nickname", || {
        repo.update_user_nickname(identity, nickname)
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("account"));
    }
    let user = repo.get_user_by_identity(identity).await?.ok_or(ApiError::NotFound("account"))?;
    Ok(Json(user))
}

/// update_avatar
///
/// [Authenticated Route] Replaces the caller's avatar URL.
#[utoipa::path(
    put,
    path = "/me/avatar",
    request_body = UpdateAvatarRequest,
    responses((status = 200, description = "Updated", body = UserAccount))
)]
pub async fn update_avatar(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<UpdateAvatarRequest>,
) -> Result<Json<UserAccount>, ApiError> {
    let avatar = required(&req.avatar, "avatar")?;
    let repo = state.repo.as_ref();
    let identity = caller.as_str();

    let updated = execute_with_retry(&state.retry, "update_avatar", || {
        repo.update_user_avatar(identity, avatar)
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("account"));
    }
    let user = repo.get_user_by_identity(identity).await?.ok_or(ApiError::NotFound("account"))?;
    Ok(Json(user))
}

/// UserListQuery
///
/// Pagination and role filter for the admin user listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub role: Option<String>,
}

/// list_users
///
/// [Admin Route] One page of user accounts, newest first.
#[utoipa::path(
    get,
    path = "/admin/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = UserPage),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn list_users(
    caller: Caller,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserPage>, ApiError> {
    require_admin(&state, &caller).await?;

    let page = query.page.unwrap_or(1).max(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let role = query.role.as_deref().map(str::trim).filter(|r| !r.is_empty());

    let (list, total) = state.repo.list_users(page, page_size, role).await?;
    Ok(Json(UserPage {
        list,
        total,
        page,
        page_size,
    }))
}

/// update_user_role
///
/// [Admin Route] Changes a user's role by account id.
#[utoipa::path(
    post,
    path = "/admin/users/role",
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = RoleChanged),
        (status = 400, description = "Invalid role"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user_role(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<RoleChanged>, ApiError> {
    let repo = state.repo.as_ref();
    let role = permission::authorize_role_assignment(repo, caller.as_str(), &req.new_role).await?;

    let target = repo.get_user_by_id(req.user_id).await?.ok_or(ApiError::NotFound("user"))?;
    let user_id = target.id;
    let changed = execute_with_retry(&state.retry, "set_user_role", || repo.set_user_role(user_id, role)).await?;
    if !changed {
        return Err(ApiError::NotFound("user"));
    }

    info!(actor = caller.as_str(), target = %target.identity, role = %role, "role changed");
    Ok(Json(RoleChanged {
        identity: target.identity,
        nickname: target.nickname,
        new_role: role.to_string(),
    }))
}

/// grant_role
///
/// [Admin Route] Changes a user's role by external identity.
#[utoipa::path(
    post,
    path = "/admin/grant-role",
    request_body = GrantRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = RoleChanged),
        (status = 400, description = "Invalid role"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "User not found")
    )
)]
pub async fn grant_role(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<GrantRoleRequest>,
) -> Result<Json<RoleChanged>, ApiError> {
    let target_identity = required(&req.user_identity, "user_identity")?;
    let repo = state.repo.as_ref();
    let role = permission::authorize_role_assignment(repo, caller.as_str(), &req.new_role).await?;

    let target = repo
        .get_user_by_identity(target_identity)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    let changed = execute_with_retry(&state.retry, "set_user_role", || {
        repo.set_user_role_by_identity(target_identity, role)
    })
    .await?;
    if !changed {
        return Err(ApiError::NotFound("user"));
    }

    info!(actor = caller.as_str(), target = target_identity, role = %role, "role granted");
    Ok(Json(RoleChanged {
        identity: target.identity,
        nickname: target.nickname,
        new_role: role.to_string(),
    }))
}
