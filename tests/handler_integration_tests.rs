use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use regional_portal::{
    AppConfig, AppState, RetryPolicy,
    auth::{Caller, hash_password},
    content::{ContentDraft, ContentItem, ContentKind, HelpDraft, NewsDraft, PolicyDraft},
    error::ApiError,
    handlers::{
        accounts::{self, UserListQuery},
        content::{self, ContentQuery, LatestQuery},
        personal, site,
    },
    models::{
        AdminLoginRequest, Banner, CreateFeedbackRequest, GrantRoleRequest, ItemKey, ItemRef,
        PermissionCheckRequest, Profile, UpdateRoleRequest, UserLoginRequest,
    },
    repository::{MemoryRepository, Repository},
    roles::Role,
};
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::test;

// --- TEST UTILITIES ---

/// State over a shared in-memory store with an instant retry policy.
fn create_test_state(repo: Arc<MemoryRepository>) -> AppState {
    let mut state = AppState::new(repo, AppConfig::default());
    state.retry = RetryPolicy {
        max_attempts: 3,
        base_backoff: Duration::ZERO,
    };
    state
}

fn caller(identity: &str) -> Caller {
    Caller {
        identity: identity.to_string(),
    }
}

async fn seed_user(repo: &MemoryRepository, identity: &str, role: Role) {
    let user = repo.get_or_create_user(identity, None, None).await.unwrap();
    repo.set_user_role(user.id, role).await.unwrap();
}

async fn seed_policy(repo: &MemoryRepository, publisher: &str) -> i64 {
    repo.create_content(
        publisher,
        &ContentDraft::Policy(PolicyDraft {
            title: "Seed subsidy".into(),
            category: "agriculture".into(),
            ..Default::default()
        }),
    )
    .await
    .unwrap()
}

// --- CONTENT ---

#[test]
async fn test_create_content_records_caller_as_publisher() {
    let repo = Arc::new(MemoryRepository::new());
    let state = create_test_state(repo.clone());

    let (status, Json(created)) = content::create_content(
        caller("wx_abc"),
        State(state),
        Path("news".to_string()),
        Json(json!({ "title": "Harvest festival", "publisher_id": "wx_spoofed" })),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    match repo.get_content("news".parse().unwrap(), created.id).await.unwrap() {
        Some(ContentItem::News(news)) => assert_eq!(news.publisher_id, "wx_abc"),
        other => panic!("unexpected item {other:?}"),
    }
}

#[test]
async fn test_create_content_requires_title() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));

    let result = content::create_content(
        caller("wx_abc"),
        State(state),
        Path("job".to_string()),
        Json(json!({ "company": "Co-op" })),
    )
    .await;

    assert!(matches!(result, Err(ApiError::BadRequest(_))));
}

#[test]
async fn test_create_content_unknown_kind() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));

    let err = content::create_content(
        caller("wx_abc"),
        State(state),
        Path("video".to_string()),
        Json(json!({ "title": "x" })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.to_string(), "invalid content type");
}

#[test]
async fn test_consultation_create_gate() {
    let repo = Arc::new(MemoryRepository::new());
    seed_user(&repo, "wx_vip", Role::Vip).await;
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo.clone());

    let denied = content::create_content(
        caller("wx_vip"),
        State(state.clone()),
        Path("consultation".to_string()),
        Json(json!({ "title": "Irrigation quotas" })),
    )
    .await;
    assert!(matches!(denied, Err(ApiError::Forbidden)));

    let (status, _) = content::create_content(
        caller("admin_root"),
        State(state),
        Path("consultation".to_string()),
        Json(json!({ "title": "Irrigation quotas" })),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
}

#[test]
async fn test_create_content_survives_transient_contention() {
    let repo = Arc::new(MemoryRepository::new());
    repo.fail_next_writes(2);
    let state = create_test_state(repo.clone());

    let result = content::create_content(
        caller("wx_abc"),
        State(state),
        Path("help".to_string()),
        Json(json!({ "title": "Lost sheep" })),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(repo.write_attempts(), 3);
}

#[test]
async fn test_create_content_exhausted_is_unavailable() {
    let repo = Arc::new(MemoryRepository::new());
    repo.fail_next_writes(10);
    let state = create_test_state(repo.clone());

    let err = content::create_content(
        caller("wx_abc"),
        State(state),
        Path("help".to_string()),
        Json(json!({ "title": "Lost sheep" })),
    )
    .await
    .unwrap_err();

    assert_eq!(repo.write_attempts(), 3);
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], 503);
}

#[test]
async fn test_author_deletes_own_content() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    let state = create_test_state(repo.clone());

    let status = content::delete_content(caller("wx_abc"), State(state), Path(("policy".to_string(), id)))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(repo.get_content("policy".parse().unwrap(), id).await.unwrap().is_none());
}

#[test]
async fn test_stranger_cannot_delete() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    seed_user(&repo, "wx_xyz", Role::User).await;
    let state = create_test_state(repo.clone());

    let err = content::delete_content(caller("wx_xyz"), State(state), Path(("policy".to_string(), id)))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(err.to_string(), "not authorized");
    assert!(repo.get_content("policy".parse().unwrap(), id).await.unwrap().is_some());
}

#[test]
async fn test_admin_deletes_any_content() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo);

    let status = content::delete_content(caller("admin_root"), State(state), Path(("policy".to_string(), id)))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[test]
async fn test_delete_missing_content_is_not_found() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));

    let err = content::delete_content(caller("wx_abc"), State(state), Path(("policy".to_string(), 99)))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_get_content_counts_views() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    let state = create_test_state(repo);

    content::get_content(State(state.clone()), Path(("policy".to_string(), id))).await.unwrap();
    let Json(item) = content::get_content(State(state), Path(("policy".to_string(), id))).await.unwrap();

    match item {
        ContentItem::Policy(policy) => assert_eq!(policy.read_count, 2),
        other => panic!("unexpected item {other:?}"),
    }
}

#[test]
async fn test_list_content_filters() {
    let repo = Arc::new(MemoryRepository::new());
    seed_policy(&repo, "wx_abc").await;
    repo.create_content(
        "wx_abc",
        &ContentDraft::Policy(PolicyDraft {
            title: "Road repairs".into(),
            category: "transport".into(),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    let state = create_test_state(repo);

    let Json(all) = content::list_content(
        State(state.clone()),
        Path("policy".to_string()),
        Query(ContentQuery {
            category: Some("全部".into()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(all.len(), 2);

    let Json(found) = content::list_content(
        State(state),
        Path("policy".to_string()),
        Query(ContentQuery {
            keyword: Some("  ROAD ".into()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);
}

#[test]
async fn test_list_help_filters_by_urgency() {
    let repo = Arc::new(MemoryRepository::new());
    for (title, urgency) in [("Lost goat", "紧急"), ("Fence repair", "一般"), ("Flooded cellar", "紧急")] {
        repo.create_content(
            "wx_abc",
            &ContentDraft::Help(HelpDraft {
                title: title.into(),
                urgency: urgency.into(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
    }
    let state = create_test_state(repo);

    let Json(urgent) = content::list_content(
        State(state),
        Path("help".to_string()),
        Query(ContentQuery {
            urgency: Some("紧急".into()),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(urgent.len(), 2);
    assert!(urgent.iter().all(|item| item.urgency_field() == Some("紧急")));
}

#[test]
async fn test_latest_news_is_capped() {
    let repo = Arc::new(MemoryRepository::new());
    let mut newest = 0;
    for n in 0..6 {
        newest = repo
            .create_content(
                "admin_admin",
                &ContentDraft::News(NewsDraft {
                    title: format!("Bulletin {n}"),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
    }
    let state = create_test_state(repo);

    let Json(default) = content::latest_news(State(state.clone()), Query(LatestQuery::default())).await.unwrap();
    assert_eq!(default.len(), 4);
    assert_eq!(default[0].id(), newest);

    let Json(two) = content::latest_news(State(state.clone()), Query(LatestQuery { count: Some(2) })).await.unwrap();
    assert_eq!(two.len(), 2);

    let Json(all) = content::latest_news(State(state.clone()), Query(LatestQuery { count: Some(50) })).await.unwrap();
    assert_eq!(all.len(), 6);

    let Json(none) = content::latest_news(State(state), Query(LatestQuery { count: Some(-3) })).await.unwrap();
    assert!(none.is_empty());
}

#[test]
async fn test_author_updates_but_publisher_is_kept() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    let state = create_test_state(repo.clone());

    let Json(updated) = content::update_content(
        caller("wx_abc"),
        State(state),
        Path(("policy".to_string(), id)),
        Json(json!({ "title": "Seed subsidy 2025", "category": "agriculture", "publisher_id": "wx_spoofed" })),
    )
    .await
    .unwrap();

    match updated {
        ContentItem::Policy(policy) => {
            assert_eq!(policy.title, "Seed subsidy 2025");
            assert_eq!(policy.publisher_id, "wx_abc");
        }
        other => panic!("unexpected item {other:?}"),
    }
}

#[test]
async fn test_stranger_cannot_update() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    seed_user(&repo, "wx_xyz", Role::Vip).await;
    let state = create_test_state(repo.clone());

    let err = content::update_content(
        caller("wx_xyz"),
        State(state),
        Path(("policy".to_string(), id)),
        Json(json!({ "title": "Hijacked" })),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    match repo.get_content(ContentKind::Policy, id).await.unwrap() {
        Some(ContentItem::Policy(policy)) => assert_eq!(policy.title, "Seed subsidy"),
        other => panic!("unexpected item {other:?}"),
    }
}

#[test]
async fn test_admin_updates_foreign_content() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo);

    let result = content::update_content(
        caller("admin_root"),
        State(state),
        Path(("policy".to_string(), id)),
        Json(json!({ "title": "Corrected title" })),
    )
    .await;

    assert!(result.is_ok());
}

#[test]
async fn test_update_rejects_missing_and_untitled() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    let state = create_test_state(repo);

    let missing = content::update_content(
        caller("wx_abc"),
        State(state.clone()),
        Path(("policy".to_string(), id + 100)),
        Json(json!({ "title": "Ghost" })),
    )
    .await
    .unwrap_err();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let untitled = content::update_content(
        caller("wx_abc"),
        State(state),
        Path(("policy".to_string(), id)),
        Json(json!({ "title": "  " })),
    )
    .await
    .unwrap_err();
    assert_eq!(untitled.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_check_permission_reports_publisher() {
    let repo = Arc::new(MemoryRepository::new());
    let id = seed_policy(&repo, "wx_abc").await;
    let state = create_test_state(repo);

    let Json(author) = content::check_permission(
        State(state.clone()),
        Json(PermissionCheckRequest {
            identity: "wx_abc".into(),
            content_kind: "policy".into(),
            content_id: id,
        }),
    )
    .await
    .unwrap();
    assert!(author.can_delete);
    assert_eq!(author.publisher_identity, "wx_abc");

    let Json(stranger) = content::check_permission(
        State(state),
        Json(PermissionCheckRequest {
            identity: "wx_xyz".into(),
            content_kind: "policy".into(),
            content_id: id,
        }),
    )
    .await
    .unwrap();
    assert!(!stranger.can_delete);
    assert_eq!(stranger.identity, "wx_xyz");
}

#[test]
async fn test_check_permission_validates_input() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));

    let err = content::check_permission(
        State(state),
        Json(PermissionCheckRequest {
            identity: "wx_abc".into(),
            content_kind: "policy".into(),
            content_id: 0,
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
async fn test_my_published_groups_by_kind() {
    let repo = Arc::new(MemoryRepository::new());
    seed_policy(&repo, "wx_abc").await;
    seed_policy(&repo, "wx_other").await;
    let state = create_test_state(repo);

    content::create_content(
        caller("wx_abc"),
        State(state.clone()),
        Path("job".to_string()),
        Json(json!({ "title": "Tractor driver" })),
    )
    .await
    .unwrap();

    let Json(groups) = content::my_published(caller("wx_abc"), State(state)).await.unwrap();
    let kinds: Vec<&str> = groups.iter().map(|g| g.kind.as_str()).collect();
    assert_eq!(kinds, vec!["policy", "job"]);
    assert!(groups.iter().all(|g| g.items.len() == 1));
}

// --- ACCOUNTS ---

#[test]
async fn test_admin_login() {
    let repo = Arc::new(MemoryRepository::new());
    repo.provision_default_admin(&hash_password("123456").unwrap()).await.unwrap();
    let state = create_test_state(repo);

    let Json(ok) = accounts::admin_login(
        State(state.clone()),
        Json(AdminLoginRequest {
            username: "admin".into(),
            password: "123456".into(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(ok.identity, "admin_admin");
    assert_eq!(ok.admin.role, "super_admin");

    let wrong = accounts::admin_login(
        State(state),
        Json(AdminLoginRequest {
            username: "admin".into(),
            password: "nope".into(),
        }),
    )
    .await;
    assert!(matches!(wrong, Err(ApiError::Unauthorized)));
}

#[test]
async fn test_user_login_rejects_admin_namespace() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));

    let result = accounts::user_login(
        State(state),
        Json(UserLoginRequest {
            identity: "admin_root".into(),
            ..Default::default()
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError::BadRequest(_))));
}

#[test]
async fn test_user_login_then_profile() {
    let repo = Arc::new(MemoryRepository::new());
    let state = create_test_state(repo);

    let Json(user) = accounts::user_login(
        State(state.clone()),
        Json(UserLoginRequest {
            identity: "wx_abc".into(),
            nickname: Some("Li".into()),
            avatar: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(user.role, "user");

    let Json(profile) = accounts::get_me(caller("wx_abc"), State(state.clone())).await.unwrap();
    assert!(matches!(profile, Profile::User(u) if u.nickname == "Li"));

    let missing = accounts::get_me(caller("wx_ghost"), State(state)).await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

#[test]
async fn test_list_users_requires_admin() {
    let repo = Arc::new(MemoryRepository::new());
    seed_user(&repo, "wx_vip", Role::Vip).await;
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo);

    let denied = accounts::list_users(caller("wx_vip"), State(state.clone()), Query(UserListQuery::default())).await;
    assert!(matches!(denied, Err(ApiError::Forbidden)));

    let Json(page) = accounts::list_users(caller("admin_root"), State(state), Query(UserListQuery::default()))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!((page.page, page.page_size), (1, 20));
}

#[test]
async fn test_list_users_far_past_the_last_page() {
    let repo = Arc::new(MemoryRepository::new());
    seed_user(&repo, "wx_abc", Role::User).await;
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo);

    let Json(page) = accounts::list_users(
        caller("admin_root"),
        State(state),
        Query(UserListQuery {
            page: Some(i64::MAX),
            page_size: Some(100),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert!(page.list.is_empty());
    assert_eq!(page.total, 1);
}

#[test]
async fn test_only_super_admin_grants_admin() {
    let repo = Arc::new(MemoryRepository::new());
    repo.insert_admin("admin", "super_admin");
    repo.insert_admin("root", "admin");
    seed_user(&repo, "wx_abc", Role::User).await;
    let state = create_test_state(repo.clone());

    let escalation = accounts::grant_role(
        caller("admin_root"),
        State(state.clone()),
        Json(GrantRoleRequest {
            user_identity: "wx_abc".into(),
            new_role: "admin".into(),
        }),
    )
    .await;
    assert!(matches!(escalation, Err(ApiError::Forbidden)));

    let Json(changed) = accounts::grant_role(
        caller("admin_admin"),
        State(state),
        Json(GrantRoleRequest {
            user_identity: "wx_abc".into(),
            new_role: "admin".into(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(changed.new_role, "admin");
    assert_eq!(repo.get_user_by_identity("wx_abc").await.unwrap().unwrap().role, "admin");
}

#[test]
async fn test_update_user_role_by_id() {
    let repo = Arc::new(MemoryRepository::new());
    repo.insert_admin("root", "admin");
    let user = repo.get_or_create_user("wx_abc", None, None).await.unwrap();
    let state = create_test_state(repo.clone());

    let Json(changed) = accounts::update_user_role(
        caller("admin_root"),
        State(state.clone()),
        Json(UpdateRoleRequest {
            user_id: user.id,
            new_role: "banned".into(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(changed.identity, "wx_abc");

    let invalid = accounts::update_user_role(
        caller("admin_root"),
        State(state.clone()),
        Json(UpdateRoleRequest {
            user_id: user.id,
            new_role: "moderator".into(),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let missing = accounts::update_user_role(
        caller("admin_root"),
        State(state),
        Json(UpdateRoleRequest {
            user_id: 9999,
            new_role: "vip".into(),
        }),
    )
    .await;
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

// --- PERSONAL LISTS ---

#[test]
async fn test_favorites_upsert_and_remove() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));
    let item = ItemRef {
        item_kind: "news".into(),
        item_id: 7,
        title: "Harvest".into(),
        image: String::new(),
    };

    personal::add_favorite(caller("wx_abc"), State(state.clone()), Json(item.clone())).await.unwrap();
    personal::add_favorite(caller("wx_abc"), State(state.clone()), Json(item)).await.unwrap();

    let Json(favorites) = personal::list_favorites(caller("wx_abc"), State(state.clone())).await.unwrap();
    assert_eq!(favorites.len(), 1);

    let key = ItemKey {
        item_kind: "news".into(),
        item_id: 7,
    };
    let status = personal::remove_favorite(caller("wx_abc"), State(state.clone()), Json(key.clone()))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let again = personal::remove_favorite(caller("wx_abc"), State(state), Json(key)).await;
    assert!(matches!(again, Err(ApiError::NotFound(_))));
}

#[test]
async fn test_history_moves_revisited_item_to_front() {
    let state = create_test_state(Arc::new(MemoryRepository::new()));
    for id in [1, 2, 1] {
        personal::record_history(
            caller("wx_abc"),
            State(state.clone()),
            Json(ItemRef {
                item_kind: "job".into(),
                item_id: id,
                ..Default::default()
            }),
        )
        .await
        .unwrap();
    }

    let Json(history) = personal::list_history(caller("wx_abc"), State(state.clone())).await.unwrap();
    let ids: Vec<i64> = history.iter().map(|h| h.item_id).collect();
    assert_eq!(ids, vec![1, 2]);

    personal::clear_history(caller("wx_abc"), State(state.clone())).await.unwrap();
    let Json(history) = personal::list_history(caller("wx_abc"), State(state)).await.unwrap();
    assert!(history.is_empty());
}

// --- SITE ---

#[test]
async fn test_feedback_flow() {
    let repo = Arc::new(MemoryRepository::new());
    repo.get_or_create_user("wx_abc", Some("Li"), None).await.unwrap();
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo);

    let (status, Json(created)) = site::submit_feedback(
        caller("wx_abc"),
        State(state.clone()),
        Json(CreateFeedbackRequest {
            feedback_type: "bug".into(),
            content: "Map does not load".into(),
            contact: String::new(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let denied = site::list_feedback(caller("wx_abc"), State(state.clone())).await;
    assert!(matches!(denied, Err(ApiError::Forbidden)));

    site::mark_feedback_read(caller("admin_root"), State(state.clone()), Path(created.id))
        .await
        .unwrap();
    let Json(feedback) = site::list_feedback(caller("admin_root"), State(state)).await.unwrap();
    assert_eq!(feedback[0].nickname, "Li");
    assert_eq!(feedback[0].status, "read");
}

#[test]
async fn test_banners_default_then_replaced() {
    let repo = Arc::new(MemoryRepository::new());
    repo.insert_admin("root", "admin");
    let state = create_test_state(repo);

    let Json(defaults) = site::get_banners(State(state.clone())).await.unwrap();
    assert_eq!(defaults, site::default_banners());
    assert_eq!(defaults.len(), 3);

    let custom = vec![Banner {
        url: "https://cdn.example/river.png".into(),
        title: "River".into(),
    }];
    let denied = site::put_banners(caller("wx_abc"), State(state.clone()), Json(custom.clone())).await;
    assert!(matches!(denied, Err(ApiError::Forbidden)));

    site::put_banners(caller("admin_root"), State(state.clone()), Json(custom.clone()))
        .await
        .unwrap();
    let Json(stored) = site::get_banners(State(state)).await.unwrap();
    assert_eq!(stored, custom);
}
