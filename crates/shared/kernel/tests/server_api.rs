#![cfg(feature = "server")]

use axum::extract::FromRequestParts;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use fhub_database::Database;
use fhub_kernel::domain::config::ApiConfig;
use fhub_kernel::domain::registry::{FeatureSlice, InitializedSlice};
use fhub_kernel::domain::capabilities::{Role, Tier};
use fhub_kernel::security::auth::{AuthUser, issue_token};
use fhub_kernel::security::guards::feature_enabled;
use fhub_kernel::security::membership::MembershipResolver;
use fhub_kernel::security::site::SiteResolver;
use fhub_kernel::server::error::ApiError;
use fhub_kernel::server::state::{ApiState, ApiStateError};
use std::any::Any;

#[test]
fn error_variants_map_to_statuses() {
    let cases = [
        (ApiError::not_found("page"), StatusCode::NOT_FOUND),
        (
            ApiError::Forbidden { message: "nope".into(), context: None },
            StatusCode::FORBIDDEN,
        ),
        (
            ApiError::Unauthorized { message: "who".into(), context: None },
            StatusCode::UNAUTHORIZED,
        ),
        (
            ApiError::Validation { message: "bad".into(), context: None },
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            ApiError::Conflict { message: "dup".into(), context: None },
            StatusCode::CONFLICT,
        ),
        (
            ApiError::Internal { message: "boom".into(), context: None },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, expected) in cases {
        assert_eq!(error.status(), expected);
        assert_eq!(error.into_response().status(), expected);
    }
}

#[tokio::test]
async fn internal_errors_are_opaque_on_the_wire() {
    let error = ApiError::Internal { message: "secret detail".into(), context: None };
    let response = error.into_response();

    let bytes = axum::body::to_bytes(response.into_body(), 4096).await.expect("body");
    let body = String::from_utf8(bytes.to_vec()).expect("utf8");

    assert!(body.contains("Internal server error"));
    assert!(!body.contains("secret detail"));
}

#[test]
fn state_builder_validates_inputs() {
    let err = ApiState::builder().build().unwrap_err();
    assert!(matches!(err, ApiStateError::Validation { .. }));

    let err = ApiState::builder().config(ApiConfig::default()).build().unwrap_err();
    assert!(matches!(err, ApiStateError::Validation { .. }));
}

#[derive(Debug)]
struct FakeSlice {
    answer: u32,
}

impl FeatureSlice for FakeSlice {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[tokio::test]
async fn slice_registry_round_trip() {
    let database = Database::builder()
        .url("mem://")
        .session("test_ns", "test_db")
        .init()
        .await
        .expect("mem database");

    let state = ApiState::builder()
        .config(ApiConfig::default())
        .db(database)
        .register_slice(InitializedSlice::new(FakeSlice { answer: 42 }))
        .build()
        .expect("state");

    assert_eq!(state.get_slice::<FakeSlice>().expect("registered").answer, 42);
    assert_eq!(state.slice_names(), vec!["fake"]);

    #[derive(Debug)]
    struct Unregistered;
    impl FeatureSlice for Unregistered {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn name(&self) -> &'static str {
            "unregistered"
        }
    }

    let err = state.try_get_slice::<Unregistered>().unwrap_err();
    assert!(matches!(err, ApiStateError::MissingSlice { .. }));
}

#[tokio::test]
async fn bearer_extraction() {
    let config = ApiConfig::default();
    let token = issue_token(&config.security.jwt, "user:alice").expect("issue");

    let request = Request::builder()
        .uri("/pages")
        .header("authorization", format!("Bearer {token}"))
        .body(())
        .expect("request");
    let (mut parts, ()) = request.into_parts();

    let user = AuthUser::from_request_parts(&mut parts, &config).await.expect("extract");
    assert_eq!(user.id, "user:alice");
}

#[tokio::test]
async fn missing_and_malformed_bearer_rejected() {
    let config = ApiConfig::default();

    let request = Request::builder().uri("/pages").body(()).expect("request");
    let (mut parts, ()) = request.into_parts();
    let err = AuthUser::from_request_parts(&mut parts, &config).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/pages")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(())
        .expect("request");
    let (mut parts, ()) = request.into_parts();
    let err = AuthUser::from_request_parts(&mut parts, &config).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/pages")
        .header("authorization", "Bearer garbage")
        .body(())
        .expect("request");
    let (mut parts, ()) = request.into_parts();
    let err = AuthUser::from_request_parts(&mut parts, &config).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn membership_resolution_and_invalidation() {
    let db =
        Database::builder().url("mem://").session("fhub", "memberships").init().await.expect("db");
    db.query(
        "CREATE user:alice SET external_id = 'ext_1', email = 'alice@example.com', \
         created_at = time::now(), updated_at = time::now(); \
         CREATE site:acme SET name = 'Acme', slug = 'acme', \
         created_at = time::now(), updated_at = time::now(); \
         CREATE membership:m1 SET user = user:alice, site = site:acme, role = 'editor', \
         created_at = time::now(), updated_at = time::now();",
    )
    .await
    .expect("seed")
    .check()
    .expect("seed ok");

    let resolver = MembershipResolver::new(db.clone());

    assert_eq!(resolver.role("user:alice", "site:acme").await.expect("role"), Some(Role::Editor));
    // Bare keys hit the same cache entry.
    assert_eq!(resolver.role("alice", "acme").await.expect("role"), Some(Role::Editor));
    assert_eq!(resolver.role("user:bob", "site:acme").await.expect("role"), None);

    db.query("UPDATE membership:m1 SET role = 'owner', updated_at = time::now()")
        .await
        .expect("update")
        .check()
        .expect("update ok");

    // Stale until invalidated.
    assert_eq!(resolver.role("user:alice", "site:acme").await.expect("role"), Some(Role::Editor));
    resolver.invalidate("user:alice", "site:acme");
    assert_eq!(resolver.role("user:alice", "site:acme").await.expect("role"), Some(Role::Owner));
}

#[tokio::test]
async fn site_access_resolution_and_invalidation() {
    let db =
        Database::builder().url("mem://").session("fhub", "site_access").init().await.expect("db");
    db.query(
        "CREATE site:acme SET name = 'Acme', slug = 'acme', tier = 'pro', \
         features = { blog: { comments: true } }, \
         created_at = time::now(), updated_at = time::now();",
    )
    .await
    .expect("seed")
    .check()
    .expect("seed ok");

    let resolver = SiteResolver::new(db.clone());

    let access = resolver.access("site:acme").await.expect("access").expect("site");
    assert_eq!(access.tier, Tier::Pro);
    assert!(feature_enabled(&access.features, "blog.comments"));
    assert!(resolver.access("site:ghost").await.expect("access").is_none());

    db.query("UPDATE site:acme SET tier = 'free'").await.expect("update").check().expect("ok");

    // Bare key addresses the same cached entry; stale until invalidated.
    let cached = resolver.access("acme").await.expect("access").expect("site");
    assert_eq!(cached.tier, Tier::Pro);
    resolver.invalidate("acme");
    let fresh = resolver.access("site:acme").await.expect("access").expect("site");
    assert_eq!(fresh.tier, Tier::Free);
}
