//! HTTP-level tests for authentication enforcement.
//!
//! Every deployment and prediction endpoint requires a valid bearer
//! token; these tests verify the rejection paths, which never touch
//! the database or the compute provider.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json};
use uuid::Uuid;

/// Protected GET endpoints reject requests without an Authorization header.
#[tokio::test]
async fn missing_token_returns_401() {
    let protected = [
        "/api/v1/deployments",
        "/api/v1/deployments/00000000-0000-0000-0000-000000000000",
        "/api/v1/predictions/some-prediction-id",
        "/api/v1/predictions/some-prediction-id/stream",
    ];

    for uri in protected {
        let app = common::build_test_app(common::lazy_pool());
        let response = get(app, uri).await;
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {uri}"
        );
    }
}

/// Protected POST endpoints reject unauthenticated requests too.
#[tokio::test]
async fn missing_token_on_post_returns_401() {
    let app = common::build_test_app(common::lazy_pool());
    let body = serde_json::json!({
        "deployment_id": Uuid::nil(),
        "input": {"prompt": "x"},
    });
    let response = post_json(app, "/api/v1/predictions/run", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A non-Bearer Authorization scheme is rejected.
#[tokio::test]
async fn basic_auth_scheme_returns_401() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    let app = common::build_test_app(common::lazy_pool());
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/deployments")
                .header("authorization", "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// A garbage token fails validation with 401 and a stable error code.
#[tokio::test]
async fn invalid_token_returns_401() {
    let app = common::build_test_app(common::lazy_pool());
    let response = get_auth(app, "/api/v1/deployments", "not-a-real-token").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert!(json["error"].is_string());
}

/// A token signed with the wrong secret is rejected.
#[tokio::test]
async fn token_with_wrong_secret_returns_401() {
    use modelmart_api::auth::jwt::{generate_access_token, JwtConfig};

    let other = JwtConfig {
        secret: "some-other-secret".to_string(),
        access_token_expiry_mins: 15,
    };
    let token = generate_access_token(Uuid::new_v4(), &other).unwrap();

    let app = common::build_test_app(common::lazy_pool());
    let response = get_auth(app, "/api/v1/deployments", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// The health endpoint stays public.
#[tokio::test]
async fn health_does_not_require_auth() {
    let app = common::build_test_app(common::lazy_pool());
    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
