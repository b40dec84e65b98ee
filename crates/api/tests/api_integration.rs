//! API integration tests.
//!
//! These tests drive the router over a mock database. Results are queued in
//! the order the handlers issue their statements.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use blog_api::{AppState, router};
use blog_common::config::{
    AdminConfig, BlogConfig, Config, DatabaseConfig, LoggingConfig, ServerConfig,
};
use blog_db::entities::{category, comment, post, post_category, post_reaction};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::Value;
use tower::ServiceExt;

const TOKEN: &str = "test-admin-token";

/// Create a test configuration.
fn create_test_config(admin_token: Option<&str>) -> Config {
    Config {
        server: ServerConfig::default(),
        database: DatabaseConfig {
            url: "postgres://localhost/blog_test".to_string(),
            max_connections: 5,
            min_connections: 1,
        },
        admin: AdminConfig {
            token: admin_token.map(str::to_string),
        },
        blog: BlogConfig::default(),
        logging: LoggingConfig::default(),
    }
}

fn create_app(db: DatabaseConnection, admin_token: Option<&str>) -> Router {
    let state = AppState::new(Arc::new(db), &create_test_config(admin_token));
    router().with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn db_with_exec(rows_affected: u64) -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }])
        .into_connection()
}

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn create_test_post(id: i64, likes: i32, dislikes: i32) -> post::Model {
    let now = Utc::now().into();
    post::Model {
        id,
        title: format!("Post {id}"),
        body: vec!["word"; 400].join(" "),
        image: None,
        likes,
        dislikes,
        views: 1,
        featured: false,
        created_on: now,
        last_modified: now,
    }
}

fn exec_ok(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

/// Mock results for one counted view of post `id`, with no categories,
/// comments, reaction or site categories.
fn view_results(db: MockDatabase, id: i64) -> MockDatabase {
    db.append_exec_results([exec_ok(1)])
        .append_query_results([[create_test_post(id, 2, 1)]])
        .append_query_results([Vec::<(post_category::Model, Option<category::Model>)>::new()])
        .append_query_results([Vec::<comment::Model>::new()])
        .append_query_results([Vec::<post_reaction::Model>::new()])
        .append_query_results([Vec::<category::Model>::new()])
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(Request::get("/no/such/page").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_live_search_short_query_is_empty() {
    for uri in ["/ajax/search?q=a", "/blog/ajax/search?q=%20x%20", "/ajax/search"] {
        let app = create_app(empty_db(), None);

        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let body = body_json(response).await;
        assert_eq!(body["results"], Value::Array(vec![]), "{uri}");
    }
}

#[tokio::test]
async fn test_non_numeric_post_id_is_not_found() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(Request::get("/post/abc").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_missing_post_is_not_found() {
    // The view counter UPDATE touches no row.
    let app = create_app(db_with_exec(0), None);

    let response = app
        .oneshot(Request::get("/ajax/post/999").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_post_requires_is_like() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(json_post("/ajax/like-post", r#"{"post_id": 1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_like_post_requires_post_id() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(json_post("/ajax/like-post", r#"{"post_id": "x", "is_like": true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(json_post("/ajax/add-comment", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_add_comment_missing_post_id_checked_first() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(json_post("/ajax/add-comment", r#"{"author": "A", "body": ""}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_add_comment_short_author_is_validation_error() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(json_post(
            "/ajax/add-comment",
            r#"{"post_id": "1", "author": "A", "body": "Hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["error"]["message"],
        "Name must be at least 2 characters"
    );
}

#[tokio::test]
async fn test_add_comment_bad_email_is_validation_error() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(json_post(
            "/blog/ajax/add-comment",
            r#"{"post_id": 1, "author": "Ada", "body": "Hello", "email": "nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["message"], "Invalid email address");
}

#[tokio::test]
async fn test_admin_locked_without_configured_token() {
    let app = create_app(empty_db(), None);

    let response = app
        .oneshot(
            Request::get("/admin/categories")
                .header(header::AUTHORIZATION, "Bearer anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_rejects_wrong_or_missing_token() {
    for auth in [Some("Bearer wrong"), Some(TOKEN), None] {
        let app = create_app(empty_db(), Some(TOKEN));

        let mut request = Request::get("/admin/posts");
        if let Some(auth) = auth {
            request = request.header(header::AUTHORIZATION, auth);
        }

        let response = app
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{auth:?}");
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_admin_delete_comment() {
    let app = create_app(db_with_exec(1), Some(TOKEN));

    let response = app
        .oneshot(
            Request::delete("/admin/comments/5")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_admin_delete_missing_comment() {
    let app = create_app(db_with_exec(0), Some(TOKEN));

    let response = app
        .oneshot(
            Request::delete("/admin/comments/5")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_bulk_feature_with_no_ids() {
    let app = create_app(empty_db(), Some(TOKEN));

    let response = app
        .oneshot(
            Request::post("/admin/posts/feature")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"ids": []}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["updated"], 0);
}

#[tokio::test]
async fn test_like_post_first_reaction_is_added() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[create_test_post(1, 3, 1)]])
        .append_query_results([Vec::<post_reaction::Model>::new()])
        .append_exec_results([exec_ok(1), exec_ok(1)])
        .append_query_results([[create_test_post(1, 4, 1)]])
        .into_connection();
    let app = create_app(db, None);

    let response = app
        .oneshot(json_post("/ajax/like-post", r#"{"post_id": "1", "is_like": true}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["action"], "added");
    assert_eq!(body["likes"], 4);
    assert_eq!(body["dislikes"], 1);
    assert_eq!(body["user_reaction"], "like");
}

#[tokio::test]
async fn test_post_data_fields() {
    let db = view_results(MockDatabase::new(DatabaseBackend::Postgres), 1).into_connection();
    let app = create_app(db, None);

    let response = app
        .oneshot(
            Request::get("/ajax/post/1")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let fields = body.as_object().unwrap();
    for key in [
        "id",
        "title",
        "body",
        "image",
        "date",
        "categories",
        "comments",
        "likes",
        "dislikes",
        "views",
        "reading_time",
        "engagement_ratio",
        "user_reaction",
        "featured",
    ] {
        assert!(fields.contains_key(key), "{key}");
    }
    assert_eq!(fields.len(), 14);
    assert_eq!(body["id"], 1);
    assert_eq!(body["reading_time"], 2);
    assert_eq!(body["user_reaction"], Value::Null);
}

#[tokio::test]
async fn test_comment_form_redirects_to_post() {
    let now = Utc::now().into();
    let db = view_results(MockDatabase::new(DatabaseBackend::Postgres), 1)
        .append_query_results([[create_test_post(1, 2, 1)]])
        .append_query_results([[comment::Model {
            id: 10,
            post_id: 1,
            author: "Ada".to_string(),
            body: "Hello".to_string(),
            email: None,
            ip_address: Some("203.0.113.9".to_string()),
            is_featured: false,
            created_on: now,
        }]])
        .into_connection();
    let app = create_app(db, None);

    let response = app
        .oneshot(
            Request::post("/post/1")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::from("author=Ada&body=Hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/post/1");
}

#[tokio::test]
async fn test_admin_reactions_huge_page_is_clamped() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post_reaction::Model>::new()])
        .append_query_results([[BTreeMap::from([(
            "num_items",
            sea_orm::Value::BigInt(Some(0)),
        )])]])
        .into_connection();
    let app = create_app(db, Some(TOKEN));

    let response = app
        .oneshot(
            Request::get("/admin/reactions?page=18446744073709551615")
                .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["reactions"], Value::Array(vec![]));
    assert!(body["data"]["page"]["number"].as_u64().unwrap() <= i64::MAX as u64);
}
