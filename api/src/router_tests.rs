//! End-to-end tests of the router: authentication, per-field permissions,
//! error mapping and pagination, driven through `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Method, Request, StatusCode},
    Router,
};
use database::DatabaseConfig;
use relay::{encode, EntityType};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::{
    build_state,
    context::RequestContext,
    create_router,
    handlers::user_node,
    middleware_hooks::{PermissionMiddleware, API_VERSION_HEADER},
    test_data::{init_test_data, SeedData, ADMIN_TOKEN, ALICE_TOKEN, BOB_TOKEN},
    ApiConfig, AppState,
};

const MISSING_ULID: &str = "01HZX3N4V8M6Q2K9T7R5W1Y0PB";

struct TestApp {
    _dir: TempDir,
    router: Router,
    state: AppState,
    seed: SeedData,
}

async fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let db = database::initialize_database(DatabaseConfig::new_with_path(
        dir.path().join("api.db"),
    ))
    .await
    .unwrap();
    let seed = init_test_data(&db).await.unwrap().unwrap();

    let state = build_state(Arc::clone(&db), ApiConfig::new().with_test_data(false)).unwrap();
    let router = create_router(state.clone());
    TestApp {
        _dir: dir,
        router,
        state,
        seed,
    }
}

impl TestApp {
    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, value)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(Method::GET, uri, token, None).await;
        (status, body)
    }

    /// Node id of one of Alice's todos.
    async fn alice_todo_id(&self) -> String {
        let (_, body) = self.get("/api/v1/todos?first=1", Some(ALICE_TOKEN)).await;
        body["edges"][0]["node"]["id"].as_str().unwrap().to_string()
    }
}

fn user_id(user: &database::User) -> String {
    encode(EntityType::User, &user.id)
}

#[tokio::test]
async fn test_health_is_public_and_versioned() {
    let app = setup().await;
    let (status, headers, body) = app.send(Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["database"]["connected"].as_bool().unwrap());
    assert_eq!(
        headers.get(API_VERSION_HEADER).unwrap(),
        env!("CARGO_PKG_VERSION")
    );
}

#[tokio::test]
async fn test_owner_reads_todo_and_stranger_is_forbidden() {
    let app = setup().await;
    let id = app.alice_todo_id().await;
    let uri = format!("/api/v1/todos/{id}");

    let (status, body) = app.get(&uri, Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["owner_id"], user_id(&app.seed.alice).as_str());

    let (status, body) = app.get(&uri, Some(BOB_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
    assert_eq!(body["error"]["message"], "Forbidden");

    let (status, _) = app.get(&uri, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_todo_is_not_found_only_for_admins() {
    let app = setup().await;
    let uri = format!("/api/v1/todos/{}", encode(EntityType::Todo, MISSING_ULID));

    let (status, body) = app.get(&uri, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    // A regular user cannot tell a missing todo from someone else's.
    let (status, _) = app.get(&uri, Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_authentication() {
    let app = setup().await;

    let (status, body) = app.get("/api/v1/me", Some("not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    // No header means guest, and guests have no profile.
    let (status, body) = app.get("/api/v1/me", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, body) = app.get("/api/v1/me", Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["email"], "alice@example.com");
}

#[tokio::test]
async fn test_malformed_ids_are_bad_input() {
    let app = setup().await;

    let (status, body) = app.get("/api/v1/todos/garbage", Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_USER_INPUT");

    // A user id where a todo id is expected
    let uri = format!("/api/v1/todos/{}", user_id(&app.seed.alice));
    let (status, _) = app.get(&uri, Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/v1/todos/garbage", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_todo_pagination() {
    let app = setup().await;

    let (status, first) = app.get("/api/v1/todos?first=3", Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["total_count"], 4);
    assert_eq!(first["edges"].as_array().unwrap().len(), 3);
    assert_eq!(first["page_info"]["has_next_page"], true);
    assert_eq!(first["page_info"]["has_previous_page"], false);

    let cursor = first["page_info"]["end_cursor"].as_str().unwrap();
    let (status, second) = app
        .get(&format!("/api/v1/todos?first=3&after={cursor}"), Some(ALICE_TOKEN))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["edges"].as_array().unwrap().len(), 1);
    assert_eq!(second["page_info"]["has_next_page"], false);
    assert_eq!(second["page_info"]["has_previous_page"], true);

    let cursor = second["page_info"]["start_cursor"].as_str().unwrap();
    let (_, back) = app
        .get(&format!("/api/v1/todos?last=2&before={cursor}"), Some(ALICE_TOKEN))
        .await;
    let back_ids: Vec<&Value> = back["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| &edge["node"]["id"])
        .collect();
    let first_ids: Vec<&Value> = first["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| &edge["node"]["id"])
        .collect();
    assert_eq!(back_ids, first_ids[1..].to_vec());
}

#[tokio::test]
async fn test_pagination_errors_are_bad_input() {
    let app = setup().await;

    for query in [
        "first=1000",
        "first=-1",
        "first=1&last=1",
        "first=1&before=abc",
        "first=1&after=!!!",
        "first=ten",
        "",
    ] {
        let uri = format!("/api/v1/todos?{query}");
        let (status, body) = app.get(&uri, Some(ALICE_TOKEN)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "query {query:?}");
        assert_eq!(body["error"]["code"], "BAD_USER_INPUT");
    }
}

#[tokio::test]
async fn test_todo_mutations() {
    let app = setup().await;

    let (status, _, created) = app
        .send(
            Method::POST,
            "/api/v1/todos",
            Some(BOB_TOKEN),
            Some(json!({ "title": "Oil the chain" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["completed"], false);
    assert_eq!(created["owner_id"], user_id(&app.seed.bob).as_str());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, _, done) = app
        .send(Method::POST, &format!("/api/v1/todos/{id}/complete"), Some(BOB_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["completed"], true);

    let (status, _, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/todos/{id}/update"),
            Some(ALICE_TOKEN),
            Some(json!({ "title": "Mine now" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, updated) = app
        .send(
            Method::POST,
            &format!("/api/v1/todos/{id}/update"),
            Some(BOB_TOKEN),
            Some(json!({ "title": "Oil and clean the chain", "completed": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Oil and clean the chain");
    assert_eq!(updated["completed"], false);

    let (status, _, deleted) = app
        .send(Method::POST, &format!("/api/v1/todos/{id}/delete"), Some(BOB_TOKEN), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], id.as_str());

    let (status, _) = app.get(&format!("/api/v1/todos/{id}"), Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guest_cannot_create_todos() {
    let app = setup().await;
    let (status, _, _) = app
        .send(
            Method::POST,
            "/api/v1/todos",
            None,
            Some(json!({ "title": "Sneaky" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blank_title_is_bad_input() {
    let app = setup().await;
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/v1/todos",
            Some(ALICE_TOKEN),
            Some(json!({ "title": "   " })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_user_queries() {
    let app = setup().await;
    let alice = user_id(&app.seed.alice);

    let (status, _) = app.get(&format!("/api/v1/users/{alice}"), Some(BOB_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get(&format!("/api/v1/users/{alice}"), Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, _) = app.get("/api/v1/users?first=10", Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get("/api/v1/users?first=2", Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 3);
    assert_eq!(body["edges"].as_array().unwrap().len(), 2);
    assert!(body["edges"][0]["node"]["email"].is_string());
}

#[tokio::test]
async fn test_user_todos_follow_parent_ownership() {
    let app = setup().await;
    let uri = format!("/api/v1/users/{}/todos?first=10", user_id(&app.seed.alice));

    let (status, body) = app.get(&uri, Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 4);

    let (status, _) = app.get(&uri, Some(BOB_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.get(&uri, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 4);
}

#[tokio::test]
async fn test_email_is_hidden_from_strangers() {
    let app = setup().await;
    let bob = RequestContext::new(app.seed.bob.actor());
    let mw = PermissionMiddleware::new(&app.state, &bob);

    let node = user_node(&mw, app.seed.alice.clone()).await.unwrap();
    assert_eq!(node.name, "Alice");
    assert_eq!(node.email, None);

    let own = user_node(&mw, app.seed.bob.clone()).await.unwrap();
    assert_eq!(own.email.as_deref(), Some("bob@example.com"));
}

#[tokio::test]
async fn test_node_lookup() {
    let app = setup().await;
    let todo = app.alice_todo_id().await;

    let (status, body) = app.get(&format!("/api/v1/node/{todo}"), Some(ALICE_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["__typename"], "Todo");

    let (status, _) = app.get(&format!("/api/v1/node/{todo}"), Some(BOB_TOKEN)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.get(&format!("/api/v1/node/{todo}"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let me = user_id(&app.seed.bob);
    let (status, body) = app.get(&format!("/api/v1/node/{me}"), Some(BOB_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["__typename"], "User");
    assert_eq!(body["email"], "bob@example.com");
}

#[tokio::test]
async fn test_update_me() {
    let app = setup().await;
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/v1/me",
            Some(ALICE_TOKEN),
            Some(json!({ "name": "Alice Liddell" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Liddell");
    assert_eq!(body["email"], "alice@example.com");

    // Bob's address is taken
    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/v1/me",
            Some(ALICE_TOKEN),
            Some(json!({ "email": "bob@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_USER_INPUT");
    assert_eq!(
        body["error"]["message"],
        "A record with this value already exists"
    );
    let message = body["error"]["message"].as_str().unwrap();
    assert!(!message.contains("UNIQUE"));
    assert!(!message.contains("users.email"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_input() {
    let app = setup().await;

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/v1/todos",
            Some(ALICE_TOKEN),
            Some(json!({ "title": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_USER_INPUT");

    let (status, _, body) = app
        .send(
            Method::POST,
            "/api/v1/me",
            Some(ALICE_TOKEN),
            Some(json!({ "email": ["alice@example.com"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_USER_INPUT");
}

#[tokio::test]
async fn test_delete_user_is_admin_only() {
    let app = setup().await;
    let bob = user_id(&app.seed.bob);
    let uri = format!("/api/v1/users/{bob}");
    let delete = format!("{uri}/delete");

    let (status, _, _) = app.send(Method::POST, &delete, Some(ALICE_TOKEN), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = app.send(Method::POST, &delete, Some(ADMIN_TOKEN), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.get(&uri, Some(ADMIN_TOKEN)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob's token went with him
    let (status, _) = app.get("/api/v1/me", Some(BOB_TOKEN)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = setup().await;
    let (status, body) = app.get("/api/v1/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/todos"].is_object());
}
