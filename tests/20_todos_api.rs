mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{authed, authed_raw, TestApp};

#[tokio::test]
async fn create_returns_populated_todo() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(authed("POST", "/todos", Some(json!({ "subject": "buy milk" }))))
        .await;

    assert_eq!(status, StatusCode::OK);
    let todo = &body["todo"];
    assert_eq!(todo["id"], 1);
    assert_eq!(todo["subject"], "buy milk");
    assert_eq!(todo["description"], "");
    assert_eq!(todo["created_at"], todo["updated_at"]);
}

#[tokio::test]
async fn create_rejects_empty_subject_and_bad_bodies() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(authed("POST", "/todos", Some(json!({ "subject": "", "description": "x" }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, _) = app.send(authed("POST", "/todos", Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(authed_raw("POST", "/todos", "{oops")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_JSON");

    // Validation failures never reach storage
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn list_defaults_to_five_newest() {
    let app = TestApp::new().await;
    for i in 1..=7 {
        app.create(&format!("todo {}", i), "").await;
    }

    let (status, body) = app.send(authed("GET", "/todos", None)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["todos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![7, 6, 5, 4, 3]);
}

#[tokio::test]
async fn list_pages_with_prev_id() {
    let app = TestApp::new().await;
    for i in 1..=7 {
        app.create(&format!("todo {}", i), "").await;
    }

    let (status, body) = app.send(authed("GET", "/todos?size=2&prev_id=5", None)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["todos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 3]);

    let (status, body) = app.send(authed("GET", "/todos?prev_id=1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "todos": [] }));
}

#[tokio::test]
async fn list_rejects_non_integer_parameters() {
    let app = TestApp::new().await;

    let (status, _) = app.send(authed("GET", "/todos?size=lots", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send(authed("GET", "/todos?prev_id=abc", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.send(authed("GET", "/todos?size=1&size=2", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "BAD_REQUEST");

    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn update_replaces_fields() {
    let app = TestApp::new().await;
    let created = app.create("buy milk", "").await;

    let (status, body) = app
        .send(authed(
            "PUT",
            "/todos",
            Some(json!({ "id": 1, "subject": "buy milk", "description": "2%" })),
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["todo"]["id"], 1);
    assert_eq!(body["todo"]["description"], "2%");
    assert_eq!(body["todo"]["created_at"], created["created_at"]);
    assert_ne!(body["todo"]["updated_at"], created["updated_at"]);
}

#[tokio::test]
async fn update_validates_id_and_subject() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(authed("PUT", "/todos", Some(json!({ "subject": "no id" }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["id"].is_string());

    let (status, body) = app
        .send(authed("PUT", "/todos", Some(json!({ "id": 1, "subject": "" }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["subject"].is_string());

    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn update_of_missing_id_is_a_plain_bad_request() {
    let app = TestApp::new().await;

    let (status, _) = app
        .send(authed("PUT", "/todos", Some(json!({ "id": 99, "subject": "ghost" }))))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.calls(), 1);
}

#[tokio::test]
async fn delete_maps_outcomes() {
    let app = TestApp::new().await;
    app.create("one", "").await;
    app.create("two", "").await;

    let (status, body) = app
        .send(authed("DELETE", "/todos", Some(json!({ "ids": [1, 42] }))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, _) = app
        .send(authed("DELETE", "/todos", Some(json!({ "ids": [1, 42] }))))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(authed("DELETE", "/todos", Some(json!({ "ids": [] }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.send(authed("GET", "/todos", None)).await;
    assert_eq!(body["todos"].as_array().unwrap().len(), 1);
    assert_eq!(body["todos"][0]["subject"], "two");
}

#[tokio::test]
async fn unsupported_verb_is_method_not_allowed() {
    let app = TestApp::new().await;

    let (status, _) = app.send(authed("PATCH", "/todos", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app.send(authed("POST", "/healthz", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn buy_milk_scenario_over_http() {
    let app = TestApp::new().await;

    let created = app.create("buy milk", "").await;
    assert_eq!(created["id"], 1);

    let (_, body) = app.send(authed("GET", "/todos?size=5&prev_id=0", None)).await;
    assert_eq!(body["todos"][0], created);

    let (status, _) = app
        .send(authed(
            "PUT",
            "/todos",
            Some(json!({ "id": 1, "subject": "buy milk", "description": "2%" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(authed("DELETE", "/todos", Some(json!({ "ids": [1] }))))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(authed("PUT", "/todos", Some(json!({ "id": 1, "subject": "buy milk" }))))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
