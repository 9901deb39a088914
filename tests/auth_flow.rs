mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{body_to_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn register_login_and_lookup() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "alice",
                "password": "s3cret",
                "role": "student",
                "name": "Alice Lin",
                "email": "alice@campus.test",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["success"], json!(true));
    let user_id = body["data"]["user_id"].as_str().unwrap().to_string();

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "alice", "password": "s3cret" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["user"]["username"], json!("alice"));
    assert_eq!(body["user"]["role"], json!("student"));
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().is_some());

    let response = app.get(&format!("/api/auth/user/{user_id}"), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["data"]["name"], json!("Alice Lin"));

    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_rejected() -> Result<()> {
    let app = TestApp::new().await?;
    app.insert_user("bob", "pw-one", "student").await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "bob",
                "password": "pw-two",
                "role": "student",
                "name": "Other Bob",
                "email": "bob2@campus.test",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("username already exists"));

    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user() -> Result<()> {
    let app = TestApp::new().await?;
    app.insert_user("carol", "right-pw", "teacher").await?;

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "carol", "password": "wrong-pw" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "nobody", "password": "whatever" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .post_json(
            "/api/auth/login",
            &json!({ "username": "", "password": "" }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn register_rejects_unknown_role() -> Result<()> {
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "dave",
                "password": "pw",
                "role": "wizard",
                "name": "Dave",
                "email": "dave@campus.test",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn teacher_directory_lists_only_teachers() -> Result<()> {
    let app = TestApp::new().await?;
    let teacher_id = app.insert_user("prof_zhang", "pw", "teacher").await?;
    app.insert_user("student_wu", "pw", "student").await?;

    let response = app.get("/api/auth/teachers", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    let teachers = body["data"].as_array().unwrap();
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0]["id"], serde_json::json!(teacher_id));

    let response = app
        .get(&format!("/api/auth/teacher/{teacher_id}"), None)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    // a student id is not a teacher
    let student_lookup = app
        .get("/api/auth/teacher/not-a-teacher", None)
        .await?;
    assert_eq!(student_lookup.status(), StatusCode::NOT_FOUND);

    Ok(())
}
