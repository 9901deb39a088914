mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{body_to_json, TestApp};
use serde_json::json;

async fn create_teacher_slot(app: &TestApp, teacher_id: &str, date: &str) -> Result<String> {
    let response = app
        .post_json(
            "/api/slots",
            &json!({
                "owner": { "kind": "teacher", "id": teacher_id },
                "date": date,
                "slots": [{ "start_time": "14:00", "end_time": "14:30" }],
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await?;
    Ok(body["data"][0].as_str().unwrap().to_string())
}

#[tokio::test]
async fn colleague_booking_round_trip() -> Result<()> {
    let app = TestApp::new().await?;
    let colleague_id = app.insert_user("prof_zhou", "pw", "teacher").await?;
    app.insert_user("prof_qian", "pw", "teacher").await?;
    let token = app.login_token("prof_qian", "pw").await?;

    let slot_id = create_teacher_slot(&app, &colleague_id, "2025-09-10").await?;

    let response = app
        .get(
            &format!("/api/teacher-bookings/colleague-slots/{colleague_id}/2025-09-10"),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let response = app
        .post_json(
            "/api/teacher-bookings/book",
            &json!({
                "slot_id": slot_id,
                "colleague_id": colleague_id,
                "purpose": "curriculum sync",
            }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await?;
    let booking_id = body["data"]["booking_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["slot"]["status"], json!("booked"));

    let response = app.get("/api/teacher-bookings/mine", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await?;
    let mine = body["data"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["booked_as"], json!("teacher"));
    assert_eq!(mine[0]["colleague_name"], json!("prof_zhou account"));

    let response = app
        .post_json(
            &format!("/api/teacher-bookings/cancel/{booking_id}"),
            &json!({}),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/teacher-bookings/mine", Some(&token)).await?;
    let body = body_to_json(response.into_body()).await?;
    assert!(body["data"].as_array().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn teacher_endpoints_reject_other_roles() -> Result<()> {
    let app = TestApp::new().await?;
    let colleague_id = app.insert_user("prof_wu", "pw", "teacher").await?;
    app.insert_user("student_he", "pw", "student").await?;
    let student_token = app.login_token("student_he", "pw").await?;

    let response = app
        .get(
            &format!("/api/teacher-bookings/colleague-slots/{colleague_id}/2025-09-11"),
            Some(&student_token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/teacher-bookings/mine", None).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn colleague_lookup_requires_a_teacher_target() -> Result<()> {
    let app = TestApp::new().await?;
    app.insert_user("prof_xu", "pw", "teacher").await?;
    let student_id = app.insert_user("student_gao", "pw", "student").await?;
    let token = app.login_token("prof_xu", "pw").await?;

    let response = app
        .get(
            &format!("/api/teacher-bookings/colleague-slots/{student_id}/2025-09-12"),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn colleague_booking_only_matches_teacher_slots() -> Result<()> {
    let app = TestApp::new().await?;
    app.insert_user("prof_feng", "pw", "teacher").await?;
    let token = app.login_token("prof_feng", "pw").await?;

    // a service-owned slot is invisible to the teacher booking path
    let service_id = app.create_service("Counseling", 900).await?;
    let response = app
        .post_json(
            "/api/slots",
            &json!({
                "owner": { "kind": "service", "id": service_id },
                "date": "2025-09-13",
                "slots": [{ "start_time": "09:00", "end_time": "09:30" }],
            }),
            None,
        )
        .await?;
    let body = body_to_json(response.into_body()).await?;
    let slot_id = body["data"][0].as_str().unwrap().to_string();

    let response = app
        .post_json(
            "/api/teacher-bookings/book",
            &json!({ "slot_id": slot_id, "colleague_id": service_id }),
            Some(&token),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["error"], json!("slot not available"));

    Ok(())
}
