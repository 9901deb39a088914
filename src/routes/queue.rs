use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    live::LiveEvent,
    models::{NewQueueEntry, QueueEntry, Service},
    queue::{self, QueueStatus, STATUS_WAITING},
    response::ApiResponse,
    schema::{queue_entries, services},
    state::AppState,
};

#[derive(Deserialize)]
pub struct JoinQueueRequest {
    pub service_id: String,
    pub user_id: String,
}

#[derive(Serialize)]
pub struct JoinQueueResponse {
    pub entry_id: String,
    pub position: i32,
}

/// POST /api/queue/join
///
/// No duplicate-join guard: the same user may hold several entries in one
/// queue. Accepted behavior inherited from the original system.
pub async fn join_queue(
    State(state): State<AppState>,
    Json(payload): Json<JoinQueueRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<JoinQueueResponse>>)> {
    if payload.service_id.trim().is_empty() || payload.user_id.trim().is_empty() {
        return Err(AppError::bad_request("service_id and user_id required"));
    }

    let mut conn = state.db()?;

    let service_exists: Option<String> = services::table
        .find(&payload.service_id)
        .select(services::id)
        .first(&mut conn)
        .optional()?;
    if service_exists.is_none() {
        return Err(AppError::not_found("service not found"));
    }

    let position = queue::next_position(&mut conn, &payload.service_id)?;
    let entry = NewQueueEntry {
        id: Uuid::new_v4().to_string(),
        service_id: payload.service_id.clone(),
        user_id: payload.user_id.clone(),
        position,
        status: STATUS_WAITING.to_string(),
        joined_at: Utc::now().naive_utc(),
    };

    diesel::insert_into(queue_entries::table)
        .values(&entry)
        .execute(&mut conn)?;

    tracing::info!(
        user_id = %payload.user_id,
        service_id = %payload.service_id,
        position,
        "user joined queue"
    );

    let status = queue::queue_status(&mut conn, &payload.service_id)?;
    state.live.publish(LiveEvent::queue_updated(
        &payload.service_id,
        status,
        "user-joined",
    ));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(JoinQueueResponse {
            entry_id: entry.id,
            position,
        })),
    ))
}

/// GET /api/queue/status/:service_id
pub async fn queue_status(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<QueueStatus>>> {
    let mut conn = state.db()?;
    let status = queue::queue_status(&mut conn, &service_id)?;
    Ok(Json(ApiResponse::ok(status)))
}

/// GET /api/queue/:entry_id
pub async fn get_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> AppResult<Json<ApiResponse<QueueEntry>>> {
    let mut conn = state.db()?;

    let entry: Option<QueueEntry> = queue_entries::table
        .find(&entry_id)
        .first(&mut conn)
        .optional()?;
    let Some(entry) = entry else {
        return Err(AppError::not_found("queue entry not found"));
    };

    Ok(Json(ApiResponse::ok(entry)))
}

#[derive(Serialize)]
pub struct LeaveQueueResponse {
    pub message: &'static str,
}

/// DELETE /api/queue/:entry_id
///
/// Deletes unconditionally and does NOT renumber the remaining waiting
/// entries, so positions below the departed entry keep a gap until the next
/// dequeue. Divergent from `serve_next` on purpose; see DESIGN.md.
pub async fn leave_queue(
    State(state): State<AppState>,
    Path(entry_id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveQueueResponse>>> {
    let mut conn = state.db()?;

    let entry: Option<QueueEntry> = queue_entries::table
        .find(&entry_id)
        .first(&mut conn)
        .optional()?;

    if let Some(entry) = entry {
        diesel::delete(queue_entries::table.find(&entry_id)).execute(&mut conn)?;
        tracing::info!(entry_id = %entry_id, service_id = %entry.service_id, "user left queue");

        let status = queue::queue_status(&mut conn, &entry.service_id)?;
        state
            .live
            .publish(LiveEvent::queue_updated(&entry.service_id, status, "user-left"));
    }

    Ok(Json(ApiResponse::ok(LeaveQueueResponse {
        message: "left queue",
    })))
}

/// GET /api/queue — status snapshot for every service, keyed by service id.
pub async fn all_queues(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<HashMap<String, QueueStatus>>>> {
    let mut conn = state.db()?;

    let service_list: Vec<Service> = services::table.load(&mut conn)?;
    let mut result = HashMap::with_capacity(service_list.len());
    for service in service_list {
        let status = queue::queue_status(&mut conn, &service.id)?;
        result.insert(service.id, status);
    }

    Ok(Json(ApiResponse::ok(result)))
}
