use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    live::LiveEvent,
    models::{DailyStats, NewDailyStats, QueueEntry},
    queue::{self, STATUS_SERVED, STATUS_WAITING},
    response::ApiResponse,
    routes::analytics::{self, ServiceAnalytics},
    schema::{queue_entries, service_stats},
    state::AppState,
};

/// POST /api/admin/serve-next/:service_id
///
/// Dequeue-then-renumber runs inside one transaction so a concurrent join or
/// leave can never observe a half-renumbered sequence.
pub async fn serve_next(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<Option<QueueEntry>>>> {
    let mut conn = state.db()?;
    let now = Utc::now().naive_utc();

    let served: Option<QueueEntry> = conn.transaction::<_, AppError, _>(|conn| {
        let entry: Option<QueueEntry> = queue_entries::table
            .filter(queue_entries::service_id.eq(&service_id))
            .filter(queue_entries::status.eq(STATUS_WAITING))
            .order(queue_entries::position.asc())
            .first(conn)
            .optional()?;

        let Some(mut entry) = entry else {
            return Ok(None);
        };

        diesel::update(queue_entries::table.find(&entry.id))
            .set((
                queue_entries::status.eq(STATUS_SERVED),
                queue_entries::served_at.eq(now),
            ))
            .execute(conn)?;

        queue::renumber_waiting(conn, &service_id)?;

        entry.status = STATUS_SERVED.to_string();
        entry.served_at = Some(now);
        Ok(Some(entry))
    })?;

    let status = queue::queue_status(&mut conn, &service_id)?;

    if let Some(entry) = &served {
        tracing::info!(service_id = %service_id, user_id = %entry.user_id, "served next in queue");
        analytics::record_event(
            &mut conn,
            &service_id,
            "customer-served",
            status.queue_length as i32,
            status.avg_wait_time as i32,
        )?;
    }

    state
        .live
        .publish(LiveEvent::queue_updated(&service_id, status, "customer-served"));

    Ok(Json(ApiResponse::ok(served)))
}

#[derive(Serialize)]
pub struct ClearServedResponse {
    pub cleared: usize,
}

/// POST /api/admin/clear-served/:service_id
pub async fn clear_served(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<ClearServedResponse>>> {
    let mut conn = state.db()?;

    let cleared = diesel::delete(
        queue_entries::table
            .filter(queue_entries::service_id.eq(&service_id))
            .filter(queue_entries::status.eq(STATUS_SERVED)),
    )
    .execute(&mut conn)?;

    tracing::info!(service_id = %service_id, cleared, "cleared served entries");

    let status = queue::queue_status(&mut conn, &service_id)?;
    state
        .live
        .publish(LiveEvent::queue_updated(&service_id, status, "cleared-served"));

    Ok(Json(ApiResponse::ok(ClearServedResponse { cleared })))
}

#[derive(Serialize)]
pub struct QueueDetails {
    pub waiting: Vec<QueueEntry>,
    pub served: Vec<QueueEntry>,
    pub total_waiting: usize,
    pub total_served: usize,
}

/// GET /api/admin/queue-details/:service_id — waiting and served lists.
pub async fn queue_details(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<QueueDetails>>> {
    let mut conn = state.db()?;

    let entries: Vec<QueueEntry> = queue_entries::table
        .filter(queue_entries::service_id.eq(&service_id))
        .order(queue_entries::position.asc())
        .load(&mut conn)?;

    let (waiting, served): (Vec<QueueEntry>, Vec<QueueEntry>) = entries
        .into_iter()
        .partition(|entry| entry.status == STATUS_WAITING);

    Ok(Json(ApiResponse::ok(QueueDetails {
        total_waiting: waiting.len(),
        total_served: served.len(),
        waiting,
        served,
    })))
}

/// GET /api/admin/service-stats/:service_id — derived 24h analytics.
pub async fn service_stats(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<ServiceAnalytics>>> {
    let mut conn = state.db()?;
    let report = analytics::compute_service_analytics(&mut conn, &service_id)?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/admin/daily-stats/:service_id/:date
pub async fn get_daily_stats(
    State(state): State<AppState>,
    Path((service_id, date)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Option<DailyStats>>>> {
    let mut conn = state.db()?;

    let stats: Option<DailyStats> = service_stats::table
        .filter(service_stats::service_id.eq(&service_id))
        .filter(service_stats::date.eq(&date))
        .first(&mut conn)
        .optional()?;

    Ok(Json(ApiResponse::ok(stats)))
}

#[derive(Deserialize)]
pub struct SaveDailyStatsRequest {
    pub service_id: String,
    pub date: String,
    pub total_served: i32,
    pub avg_wait_time: i32,
    pub peak_queue_length: i32,
    pub peak_time: Option<String>,
}

#[derive(Serialize)]
pub struct SaveDailyStatsResponse {
    pub id: String,
}

/// POST /api/admin/daily-stats — upsert the summary row for (service, date).
pub async fn save_daily_stats(
    State(state): State<AppState>,
    Json(payload): Json<SaveDailyStatsRequest>,
) -> AppResult<Json<ApiResponse<SaveDailyStatsResponse>>> {
    if payload.service_id.trim().is_empty() || payload.date.trim().is_empty() {
        return Err(AppError::bad_request("service_id and date required"));
    }

    let new_stats = NewDailyStats {
        id: Uuid::new_v4().to_string(),
        service_id: payload.service_id.clone(),
        date: payload.date.clone(),
        total_served: payload.total_served,
        avg_wait_time: payload.avg_wait_time,
        peak_queue_length: payload.peak_queue_length,
        peak_time: payload.peak_time,
    };

    let mut conn = state.db()?;
    conn.transaction::<_, AppError, _>(|conn| {
        diesel::delete(
            service_stats::table
                .filter(service_stats::service_id.eq(&payload.service_id))
                .filter(service_stats::date.eq(&payload.date)),
        )
        .execute(conn)?;

        diesel::insert_into(service_stats::table)
            .values(&new_stats)
            .execute(conn)?;
        Ok(())
    })?;

    Ok(Json(ApiResponse::ok(SaveDailyStatsResponse {
        id: new_stats.id,
    })))
}
