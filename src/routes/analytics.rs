use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{AnalyticsEvent, NewAnalyticsEvent},
    response::ApiResponse,
    schema::{queue_analytics, services},
    state::AppState,
};

/// Aggregates derived by scanning the last-24-hours event window in memory.
/// Recomputed from scratch on every read; there is no incremental state.
#[derive(Debug, Serialize)]
pub struct ServiceAnalytics {
    pub events: Vec<AnalyticsEvent>,
    pub total_events: usize,
    pub avg_wait_time: i64,
    pub peak_queue_length: i32,
    pub peak_time: Option<String>,
}

pub fn record_event(
    conn: &mut SqliteConnection,
    service_id: &str,
    event_type: &str,
    queue_length: i32,
    avg_wait_time: i32,
) -> AppResult<String> {
    let event = NewAnalyticsEvent {
        id: Uuid::new_v4().to_string(),
        service_id: service_id.to_string(),
        event_type: event_type.to_string(),
        queue_length,
        avg_wait_time,
        timestamp: Utc::now().naive_utc(),
    };

    diesel::insert_into(queue_analytics::table)
        .values(&event)
        .execute(conn)?;

    Ok(event.id)
}

pub fn compute_service_analytics(
    conn: &mut SqliteConnection,
    service_id: &str,
) -> AppResult<ServiceAnalytics> {
    let cutoff = Utc::now().naive_utc() - Duration::days(1);

    let events: Vec<AnalyticsEvent> = queue_analytics::table
        .filter(queue_analytics::service_id.eq(service_id))
        .filter(queue_analytics::timestamp.gt(cutoff))
        .order(queue_analytics::timestamp.desc())
        .load(conn)?;

    Ok(ServiceAnalytics {
        total_events: events.len(),
        avg_wait_time: mean_wait(&events),
        peak_queue_length: peak_queue(&events),
        peak_time: peak_time(&events),
        events,
    })
}

fn mean_wait(events: &[AnalyticsEvent]) -> i64 {
    if events.is_empty() {
        return 0;
    }
    let total: i64 = events.iter().map(|e| e.avg_wait_time as i64).sum();
    (total as f64 / events.len() as f64).round() as i64
}

fn peak_queue(events: &[AnalyticsEvent]) -> i32 {
    events.iter().map(|e| e.queue_length).max().unwrap_or(0)
}

/// Time of day of the busiest non-empty snapshot, or None when the queue
/// never had anyone waiting inside the window.
fn peak_time(events: &[AnalyticsEvent]) -> Option<String> {
    events
        .iter()
        .filter(|e| e.queue_length > 0)
        .max_by_key(|e| e.queue_length)
        .map(|e| e.timestamp.format("%H:%M:%S").to_string())
}

/// GET /api/analytics/:service_id
pub async fn service_analytics(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<ServiceAnalytics>>> {
    let mut conn = state.db()?;
    let report = compute_service_analytics(&mut conn, &service_id)?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/analytics — per-service reports for every known service.
pub async fn all_analytics(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<HashMap<String, ServiceAnalytics>>>> {
    let mut conn = state.db()?;

    let ids: Vec<String> = services::table.select(services::id).load(&mut conn)?;
    let mut result = HashMap::with_capacity(ids.len());
    for service_id in ids {
        let report = compute_service_analytics(&mut conn, &service_id)?;
        result.insert(service_id, report);
    }

    Ok(Json(ApiResponse::ok(result)))
}

#[derive(Deserialize)]
pub struct LogEventRequest {
    pub service_id: String,
    pub event_type: String,
    pub queue_length: i32,
    pub avg_wait_time: i32,
}

#[derive(Serialize)]
pub struct LogEventResponse {
    pub id: String,
}

/// POST /api/analytics/log-event
pub async fn log_event(
    State(state): State<AppState>,
    Json(payload): Json<LogEventRequest>,
) -> AppResult<Json<ApiResponse<LogEventResponse>>> {
    if payload.service_id.trim().is_empty() || payload.event_type.trim().is_empty() {
        return Err(AppError::bad_request("service_id and event_type required"));
    }

    let mut conn = state.db()?;
    let id = record_event(
        &mut conn,
        &payload.service_id,
        &payload.event_type,
        payload.queue_length,
        payload.avg_wait_time,
    )?;

    Ok(Json(ApiResponse::ok(LogEventResponse { id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(queue_length: i32, avg_wait_time: i32, second: u32) -> AnalyticsEvent {
        AnalyticsEvent {
            id: format!("e-{second}"),
            service_id: "svc".to_string(),
            event_type: "customer-served".to_string(),
            queue_length,
            avg_wait_time,
            timestamp: chrono::NaiveDate::from_ymd_opt(2025, 8, 10)
                .unwrap()
                .and_hms_opt(12, 30, second)
                .unwrap(),
        }
    }

    #[test]
    fn mean_wait_rounds_to_nearest() {
        let events = vec![event(1, 300, 0), event(2, 601, 1)];
        assert_eq!(mean_wait(&events), 451);
        assert_eq!(mean_wait(&[]), 0);
    }

    #[test]
    fn peak_queue_takes_maximum() {
        let events = vec![event(1, 0, 0), event(5, 0, 1), event(3, 0, 2)];
        assert_eq!(peak_queue(&events), 5);
        assert_eq!(peak_queue(&[]), 0);
    }

    #[test]
    fn peak_time_ignores_empty_snapshots() {
        let events = vec![event(0, 0, 0), event(4, 0, 7), event(2, 0, 9)];
        assert_eq!(peak_time(&events).as_deref(), Some("12:30:07"));

        let idle = vec![event(0, 0, 0), event(0, 0, 1)];
        assert_eq!(peak_time(&idle), None);
    }
}
