use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Booth, NewBooth, NewService, Service},
    response::ApiResponse,
    schema::{service_booths, services},
    state::AppState,
};

#[derive(Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_booths")]
    pub booths: i32,
    #[serde(default = "default_avg_service_time")]
    pub avg_service_time: i32,
}

fn default_booths() -> i32 {
    1
}

fn default_avg_service_time() -> i32 {
    300
}

#[derive(Serialize)]
pub struct CreateServiceResponse {
    pub service_id: String,
}

#[derive(Serialize)]
pub struct ServiceDetail {
    #[serde(flatten)]
    pub service: Service,
    pub booth_list: Vec<Booth>,
}

pub async fn create_service(
    State(state): State<AppState>,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<CreateServiceResponse>>)> {
    if payload.name.trim().is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    if payload.booths < 1 {
        return Err(AppError::bad_request("booths must be at least 1"));
    }

    let mut conn = state.db()?;
    let service_id = insert_service(
        &mut conn,
        &payload.name,
        payload.description.as_deref(),
        payload.booths,
        payload.avg_service_time,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CreateServiceResponse { service_id })),
    ))
}

/// Inserts the service and its booth rows in one transaction; also used by
/// the startup seeding path.
pub fn insert_service(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
    booths: i32,
    avg_service_time: i32,
) -> AppResult<String> {
    let new_service = NewService {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        description: description.map(str::to_string),
        booths,
        avg_service_time,
    };

    conn.transaction::<_, AppError, _>(|conn| {
        diesel::insert_into(services::table)
            .values(&new_service)
            .execute(conn)?;

        for number in 1..=booths {
            let booth = NewBooth {
                id: Uuid::new_v4().to_string(),
                service_id: new_service.id.clone(),
                booth_number: number,
                status: "available".to_string(),
            };
            diesel::insert_into(service_booths::table)
                .values(&booth)
                .execute(conn)?;
        }

        Ok(())
    })?;

    Ok(new_service.id)
}

pub async fn list_services(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Service>>>> {
    let mut conn = state.db()?;

    let list: Vec<Service> = services::table.order(services::name.asc()).load(&mut conn)?;
    Ok(Json(ApiResponse::ok(list)))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> AppResult<Json<ApiResponse<ServiceDetail>>> {
    let mut conn = state.db()?;

    let service: Option<Service> = services::table
        .find(&service_id)
        .first(&mut conn)
        .optional()?;
    let Some(service) = service else {
        return Err(AppError::not_found("service not found"));
    };

    let booth_list: Vec<Booth> = service_booths::table
        .filter(service_booths::service_id.eq(&service_id))
        .order(service_booths::booth_number.asc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(ServiceDetail {
        service,
        booth_list,
    })))
}
