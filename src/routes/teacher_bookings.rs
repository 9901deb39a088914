//! Teacher-to-teacher consultation bookings. Every endpoint here requires an
//! authenticated caller with the teacher role; the slots involved are always
//! teacher-owned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    auth::AuthenticatedUser,
    error::{AppError, AppResult},
    live::LiveEvent,
    models::{OwnerKind, SlotBooking, SlotOwner, TimeSlot},
    response::ApiResponse,
    routes::slots::{self, BOOKING_CANCELLED},
    schema::{slot_bookings, time_slots, users},
    state::AppState,
};

/// GET /api/teacher-bookings/colleague-slots/:colleague_id/:date
///
/// Open slots published by another teacher. Booking your own slot is not
/// blocked here; the original system left that to the client.
pub async fn colleague_slots(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path((colleague_id, date)): Path<(String, String)>,
) -> AppResult<Json<ApiResponse<Vec<TimeSlot>>>> {
    caller.require_role("teacher")?;

    let mut conn = state.db()?;

    let colleague: Option<String> = users::table
        .filter(users::id.eq(&colleague_id))
        .filter(users::role.eq("teacher"))
        .select(users::id)
        .first(&mut conn)
        .optional()?;
    if colleague.is_none() {
        return Err(AppError::not_found("teacher not found"));
    }

    let open = slots::load_available_slots(&mut conn, OwnerKind::Teacher, &colleague_id, &date)?;
    Ok(Json(ApiResponse::ok(open)))
}

#[derive(Deserialize)]
pub struct BookColleagueSlotRequest {
    pub slot_id: String,
    pub colleague_id: String,
    #[serde(default)]
    pub purpose: String,
}

#[derive(Serialize)]
pub struct BookColleagueSlotResponse {
    pub booking_id: String,
    pub slot: TimeSlot,
}

/// POST /api/teacher-bookings/book
pub async fn book_colleague_slot(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Json(payload): Json<BookColleagueSlotRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookColleagueSlotResponse>>)> {
    caller.require_role("teacher")?;

    if payload.slot_id.trim().is_empty() || payload.colleague_id.trim().is_empty() {
        return Err(AppError::bad_request("slot_id and colleague_id required"));
    }

    let owner = SlotOwner {
        kind: OwnerKind::Teacher,
        id: payload.colleague_id.clone(),
    };

    let mut conn = state.db()?;
    let (booking_id, slot) = slots::book_slot_tx(
        &mut conn,
        &payload.slot_id,
        &caller.user_id,
        "teacher",
        &payload.purpose,
        Some(&owner),
    )?;

    tracing::info!(
        teacher_id = %caller.user_id,
        colleague_id = %payload.colleague_id,
        slot_id = %payload.slot_id,
        "teacher booked colleague slot"
    );

    state
        .live
        .publish(LiveEvent::slot_updated(Some(&payload.slot_id), Some(owner), "booked"));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(BookColleagueSlotResponse { booking_id, slot })),
    ))
}

#[derive(Serialize)]
pub struct ColleagueBookingView {
    #[serde(flatten)]
    pub booking: SlotBooking,
    pub slot: TimeSlot,
    pub colleague_name: Option<String>,
}

/// GET /api/teacher-bookings/mine — the caller's active bookings on other
/// teachers' slots.
pub async fn my_colleague_bookings(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
) -> AppResult<Json<ApiResponse<Vec<ColleagueBookingView>>>> {
    caller.require_role("teacher")?;

    let mut conn = state.db()?;

    let rows: Vec<(SlotBooking, TimeSlot)> = slot_bookings::table
        .inner_join(time_slots::table)
        .filter(slot_bookings::booked_by.eq(&caller.user_id))
        .filter(slot_bookings::booked_as.eq("teacher"))
        .filter(slot_bookings::status.ne(BOOKING_CANCELLED))
        .filter(time_slots::owner_kind.eq(OwnerKind::Teacher.as_str()))
        .order((time_slots::date.asc(), time_slots::start_time.asc()))
        .load(&mut conn)?;

    let colleague_ids: Vec<String> = rows
        .iter()
        .map(|(_, slot)| slot.owner_id.clone())
        .collect();
    let names: std::collections::HashMap<String, String> = if colleague_ids.is_empty() {
        Default::default()
    } else {
        users::table
            .filter(users::id.eq_any(&colleague_ids))
            .select((users::id, users::name))
            .load::<(String, String)>(&mut conn)?
            .into_iter()
            .collect()
    };

    let views = rows
        .into_iter()
        .map(|(booking, slot)| {
            let colleague_name = names.get(&slot.owner_id).cloned();
            ColleagueBookingView {
                booking,
                slot,
                colleague_name,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

#[derive(Serialize)]
pub struct CancelResponse {
    pub message: &'static str,
}

/// POST /api/teacher-bookings/cancel/:booking_id
pub async fn cancel_booking(
    State(state): State<AppState>,
    caller: AuthenticatedUser,
    Path(booking_id): Path<String>,
) -> AppResult<Json<ApiResponse<CancelResponse>>> {
    caller.require_role("teacher")?;

    let mut conn = state.db()?;
    slots::cancel_booking_tx(&mut conn, &booking_id, &caller.user_id, Some("teacher"))?;

    state
        .live
        .publish(LiveEvent::slot_updated(None, None, "cancelled"));

    Ok(Json(ApiResponse::ok(CancelResponse {
        message: "booking cancelled",
    })))
}
