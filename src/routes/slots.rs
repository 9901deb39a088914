use std::collections::HashMap;

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
    live::LiveEvent,
    models::{NewSlotBooking, NewTimeSlot, OwnerKind, SlotBooking, SlotOwner, TimeSlot},
    response::ApiResponse,
    schema::{services, slot_bookings, time_slots, users},
    state::AppState,
};

pub const SLOT_AVAILABLE: &str = "available";
pub const SLOT_BOOKED: &str = "booked";
pub const BOOKING_CONFIRMED: &str = "confirmed";
pub const BOOKING_CANCELLED: &str = "cancelled";

#[derive(Deserialize)]
pub struct SlotWindow {
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_capacity")]
    pub capacity: i32,
}

fn default_capacity() -> i32 {
    1
}

#[derive(Deserialize)]
pub struct CreateSlotsRequest {
    pub owner: SlotOwner,
    pub date: String,
    pub slots: Vec<SlotWindow>,
}

/// POST /api/slots — one row per requested slot, for a service desk or a
/// teacher (the tagged owner replaces the historical dual-column pattern).
pub async fn create_slots(
    State(state): State<AppState>,
    Json(payload): Json<CreateSlotsRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Vec<String>>>)> {
    if payload.owner.id.trim().is_empty() || payload.date.trim().is_empty() {
        return Err(AppError::bad_request("owner and date required"));
    }
    if payload.slots.is_empty() {
        return Err(AppError::bad_request("at least one slot required"));
    }

    let mut conn = state.db()?;
    let mut created = Vec::with_capacity(payload.slots.len());

    for window in &payload.slots {
        if window.capacity < 1 {
            return Err(AppError::bad_request("capacity must be at least 1"));
        }
        let slot = NewTimeSlot {
            id: Uuid::new_v4().to_string(),
            owner_kind: payload.owner.kind.as_str().to_string(),
            owner_id: payload.owner.id.clone(),
            date: payload.date.clone(),
            start_time: window.start_time.clone(),
            end_time: window.end_time.clone(),
            capacity: window.capacity,
            booked_count: 0,
            status: SLOT_AVAILABLE.to_string(),
        };
        diesel::insert_into(time_slots::table)
            .values(&slot)
            .execute(&mut conn)?;
        created.push(slot.id);
    }

    tracing::info!(
        owner_kind = payload.owner.kind.as_str(),
        owner_id = %payload.owner.id,
        date = %payload.date,
        count = created.len(),
        "created time slots"
    );

    state.live.publish(LiveEvent::slot_updated(
        None,
        Some(payload.owner.clone()),
        "slots-created",
    ));

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// GET /api/slots/available/:owner_kind/:owner_id/:date
pub async fn available_slots(
    State(state): State<AppState>,
    Path((owner_kind, owner_id, date)): Path<(String, String, String)>,
) -> AppResult<Json<ApiResponse<Vec<TimeSlot>>>> {
    let Some(kind) = OwnerKind::parse(&owner_kind) else {
        return Err(AppError::bad_request("owner kind must be service or teacher"));
    };

    let mut conn = state.db()?;
    let slots = load_available_slots(&mut conn, kind, &owner_id, &date)?;
    Ok(Json(ApiResponse::ok(slots)))
}

pub fn load_available_slots(
    conn: &mut SqliteConnection,
    kind: OwnerKind,
    owner_id: &str,
    date: &str,
) -> AppResult<Vec<TimeSlot>> {
    let slots: Vec<TimeSlot> = time_slots::table
        .filter(time_slots::owner_kind.eq(kind.as_str()))
        .filter(time_slots::owner_id.eq(owner_id))
        .filter(time_slots::date.eq(date))
        .filter(time_slots::status.eq(SLOT_AVAILABLE))
        .order(time_slots::start_time.asc())
        .load(conn)?;
    Ok(slots)
}

#[derive(Deserialize)]
pub struct BookSlotRequest {
    pub slot_id: String,
    pub user_id: String,
    #[serde(default)]
    pub purpose: String,
}

#[derive(Serialize)]
pub struct BookSlotResponse {
    pub booking_id: String,
    pub slot: TimeSlot,
}

/// POST /api/slots/book
pub async fn book_slot(
    State(state): State<AppState>,
    Json(payload): Json<BookSlotRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookSlotResponse>>)> {
    if payload.slot_id.trim().is_empty() || payload.user_id.trim().is_empty() {
        return Err(AppError::bad_request("slot_id and user_id required"));
    }

    let mut conn = state.db()?;
    let (booking_id, slot) = book_slot_tx(
        &mut conn,
        &payload.slot_id,
        &payload.user_id,
        "student",
        &payload.purpose,
        None,
    )?;

    state
        .live
        .publish(LiveEvent::slot_updated(Some(&payload.slot_id), None, "booked"));

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(BookSlotResponse { booking_id, slot })),
    ))
}

/// Availability check, booking insert, and counter increment in a single
/// transaction. `owner` narrows the lookup to slots of one provider (the
/// teacher-to-teacher path); the returned slot reflects the post-booking row.
pub fn book_slot_tx(
    conn: &mut SqliteConnection,
    slot_id: &str,
    booked_by: &str,
    booked_as: &str,
    purpose: &str,
    owner: Option<&SlotOwner>,
) -> AppResult<(String, TimeSlot)> {
    conn.transaction::<_, AppError, _>(|conn| {
        let mut query = time_slots::table
            .filter(time_slots::id.eq(slot_id))
            .filter(time_slots::status.eq(SLOT_AVAILABLE))
            .into_boxed();
        if let Some(owner) = owner {
            query = query
                .filter(time_slots::owner_kind.eq(owner.kind.as_str()))
                .filter(time_slots::owner_id.eq(&owner.id));
        }

        let slot: Option<TimeSlot> = query.first(conn).optional()?;
        let Some(mut slot) = slot else {
            return Err(AppError::bad_request("slot not available"));
        };

        if slot.booked_count >= slot.capacity {
            return Err(AppError::bad_request("slot is full"));
        }

        let booking = NewSlotBooking {
            id: Uuid::new_v4().to_string(),
            slot_id: slot_id.to_string(),
            booked_by: booked_by.to_string(),
            booked_as: booked_as.to_string(),
            purpose: purpose.to_string(),
            status: BOOKING_CONFIRMED.to_string(),
        };
        diesel::insert_into(slot_bookings::table)
            .values(&booking)
            .execute(conn)?;

        let new_count = slot.booked_count + 1;
        let new_status = if new_count >= slot.capacity {
            SLOT_BOOKED
        } else {
            SLOT_AVAILABLE
        };
        diesel::update(time_slots::table.find(slot_id))
            .set((
                time_slots::booked_count.eq(new_count),
                time_slots::status.eq(new_status),
            ))
            .execute(conn)?;

        slot.booked_count = new_count;
        slot.status = new_status.to_string();
        Ok((booking.id, slot))
    })
}

#[derive(Deserialize)]
pub struct CancelBookingRequest {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct CancelBookingResponse {
    pub message: &'static str,
}

/// POST /api/slots/cancel/:booking_id
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(payload): Json<CancelBookingRequest>,
) -> AppResult<Json<ApiResponse<CancelBookingResponse>>> {
    if payload.user_id.trim().is_empty() {
        return Err(AppError::bad_request("user_id required"));
    }

    let mut conn = state.db()?;
    cancel_booking_tx(&mut conn, &booking_id, &payload.user_id, None)?;

    state
        .live
        .publish(LiveEvent::slot_updated(None, None, "cancelled"));

    Ok(Json(ApiResponse::ok(CancelBookingResponse {
        message: "booking cancelled",
    })))
}

/// Mark cancelled, decrement the slot counter (floored at zero) and reset the
/// slot to available, in one transaction. The booking must belong to
/// `user_id`; `booked_as` additionally restricts the teacher-booking variant.
pub fn cancel_booking_tx(
    conn: &mut SqliteConnection,
    booking_id: &str,
    user_id: &str,
    booked_as: Option<&str>,
) -> AppResult<()> {
    conn.transaction::<_, AppError, _>(|conn| {
        let mut query = slot_bookings::table
            .filter(slot_bookings::id.eq(booking_id))
            .filter(slot_bookings::booked_by.eq(user_id))
            .into_boxed();
        if let Some(role) = booked_as {
            query = query.filter(slot_bookings::booked_as.eq(role));
        }

        let booking: Option<SlotBooking> = query.first(conn).optional()?;
        let Some(booking) = booking else {
            return Err(AppError::not_found("booking not found"));
        };

        diesel::update(slot_bookings::table.find(&booking.id))
            .set(slot_bookings::status.eq(BOOKING_CANCELLED))
            .execute(conn)?;

        let slot: TimeSlot = time_slots::table.find(&booking.slot_id).first(conn)?;
        let new_count = (slot.booked_count - 1).max(0);
        diesel::update(time_slots::table.find(&booking.slot_id))
            .set((
                time_slots::booked_count.eq(new_count),
                time_slots::status.eq(SLOT_AVAILABLE),
            ))
            .execute(conn)?;

        Ok(())
    })
}

/// Booking joined with its slot; provider/requester names resolved from the
/// tagged owner instead of the old COALESCE-over-two-columns query.
#[derive(Serialize)]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: SlotBooking,
    pub slot: TimeSlot,
    pub provider_name: Option<String>,
}

/// GET /api/slots/bookings/user/:user_id — active bookings made by a user.
pub async fn user_bookings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<BookingView>>>> {
    let mut conn = state.db()?;

    let rows: Vec<(SlotBooking, TimeSlot)> = slot_bookings::table
        .inner_join(time_slots::table)
        .filter(slot_bookings::booked_by.eq(&user_id))
        .filter(slot_bookings::status.ne(BOOKING_CANCELLED))
        .order((time_slots::date.desc(), time_slots::start_time.desc()))
        .load(&mut conn)?;

    let names = resolve_owner_names(&mut conn, rows.iter().map(|(_, slot)| slot))?;
    let views = rows
        .into_iter()
        .map(|(booking, slot)| {
            let provider_name = names.get(&(slot.owner_kind.clone(), slot.owner_id.clone())).cloned();
            BookingView {
                booking,
                slot,
                provider_name,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

fn resolve_owner_names<'a>(
    conn: &mut SqliteConnection,
    slots: impl Iterator<Item = &'a TimeSlot>,
) -> AppResult<HashMap<(String, String), String>> {
    let mut service_ids = Vec::new();
    let mut teacher_ids = Vec::new();
    for slot in slots {
        match OwnerKind::parse(&slot.owner_kind) {
            Some(OwnerKind::Service) => service_ids.push(slot.owner_id.clone()),
            Some(OwnerKind::Teacher) => teacher_ids.push(slot.owner_id.clone()),
            None => {}
        }
    }

    let mut names = HashMap::new();
    if !service_ids.is_empty() {
        let rows: Vec<(String, String)> = services::table
            .filter(services::id.eq_any(&service_ids))
            .select((services::id, services::name))
            .load(conn)?;
        for (id, name) in rows {
            names.insert(("service".to_string(), id), name);
        }
    }
    if !teacher_ids.is_empty() {
        let rows: Vec<(String, String)> = users::table
            .filter(users::id.eq_any(&teacher_ids))
            .select((users::id, users::name))
            .load(conn)?;
        for (id, name) in rows {
            names.insert(("teacher".to_string(), id), name);
        }
    }
    Ok(names)
}

/// Appointment on a teacher's slot, with the requester's identity attached.
#[derive(Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub booking: SlotBooking,
    pub slot: TimeSlot,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
}

/// GET /api/slots/appointments/:teacher_id — confirmed bookings on the
/// teacher's own slots.
pub async fn teacher_appointments(
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<AppointmentView>>>> {
    let mut conn = state.db()?;

    let rows: Vec<(SlotBooking, TimeSlot)> = slot_bookings::table
        .inner_join(time_slots::table)
        .filter(time_slots::owner_kind.eq(OwnerKind::Teacher.as_str()))
        .filter(time_slots::owner_id.eq(&teacher_id))
        .filter(slot_bookings::status.eq(BOOKING_CONFIRMED))
        .order((time_slots::date.asc(), time_slots::start_time.asc()))
        .load(&mut conn)?;

    let requester_ids: Vec<String> = rows
        .iter()
        .map(|(booking, _)| booking.booked_by.clone())
        .collect();
    let requesters: HashMap<String, (String, String)> = if requester_ids.is_empty() {
        HashMap::new()
    } else {
        users::table
            .filter(users::id.eq_any(&requester_ids))
            .select((users::id, users::name, users::email))
            .load::<(String, String, String)>(&mut conn)?
            .into_iter()
            .map(|(id, name, email)| (id, (name, email)))
            .collect()
    };

    let views = rows
        .into_iter()
        .map(|(booking, slot)| {
            let requester = requesters.get(&booking.booked_by);
            AppointmentView {
                requester_name: requester.map(|(name, _)| name.clone()),
                requester_email: requester.map(|(_, email)| email.clone()),
                booking,
                slot,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(views)))
}

/// GET /api/slots/bookings/slot/:slot_id — active bookings on one slot.
pub async fn slot_bookings(
    State(state): State<AppState>,
    Path(slot_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<SlotBooking>>>> {
    let mut conn = state.db()?;

    let bookings: Vec<SlotBooking> = slot_bookings::table
        .filter(slot_bookings::slot_id.eq(&slot_id))
        .filter(slot_bookings::status.ne(BOOKING_CANCELLED))
        .order(slot_bookings::created_at.asc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(bookings)))
}
