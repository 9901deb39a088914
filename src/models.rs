use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::*;

/// A slot belongs to exactly one provider. The historical schema carried
/// parallel nullable `service_id`/`teacher_id` columns reconciled with
/// COALESCE at query time; here the relationship is a single tagged pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Service,
    Teacher,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Service => "service",
            OwnerKind::Teacher => "teacher",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "service" => Some(OwnerKind::Service),
            "teacher" => Some(OwnerKind::Teacher),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotOwner {
    pub kind: OwnerKind,
    pub id: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = services)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub booths: i32,
    pub avg_service_time: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = services)]
pub struct NewService {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub booths: i32,
    pub avg_service_time: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = service_booths)]
#[diesel(belongs_to(Service, foreign_key = service_id))]
pub struct Booth {
    pub id: String,
    pub service_id: String,
    pub booth_number: i32,
    pub status: String,
    pub current_user_id: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = service_booths)]
pub struct NewBooth {
    pub id: String,
    pub service_id: String,
    pub booth_number: i32,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = queue_entries)]
#[diesel(belongs_to(Service, foreign_key = service_id))]
pub struct QueueEntry {
    pub id: String,
    pub service_id: String,
    pub user_id: String,
    pub position: i32,
    pub status: String,
    pub joined_at: NaiveDateTime,
    pub served_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = queue_entries)]
pub struct NewQueueEntry {
    pub id: String,
    pub service_id: String,
    pub user_id: String,
    pub position: i32,
    pub status: String,
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = time_slots)]
pub struct TimeSlot {
    pub id: String,
    pub owner_kind: String,
    pub owner_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    pub booked_count: i32,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = time_slots)]
pub struct NewTimeSlot {
    pub id: String,
    pub owner_kind: String,
    pub owner_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub capacity: i32,
    pub booked_count: i32,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = slot_bookings)]
#[diesel(belongs_to(TimeSlot, foreign_key = slot_id))]
pub struct SlotBooking {
    pub id: String,
    pub slot_id: String,
    pub booked_by: String,
    pub booked_as: String,
    pub purpose: String,
    pub status: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = slot_bookings)]
pub struct NewSlotBooking {
    pub id: String,
    pub slot_id: String,
    pub booked_by: String,
    pub booked_as: String,
    pub purpose: String,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = queue_analytics)]
pub struct AnalyticsEvent {
    pub id: String,
    pub service_id: String,
    pub event_type: String,
    pub queue_length: i32,
    pub avg_wait_time: i32,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = queue_analytics)]
pub struct NewAnalyticsEvent {
    pub id: String,
    pub service_id: String,
    pub event_type: String,
    pub queue_length: i32,
    pub avg_wait_time: i32,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = service_stats)]
pub struct DailyStats {
    pub id: String,
    pub service_id: String,
    pub date: String,
    pub total_served: i32,
    pub avg_wait_time: i32,
    pub peak_queue_length: i32,
    pub peak_time: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = service_stats)]
pub struct NewDailyStats {
    pub id: String,
    pub service_id: String,
    pub date: String,
    pub total_served: i32,
    pub avg_wait_time: i32,
    pub peak_queue_length: i32,
    pub peak_time: Option<String>,
}
