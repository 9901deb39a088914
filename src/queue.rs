//! Queue-state helpers shared by the route layer and the live broadcast path.

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serde::Serialize;

use crate::models::{QueueEntry, Service};
use crate::schema::{queue_entries, services};

pub const STATUS_WAITING: &str = "waiting";
pub const STATUS_SERVED: &str = "served";

/// Aggregate snapshot broadcast after every queue mutation and returned by
/// the status endpoint. The wait estimate is a plain product of queue length
/// and the service's average duration, not a statistical estimator.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queue: Vec<QueueEntry>,
    pub queue_length: i64,
    pub avg_wait_time: i64,
    pub service: Option<Service>,
}

impl QueueStatus {
    fn empty(service: Option<Service>) -> Self {
        Self {
            queue: Vec::new(),
            queue_length: 0,
            avg_wait_time: 0,
            service,
        }
    }
}

/// Ordered waiting list plus the estimated wait for one service. An unknown
/// service yields an empty status with a null service rather than an error.
pub fn queue_status(conn: &mut SqliteConnection, service_id: &str) -> QueryResult<QueueStatus> {
    let service: Option<Service> = services::table
        .find(service_id)
        .first(conn)
        .optional()?;

    let Some(service) = service else {
        return Ok(QueueStatus::empty(None));
    };

    let waiting: Vec<QueueEntry> = queue_entries::table
        .filter(queue_entries::service_id.eq(service_id))
        .filter(queue_entries::status.eq(STATUS_WAITING))
        .order(queue_entries::position.asc())
        .load(conn)?;

    let queue_length = waiting.len() as i64;
    let avg_wait_time = queue_length * service.avg_service_time as i64;

    Ok(QueueStatus {
        queue: waiting,
        queue_length,
        avg_wait_time,
        service: Some(service),
    })
}

/// Next position to hand out on join: current waiting count plus one.
pub fn next_position(conn: &mut SqliteConnection, service_id: &str) -> QueryResult<i32> {
    let waiting: i64 = queue_entries::table
        .filter(queue_entries::service_id.eq(service_id))
        .filter(queue_entries::status.eq(STATUS_WAITING))
        .count()
        .get_result(conn)?;
    Ok(waiting as i32 + 1)
}

/// Rewrite the positions of all waiting entries densely from 1, ordered by
/// join time (position breaks same-timestamp ties). Runs after every dequeue
/// to restore the contiguous 1..N invariant; `leave_queue` deliberately does
/// not call this.
pub fn renumber_waiting(conn: &mut SqliteConnection, service_id: &str) -> QueryResult<usize> {
    let ids: Vec<String> = queue_entries::table
        .filter(queue_entries::service_id.eq(service_id))
        .filter(queue_entries::status.eq(STATUS_WAITING))
        .order((queue_entries::joined_at.asc(), queue_entries::position.asc()))
        .select(queue_entries::id)
        .load(conn)?;

    for (index, entry_id) in ids.iter().enumerate() {
        diesel::update(queue_entries::table.find(entry_id))
            .set(queue_entries::position.eq(index as i32 + 1))
            .execute(conn)?;
    }

    Ok(ids.len())
}
