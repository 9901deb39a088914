use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::state::AppState;

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod health;
pub mod queue;
pub mod services;
pub mod slots;
pub mod teacher_bookings;
pub mod ws;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/user/:user_id", get(auth::get_user))
        .route("/teachers", get(auth::list_teachers))
        .route("/teacher/:teacher_id", get(auth::get_teacher));

    let services_routes = Router::new()
        .route(
            "/",
            get(services::list_services).post(services::create_service),
        )
        .route("/:service_id", get(services::get_service));

    let queue_routes = Router::new()
        .route("/", get(queue::all_queues))
        .route("/join", post(queue::join_queue))
        .route("/status/:service_id", get(queue::queue_status))
        .route(
            "/:entry_id",
            get(queue::get_entry).delete(queue::leave_queue),
        );

    let admin_routes = Router::new()
        .route("/serve-next/:service_id", post(admin::serve_next))
        .route("/clear-served/:service_id", post(admin::clear_served))
        .route("/queue-details/:service_id", get(admin::queue_details))
        .route("/service-stats/:service_id", get(admin::service_stats))
        .route(
            "/daily-stats/:service_id/:date",
            get(admin::get_daily_stats),
        )
        .route("/daily-stats", post(admin::save_daily_stats));

    let slots_routes = Router::new()
        .route("/", post(slots::create_slots))
        .route("/book", post(slots::book_slot))
        .route("/available/:owner_kind/:owner_id/:date", get(slots::available_slots))
        .route("/bookings/user/:user_id", get(slots::user_bookings))
        .route("/bookings/slot/:slot_id", get(slots::slot_bookings))
        .route("/appointments/:teacher_id", get(slots::teacher_appointments))
        .route("/cancel/:booking_id", post(slots::cancel_booking));

    let teacher_booking_routes = Router::new()
        .route(
            "/colleague-slots/:colleague_id/:date",
            get(teacher_bookings::colleague_slots),
        )
        .route("/book", post(teacher_bookings::book_colleague_slot))
        .route("/mine", get(teacher_bookings::my_colleague_bookings))
        .route(
            "/cancel/:booking_id",
            post(teacher_bookings::cancel_booking),
        );

    let analytics_routes = Router::new()
        .route("/", get(analytics::all_analytics))
        .route("/log-event", post(analytics::log_event))
        .route("/:service_id", get(analytics::service_analytics));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/services", services_routes)
        .nest("/api/queue", queue_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/slots", slots_routes)
        .nest("/api/teacher-bookings", teacher_booking_routes)
        .nest("/api/analytics", analytics_routes)
        .route("/api/ws", get(ws::live_events))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(cors)
}
