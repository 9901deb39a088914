use std::net::SocketAddr;

use diesel::prelude::*;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use queueup::auth::jwt::JwtService;
use queueup::config::AppConfig;
use queueup::db;
use queueup::live::LiveHub;
use queueup::routes;
use queueup::routes::services::insert_service;
use queueup::schema::services;
use queueup::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    db::run_migrations(&pool)?;
    seed_default_services(&pool)?;

    let jwt = JwtService::from_config(&config)?;
    let state = AppState::new(pool, config, jwt, LiveHub::new());

    let listen_addr: SocketAddr = {
        let config = state.config.clone();
        format!("{}:{}", config.server_host, config.server_port).parse()?
    };
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// First-run bootstrap: an empty database gets the four standard campus
/// services so the frontend has something to show.
fn seed_default_services(pool: &db::SqlitePool) -> anyhow::Result<()> {
    let mut conn = pool.get()?;

    let existing: i64 = services::table.count().get_result(&mut conn)?;
    if existing > 0 {
        return Ok(());
    }

    let defaults = [
        ("Campus Canteen", "Meal pickup and dining", 2, 300),
        ("Counseling Service", "Student counseling sessions", 1, 900),
        ("Main Auditorium", "Event entry management", 1, 14_400),
        ("Meeting Room", "Room reservations", 3, 3_600),
    ];

    for (name, description, booths, avg_service_time) in defaults {
        insert_service(&mut conn, name, Some(description), booths, avg_service_time)?;
    }
    tracing::info!(count = defaults.len(), "seeded default services");

    Ok(())
}
