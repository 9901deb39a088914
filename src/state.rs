use std::sync::Arc;

use diesel::{
    r2d2::{ConnectionManager, PooledConnection},
    sqlite::SqliteConnection,
};

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::SqlitePool,
    error::{AppError, AppResult},
    live::LiveHub,
};

pub type PooledSqliteConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
    pub live: LiveHub,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig, jwt: JwtService, live: LiveHub) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            live,
        }
    }

    pub fn db(&self) -> AppResult<PooledSqliteConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
