use anyhow::{anyhow, ensure, Context, Result};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use diesel::prelude::*;
use diesel::SqliteConnection;
use http_body_util::BodyExt;
use serde::Serialize;
use serde_json::Value;
use tempfile::TempDir;
use tower::util::ServiceExt;
use uuid::Uuid;

use queueup::auth::jwt::JwtService;
use queueup::auth::password::hash_password;
use queueup::config::AppConfig;
use queueup::db;
use queueup::live::LiveHub;
use queueup::models::NewUser;
use queueup::routes;
use queueup::state::AppState;

/// Full application over a throwaway SQLite file. Each test gets its own
/// database, so tests never contend for shared state.
pub struct TestApp {
    pub state: AppState,
    router: Router,
    _db_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let db_dir = TempDir::new().context("failed to create temp dir")?;
        let database_url = db_dir
            .path()
            .join("queueup-test.sqlite3")
            .to_string_lossy()
            .into_owned();

        let config = AppConfig {
            database_url: database_url.clone(),
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            cors_allowed_origin: None,
        };

        let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
        {
            let pool = pool.clone();
            tokio::task::spawn_blocking(move || db::run_migrations(&pool))
                .await
                .context("migration task panicked")??;
        }

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, jwt, LiveHub::new());
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            router,
            _db_dir: db_dir,
        })
    }

    pub async fn insert_user(&self, username: &str, password: &str, role: &str) -> Result<String> {
        let username = username.to_string();
        let password = password.to_string();
        let role = role.to_string();
        self.with_conn(move |conn| {
            let password_hash = hash_password(&password)?;
            let user = NewUser {
                id: Uuid::new_v4().to_string(),
                name: format!("{username} account"),
                email: format!("{username}@campus.test"),
                department: None,
                username,
                password_hash,
                role,
            };
            diesel::insert_into(queueup::schema::users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    pub async fn login_token(&self, username: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json(
                "/api/auth/login",
                &LoginPayload { username, password },
                None,
            )
            .await?;

        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );

        let body = body_to_json(response.into_body()).await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("login response missing token"))
    }

    /// Creates a service through the API and returns its id.
    pub async fn create_service(&self, name: &str, avg_service_time: i32) -> Result<String> {
        let response = self
            .post_json(
                "/api/services",
                &serde_json::json!({
                    "name": name,
                    "avg_service_time": avg_service_time,
                }),
                None,
            )
            .await?;
        ensure!(
            response.status() == StatusCode::CREATED,
            "create service failed with status {}",
            response.status()
        );

        let body = body_to_json(response.into_body()).await?;
        body["data"]["service_id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("create service response missing id"))
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        token: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<hyper::Response<Body>> {
        let builder = Request::builder().method(Method::DELETE).uri(path);
        let builder = if let Some(token) = token {
            builder.header("authorization", format!("Bearer {token}"))
        } else {
            builder
        };
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

pub async fn body_to_json(body: Body) -> Result<Value> {
    let bytes = body_to_vec(body).await?;
    serde_json::from_slice(&bytes).context("response body is not valid JSON")
}
