use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::password,
    error::{AppError, AppResult},
    models::{NewUser, User},
    response::ApiResponse,
    schema::users,
    state::AppState,
};

const KNOWN_ROLES: [&str; 5] = ["student", "teacher", "organization", "admin", "staff"];

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub user: UserProfile,
    pub token: String,
}

/// Public view of a user row; the password hash never leaves the server.
#[derive(Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            name: user.name,
            email: user.email,
            department: user.department,
            created_at: user.created_at,
        }
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("username and password required"));
    }

    let mut conn = state.db()?;

    let user: Option<User> = users::table
        .filter(users::username.eq(&payload.username))
        .first(&mut conn)
        .optional()?;

    let Some(user) = user else {
        return Err(AppError::unauthorized());
    };

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    let token = state
        .jwt
        .generate_token(&user.id, &user.username, &user.role)?;

    Ok(Json(LoginResponse {
        success: true,
        user: user.into(),
        token,
    }))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub department: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub user_id: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<RegisterResponse>>)> {
    if payload.username.trim().is_empty()
        || payload.password.is_empty()
        || payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
    {
        return Err(AppError::bad_request("all fields required"));
    }
    if !KNOWN_ROLES.contains(&payload.role.as_str()) {
        return Err(AppError::bad_request("unknown role"));
    }

    let password_hash = password::hash_password(&payload.password)?;
    let new_user = NewUser {
        id: Uuid::new_v4().to_string(),
        username: payload.username.trim().to_string(),
        password_hash,
        role: payload.role,
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        department: payload.department,
    };

    let mut conn = state.db()?;

    // A duplicate username is an expected validation case, not a server error.
    match diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
    {
        Ok(_) => {}
        Err(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        )) => {
            return Err(AppError::bad_request("username already exists"));
        }
        Err(err) => return Err(AppError::from(err)),
    }

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(RegisterResponse {
            user_id: new_user.id,
        })),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let mut conn = state.db()?;

    let user: Option<User> = users::table.find(&user_id).first(&mut conn).optional()?;
    let Some(user) = user else {
        return Err(AppError::not_found("user not found"));
    };

    Ok(Json(ApiResponse::ok(user.into())))
}

pub async fn list_teachers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserProfile>>>> {
    let mut conn = state.db()?;

    let teachers: Vec<User> = users::table
        .filter(users::role.eq("teacher"))
        .order(users::name.asc())
        .load(&mut conn)?;

    Ok(Json(ApiResponse::ok(
        teachers.into_iter().map(UserProfile::from).collect(),
    )))
}

pub async fn get_teacher(
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let mut conn = state.db()?;

    let teacher: Option<User> = users::table
        .find(&teacher_id)
        .filter(users::role.eq("teacher"))
        .first(&mut conn)
        .optional()?;
    let Some(teacher) = teacher else {
        return Err(AppError::not_found("teacher not found"));
    };

    Ok(Json(ApiResponse::ok(teacher.into())))
}
