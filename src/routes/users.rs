use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::User;
use crate::store;

/// Public view of a user account. The password hash never leaves the store.
#[derive(Serialize)]
struct UserResponse {
    email: String,
    name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            name: user.name,
        }
    }
}

#[derive(Deserialize)]
pub struct CreateUserPayload {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
pub struct TokenPayload {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfilePayload {
    name: Option<String>,
    password: Option<String>,
}

fn validate_create_user(payload: &CreateUserPayload) -> HashMap<String, Vec<String>> {
    let mut errors: HashMap<String, Vec<String>> = HashMap::new();

    if payload.email.as_deref().unwrap_or("").trim().is_empty() {
        errors
            .entry("email".to_string())
            .or_default()
            .push("This field is required.".to_string());
    }

    if payload.password.as_deref().unwrap_or("").is_empty() {
        errors
            .entry("password".to_string())
            .or_default()
            .push("This field is required.".to_string());
    }

    errors
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user))
        .route("/user/token", post(create_token))
        // POST on /user/me falls through to axum's 405.
        .route("/user/me", get(me).patch(update_me).put(update_me))
}

async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_create_user(&payload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let user = store::users::create_user(
        &state.db,
        payload.email.as_deref().unwrap_or(""),
        payload.password.as_deref().unwrap_or(""),
        payload.name.as_deref().unwrap_or(""),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn create_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenPayload>,
) -> Result<impl IntoResponse, AppError> {
    let user = store::users::authenticate(
        &state.db,
        payload.email.as_deref().unwrap_or(""),
        payload.password.as_deref().unwrap_or(""),
    )
    .await?;

    let token = store::users::issue_token(&state.db, user.id).await?;

    Ok(Json(json!({ "token": token })))
}

async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<UserResponse>, AppError> {
    let user = store::users::update_user(
        &state.db,
        user.id,
        payload.name.as_deref(),
        payload.password.as_deref(),
    )
    .await?;

    Ok(Json(UserResponse::from(user)))
}
