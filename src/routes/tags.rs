use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Tag;
use crate::store;

#[derive(Serialize)]
struct TagResponse {
    id: i64,
    name: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateTagPayload {
    name: Option<String>,
}

/// Tags are created implicitly through recipe writes, so this router only
/// exposes list, rename, and delete.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipe/tags", get(list_tags))
        .route("/recipe/tags/{id}", patch(update_tag).delete(delete_tag))
}

async fn list_tags(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let tags = store::tags::for_user(&state.db, user.id).await?;
    let tags: Vec<TagResponse> = tags.into_iter().map(TagResponse::from).collect();
    Ok(Json(tags))
}

async fn update_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTagPayload>,
) -> Result<impl IntoResponse, AppError> {
    let name = payload.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        return Err(AppError::field("name", "This field may not be blank."));
    }

    let tag = store::tags::rename(&state.db, user.id, id, &name)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(TagResponse::from(tag)))
}

async fn delete_tag(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store::tags::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}
