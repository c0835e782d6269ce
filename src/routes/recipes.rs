use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::{Recipe, recipe::image_upload_path};
use crate::store;
use crate::store::recipes::NewRecipe;

const MAX_TITLE_LEN: usize = 255;

/// List serializer: everything but the description and image.
#[derive(Serialize)]
struct RecipeListItem {
    id: i64,
    title: String,
    time_minutes: i64,
    price: f64,
    link: Option<String>,
}

impl From<Recipe> for RecipeListItem {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
        }
    }
}

#[derive(Serialize)]
struct RecipeDetail {
    id: i64,
    title: String,
    time_minutes: i64,
    price: f64,
    link: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

impl From<Recipe> for RecipeDetail {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link,
            description: recipe.description,
            image: recipe.image,
        }
    }
}

#[derive(Deserialize)]
pub struct TagName {
    name: String,
}

/// Write payload shared by create (all required fields must be present),
/// PUT (same) and PATCH (everything optional). A `user` key in the body is
/// simply ignored; ownership always comes from the token.
#[derive(Deserialize)]
pub struct RecipePayload {
    title: Option<String>,
    time_minutes: Option<i64>,
    price: Option<f64>,
    link: Option<String>,
    description: Option<String>,
    tags: Option<Vec<TagName>>,
}

#[derive(Deserialize)]
pub struct ListParams {
    /// Comma-separated tag ids; matching recipes carry ANY of them.
    tags: Option<String>,
}

fn push_error(errors: &mut HashMap<String, Vec<String>>, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn validate_recipe(payload: &RecipePayload, require_all: bool) -> HashMap<String, Vec<String>> {
    let mut errors = HashMap::new();

    if require_all {
        if payload.title.is_none() {
            push_error(&mut errors, "title", "This field is required.");
        }
        if payload.time_minutes.is_none() {
            push_error(&mut errors, "time_minutes", "This field is required.");
        }
        if payload.price.is_none() {
            push_error(&mut errors, "price", "This field is required.");
        }
    }

    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            push_error(&mut errors, "title", "This field may not be blank.");
        }
        if title.len() > MAX_TITLE_LEN {
            push_error(&mut errors, "title", "Title must be under 255 characters.");
        }
    }

    if let Some(time_minutes) = payload.time_minutes {
        if time_minutes < 0 {
            push_error(
                &mut errors,
                "time_minutes",
                "Ensure this value is greater than or equal to 0.",
            );
        }
    }

    if let Some(price) = payload.price {
        if price < 0.0 {
            push_error(
                &mut errors,
                "price",
                "Ensure this value is greater than or equal to 0.",
            );
        }
    }

    if let Some(link) = payload.link.as_deref() {
        if !link.is_empty() && Url::parse(link).is_err() {
            push_error(&mut errors, "link", "Enter a valid URL.");
        }
    }

    if let Some(tags) = &payload.tags {
        if tags.iter().any(|t| t.name.trim().is_empty()) {
            push_error(&mut errors, "tags", "Tag names may not be blank.");
        }
    }

    errors
}

fn parse_tag_ids(params: &ListParams) -> Vec<i64> {
    params
        .tags
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}

fn tag_names(payload: &RecipePayload) -> Option<Vec<String>> {
    payload
        .tags
        .as_ref()
        .map(|tags| tags.iter().map(|t| t.name.trim().to_string()).collect())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipe/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipe/recipes/{id}",
            get(retrieve_recipe)
                .patch(patch_recipe)
                .put(put_recipe)
                .delete(delete_recipe),
        )
        .route("/recipe/recipes/{id}/upload-image", post(upload_image))
}

async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let tag_ids = parse_tag_ids(&params);
    let recipes = store::recipes::for_user(&state.db, user.id, &tag_ids).await?;
    let recipes: Vec<RecipeListItem> = recipes.into_iter().map(RecipeListItem::from).collect();
    Ok(Json(recipes))
}

async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    let errors = validate_recipe(&payload, true);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let recipe = store::recipes::create(
        &state.db,
        user.id,
        NewRecipe {
            title: payload.title.as_deref().unwrap_or(""),
            time_minutes: payload.time_minutes.unwrap_or(0),
            price: payload.price.unwrap_or(0.0),
            link: payload.link.as_deref().filter(|s| !s.is_empty()),
            description: payload.description.as_deref(),
        },
    )
    .await?;

    if let Some(names) = tag_names(&payload) {
        store::recipes::set_tags(&state.db, user.id, recipe.id, &names).await?;
    }

    Ok((StatusCode::CREATED, Json(RecipeDetail::from(recipe))))
}

async fn retrieve_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::recipes::get_owned(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(RecipeDetail::from(recipe)))
}

async fn patch_recipe(
    state: State<AppState>,
    user: AuthUser,
    id: Path<i64>,
    payload: Json<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    update_recipe(state, user, id, payload, false).await
}

async fn put_recipe(
    state: State<AppState>,
    user: AuthUser,
    id: Path<i64>,
    payload: Json<RecipePayload>,
) -> Result<impl IntoResponse, AppError> {
    update_recipe(state, user, id, payload, true).await
}

async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecipePayload>,
    require_all: bool,
) -> Result<impl IntoResponse, AppError> {
    let mut recipe = store::recipes::get_owned(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let errors = validate_recipe(&payload, require_all);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if let Some(title) = payload.title.clone() {
        recipe.title = title;
    }
    if let Some(time_minutes) = payload.time_minutes {
        recipe.time_minutes = time_minutes;
    }
    if let Some(price) = payload.price {
        recipe.price = price;
    }
    if let Some(link) = payload.link.clone() {
        recipe.link = (!link.is_empty()).then_some(link);
    }
    if let Some(description) = payload.description.clone() {
        recipe.description = Some(description);
    }

    store::recipes::update(&state.db, &recipe).await?;

    if let Some(names) = tag_names(&payload) {
        store::recipes::set_tags(&state.db, user.id, recipe.id, &names).await?;
    }

    Ok(Json(RecipeDetail::from(recipe)))
}

async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let Some(image) = store::recipes::delete(&state.db, user.id, id).await? else {
        return Err(AppError::NotFound);
    };

    if let Some(image) = image {
        // Best effort; a missing file is not the client's problem.
        tokio::fs::remove_file(state.media_root.join(image)).await.ok();
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let recipe = store::recipes::get_owned(&state.db, user.id, id)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut image_part = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("image") {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await?;
            image_part = Some((file_name, data));
            break;
        }
    }

    let Some((file_name, data)) = image_part else {
        return Err(AppError::field("image", "No image was submitted."));
    };

    let format = match image::guess_format(&data) {
        Ok(format) if image::load_from_memory(&data).is_ok() => format,
        _ => {
            return Err(AppError::field(
                "image",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            ));
        }
    };

    let extension = file_name
        .as_deref()
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_else(|| {
            format
                .extensions_str()
                .first()
                .copied()
                .unwrap_or("img")
                .to_string()
        });

    let relative = image_upload_path(&extension);
    let destination = state.media_root.join(&relative);
    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&destination, &data).await?;

    store::recipes::set_image(&state.db, recipe.id, &relative).await?;

    Ok(Json(json!({ "image": relative })))
}
