use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: f64,
    pub link: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl std::fmt::Display for Recipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Storage path for an uploaded recipe image.
///
/// The original filename never survives; only its extension does. A fresh
/// uuid avoids collisions between uploads and keeps client-controlled names
/// out of the media directory.
pub fn image_upload_path(extension: &str) -> String {
    format!("uploads/recipe/{}.{}", Uuid::new_v4(), extension)
}
