use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Tag;

pub async fn for_user(db: &SqlitePool, user_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tags WHERE user_id = ? ORDER BY name DESC")
        .bind(user_id)
        .fetch_all(db)
        .await
}

/// Look up a tag by exact name for this user, creating it if absent.
/// Shared by recipe create/update, which accept embedded tag names.
pub async fn get_or_create(db: &SqlitePool, user_id: i64, name: &str) -> Result<Tag, sqlx::Error> {
    let existing: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE user_id = ? AND name = ?")
        .bind(user_id)
        .bind(name)
        .fetch_optional(db)
        .await?;
    if let Some(tag) = existing {
        return Ok(tag);
    }

    let result = sqlx::query("INSERT INTO tags (user_id, name, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(name)
        .bind(Utc::now().to_rfc3339())
        .execute(db)
        .await?;

    sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(db)
        .await
}

/// Rename an owned tag. `None` when the id does not exist for this user.
pub async fn rename(
    db: &SqlitePool,
    user_id: i64,
    tag_id: i64,
    name: &str,
) -> Result<Option<Tag>, sqlx::Error> {
    let result = sqlx::query("UPDATE tags SET name = ? WHERE id = ? AND user_id = ?")
        .bind(name)
        .bind(tag_id)
        .bind(user_id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(tag_id)
        .fetch_optional(db)
        .await
}

/// Delete an owned tag along with its recipe associations.
pub async fn delete(db: &SqlitePool, user_id: i64, tag_id: i64) -> Result<bool, sqlx::Error> {
    let owned: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE id = ? AND user_id = ?")
        .bind(tag_id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    if owned.is_none() {
        return Ok(false);
    }

    sqlx::query("DELETE FROM recipe_tags WHERE tag_id = ?")
        .bind(tag_id)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(tag_id)
        .execute(db)
        .await?;
    Ok(true)
}
