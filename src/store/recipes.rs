use chrono::Utc;
use sqlx::SqlitePool;

use crate::models::Recipe;
use crate::store::tags;

/// Fields of a recipe the API accepts on create.
pub struct NewRecipe<'a> {
    pub title: &'a str,
    pub time_minutes: i64,
    pub price: f64,
    pub link: Option<&'a str>,
    pub description: Option<&'a str>,
}

/// Recipes owned by `user_id`, newest first. When `tag_ids` is non-empty,
/// only recipes carrying ANY of the given tags are returned, without
/// duplicate rows for recipes matching more than one tag.
pub async fn for_user(
    db: &SqlitePool,
    user_id: i64,
    tag_ids: &[i64],
) -> Result<Vec<Recipe>, sqlx::Error> {
    if tag_ids.is_empty() {
        return sqlx::query_as("SELECT * FROM recipes WHERE user_id = ? ORDER BY id DESC")
            .bind(user_id)
            .fetch_all(db)
            .await;
    }

    let placeholders = vec!["?"; tag_ids.len()].join(", ");
    let sql = format!(
        r#"
        SELECT DISTINCT r.* FROM recipes r
        JOIN recipe_tags rt ON rt.recipe_id = r.id
        WHERE r.user_id = ? AND rt.tag_id IN ({placeholders})
        ORDER BY r.id DESC
        "#
    );

    let mut query = sqlx::query_as(&sql).bind(user_id);
    for tag_id in tag_ids {
        query = query.bind(tag_id);
    }
    query.fetch_all(db).await
}

/// A recipe only exists for its owner; an unowned id reads as absent.
pub async fn get_owned(
    db: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Option<Recipe>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM recipes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn create(
    db: &SqlitePool,
    user_id: i64,
    fields: NewRecipe<'_>,
) -> Result<Recipe, sqlx::Error> {
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO recipes (user_id, title, time_minutes, price, link, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(fields.title)
    .bind(fields.time_minutes)
    .bind(fields.price)
    .bind(fields.link)
    .bind(fields.description)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(db)
        .await
}

/// Write back every mutable field of an already-loaded recipe. The owner
/// column is never touched.
pub async fn update(db: &SqlitePool, recipe: &Recipe) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE recipes
        SET title = ?, time_minutes = ?, price = ?, link = ?, description = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&recipe.title)
    .bind(recipe.time_minutes)
    .bind(recipe.price)
    .bind(&recipe.link)
    .bind(&recipe.description)
    .bind(Utc::now().to_rfc3339())
    .bind(recipe.id)
    .execute(db)
    .await?;
    Ok(())
}

/// Set-replace the recipe's tag associations: clear all join rows, then
/// get-or-create each named tag for the owner and link it.
pub async fn set_tags(
    db: &SqlitePool,
    user_id: i64,
    recipe_id: i64,
    names: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(db)
        .await?;

    for name in names {
        let tag = tags::get_or_create(db, user_id, name).await?;
        sqlx::query("INSERT OR IGNORE INTO recipe_tags (recipe_id, tag_id) VALUES (?, ?)")
            .bind(recipe_id)
            .bind(tag.id)
            .execute(db)
            .await?;
    }
    Ok(())
}

pub async fn set_image(db: &SqlitePool, id: i64, path: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE recipes SET image = ?, updated_at = ? WHERE id = ?")
        .bind(path)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Delete an owned recipe and its tag associations. Returns the stored
/// image path, if any, so the caller can remove the file as well.
pub async fn delete(
    db: &SqlitePool,
    user_id: i64,
    id: i64,
) -> Result<Option<Option<String>>, sqlx::Error> {
    let Some(recipe) = get_owned(db, user_id, id).await? else {
        return Ok(None);
    };

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(id)
        .execute(db)
        .await?;
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(Some(recipe.image))
}
