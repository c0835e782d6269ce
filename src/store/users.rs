use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;

pub const MIN_PASSWORD_LEN: usize = 5;

/// Lowercase the domain part of an email address. The local part is kept
/// as given; lookups are case-insensitive regardless.
pub fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn invalid_credentials() -> AppError {
    AppError::field(
        "non_field_errors",
        "Unable to authenticate with provided credentials.",
    )
}

fn short_password() -> AppError {
    AppError::field(
        "password",
        &format!("Password must be at least {MIN_PASSWORD_LEN} characters."),
    )
}

async fn email_taken(db: &SqlitePool, email: &str) -> Result<bool, sqlx::Error> {
    let existing: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE email = ? COLLATE NOCASE")
            .bind(email)
            .fetch_optional(db)
            .await?;
    Ok(existing.is_some())
}

async fn insert_user(
    db: &SqlitePool,
    email: &str,
    password: &str,
    name: &str,
    superuser: bool,
) -> Result<User, AppError> {
    let email = normalize_email(email.trim());
    if email.is_empty() {
        return Err(AppError::field("email", "This field is required."));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(short_password());
    }
    if email_taken(db, &email).await? {
        return Err(AppError::field(
            "email",
            "A user with that email already exists.",
        ));
    }

    let password_hash = hash(password, DEFAULT_COST)?;
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, name, is_staff, is_superuser, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(name)
    .bind(superuser)
    .bind(superuser)
    .bind(&now)
    .bind(&now)
    .execute(db)
    .await?;

    let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(db)
        .await?;
    Ok(user)
}

pub async fn create_user(
    db: &SqlitePool,
    email: &str,
    password: &str,
    name: &str,
) -> Result<User, AppError> {
    insert_user(db, email, password, name, false).await
}

pub async fn create_superuser(
    db: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    insert_user(db, email, password, "", true).await
}

/// Exchange credentials for the matching active user. Every failure mode
/// collapses into the same error so callers leak nothing about which part
/// was wrong.
pub async fn authenticate(db: &SqlitePool, email: &str, password: &str) -> Result<User, AppError> {
    if password.is_empty() {
        return Err(invalid_credentials());
    }

    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE email = ? COLLATE NOCASE AND is_active = 1")
            .bind(normalize_email(email.trim()))
            .fetch_optional(db)
            .await?;

    let Some(user) = user else {
        return Err(invalid_credentials());
    };

    if !verify(password, &user.password_hash)? {
        return Err(invalid_credentials());
    }

    Ok(user)
}

/// Return the user's existing token, or mint a fresh opaque one.
pub async fn issue_token(db: &SqlitePool, user_id: i64) -> Result<String, AppError> {
    let existing: Option<(String,)> =
        sqlx::query_as("SELECT token FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    if let Some((token,)) = existing {
        return Ok(token);
    }

    let token = Uuid::new_v4().simple().to_string();
    sqlx::query("INSERT INTO auth_tokens (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(Utc::now().to_rfc3339())
        .execute(db)
        .await?;
    Ok(token)
}

pub async fn get_by_token(db: &SqlitePool, token: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN auth_tokens t ON t.user_id = u.id
        WHERE t.token = ? AND u.is_active = 1
        "#,
    )
    .bind(token)
    .fetch_optional(db)
    .await
}

/// Partial profile update: name replaces directly, password is re-hashed.
/// The whole payload is validated before either column is written, so a
/// rejected update leaves no partial mutation behind.
pub async fn update_user(
    db: &SqlitePool,
    id: i64,
    name: Option<&str>,
    password: Option<&str>,
) -> Result<User, AppError> {
    let password_hash = match password {
        Some(password) if password.len() < MIN_PASSWORD_LEN => return Err(short_password()),
        Some(password) => Some(hash(password, DEFAULT_COST)?),
        None => None,
    };

    let now = Utc::now().to_rfc3339();

    if let Some(name) = name {
        sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
            .bind(name)
            .bind(&now)
            .bind(id)
            .execute(db)
            .await?;
    }

    if let Some(password_hash) = password_hash {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(&password_hash)
            .bind(&now)
            .bind(id)
            .execute(db)
            .await?;
    }

    let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    Ok(user)
}
