use sqlx::SqlitePool;

use crate::store;

/// Bootstrap an admin account from the command line. Registration only
/// creates regular users; this is the one path that sets the staff and
/// superuser flags.
pub async fn create_superuser(
    pool: &SqlitePool,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let user = store::users::create_superuser(pool, email, password).await?;

    println!("Created superuser:");
    println!("  ID: {}", user.id);
    println!("  Email: {}", user.email);

    Ok(())
}
