use crate::credentials;
use crate::db;
use crate::domain::models::AccountRole;
use anyhow::Result;
use sqlx::PgPool;

const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";
const BOOTSTRAP_ADMIN_EMAIL: &str = "admin@example.com";

/// Ensure the bootstrap admin account exists. Idempotent across restarts.
pub async fn seed_bootstrap_admin(pool: &PgPool, password: &str) -> Result<()> {
    if db::find_account_by_email(pool, BOOTSTRAP_ADMIN_EMAIL)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let hash = credentials::hash_password(password)?;
    db::insert_account(
        pool,
        BOOTSTRAP_ADMIN_USERNAME,
        BOOTSTRAP_ADMIN_EMAIL,
        &hash,
        AccountRole::Admin,
    )
    .await?;
    tracing::info!("seeded bootstrap admin account ({BOOTSTRAP_ADMIN_EMAIL})");
    Ok(())
}
