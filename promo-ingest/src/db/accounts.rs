//! Account rows, keyed naturally by email

use promo_common::db::{Area, Role};
use promo_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

/// Minimal account projection used for lookups
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AccountRef {
    pub id: String,
    pub name: String,
}

/// Fields written on create-or-update
#[derive(Debug, Clone)]
pub struct AccountFields<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub role: Role,
    pub area: Option<Area>,
    pub sator: Option<&'a str>,
    pub secret_hash: &'a str,
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<AccountRef>> {
    let account = sqlx::query_as::<_, AccountRef>(
        "SELECT id, name FROM accounts WHERE email = ? AND is_active = 1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Id of the account with this email, active or not
pub async fn id_for_email(pool: &SqlitePool, email: &str) -> Result<Option<String>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// First active account holding `role` in `area`
pub async fn find_by_role_and_area(pool: &SqlitePool, role: Role, area: Area) -> Result<Option<AccountRef>> {
    let account = sqlx::query_as::<_, AccountRef>(
        r#"
        SELECT id, name FROM accounts
        WHERE role = ? AND area = ? AND is_active = 1
        ORDER BY created_at ASC, rowid ASC
        LIMIT 1
        "#,
    )
    .bind(role.as_str())
    .bind(area.code())
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Active supervisor-group lead for a sator label (case-insensitive)
pub async fn find_sator_lead(pool: &SqlitePool, sator: &str) -> Result<Option<AccountRef>> {
    let account = sqlx::query_as::<_, AccountRef>(
        r#"
        SELECT id, name FROM accounts
        WHERE role = ? AND LOWER(TRIM(sator)) = LOWER(TRIM(?)) AND is_active = 1
        ORDER BY created_at ASC, rowid ASC
        LIMIT 1
        "#,
    )
    .bind(Role::SatorLead.as_str())
    .bind(sator)
    .fetch_optional(pool)
    .await?;
    Ok(account)
}

/// Insert a new account and return its id
pub async fn insert_account(pool: &SqlitePool, fields: &AccountFields<'_>) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, name, role, area, sator, secret_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(fields.email)
    .bind(fields.name)
    .bind(fields.role.as_str())
    .bind(fields.area.map(|a| a.code()))
    .bind(fields.sator)
    .bind(fields.secret_hash)
    .execute(pool)
    .await?;
    Ok(id)
}

/// Create the account if absent, otherwise refresh role/area/sator/hash
pub async fn upsert_account(pool: &SqlitePool, fields: &AccountFields<'_>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (id, email, name, role, area, sator, secret_hash)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(email) DO UPDATE SET
            name = excluded.name,
            role = excluded.role,
            area = excluded.area,
            sator = excluded.sator,
            secret_hash = excluded.secret_hash,
            is_active = 1,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(fields.email)
    .bind(fields.name)
    .bind(fields.role.as_str())
    .bind(fields.area.map(|a| a.code()))
    .bind(fields.sator)
    .bind(fields.secret_hash)
    .execute(pool)
    .await?;
    Ok(())
}

/// Compensating delete for an account whose follow-up write failed
pub async fn delete_account(pool: &SqlitePool, id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
