use uuid::Uuid;

use crate::{
    models::{User, UserSummary},
    PGPool,
};

const USER_COLUMNS: &str = "id, username, display_name, pwd_hash, email, phone, department_id, \
     is_active, is_staff, is_superuser, group_mask, created_at";

/// Typed user list filters. `None` means "do not filter".
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserFilter {
    pub is_active: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_staff: Option<bool>,
    /// Bit that must (or must not) be set in `group_mask`.
    pub group_bit: Option<(i32, bool)>,
    pub department_id: Option<i64>,
    pub search: Option<String>,
}

pub async fn create(user: &User, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "INSERT INTO users (id, username, display_name, pwd_hash, email, phone, department_id, \
         is_active, is_staff, is_superuser, group_mask, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.display_name)
    .bind(&user.pwd_hash)
    .bind(&user.email)
    .bind(&user.phone)
    .bind(user.department_id)
    .bind(user.is_active)
    .bind(user.is_staff)
    .bind(user.is_superuser)
    .bind(user.group_mask)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

pub async fn get_by_id(id: Uuid, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_by_username(username: &str, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS))
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn exists(username: &str, pool: &PGPool) -> Result<bool, sqlx::Error> {
    let (found,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

pub async fn get_all(filter: &UserFilter, pool: &PGPool) -> Result<Vec<User>, sqlx::Error> {
    let (bit, bit_set) = match filter.group_bit {
        Some((bit, set)) => (Some(bit), Some(set)),
        None => (None, None),
    };
    let pattern = filter.search.as_ref().map(|q| format!("%{}%", q));
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users \
         WHERE ($1::BOOLEAN IS NULL OR is_active = $1) \
         AND ($2::BOOLEAN IS NULL OR is_superuser = $2) \
         AND ($3::BOOLEAN IS NULL OR is_staff = $3) \
         AND ($4::INTEGER IS NULL OR ((group_mask & $4) <> 0) = $5) \
         AND ($6::BIGINT IS NULL OR department_id = $6) \
         AND ($7::TEXT IS NULL OR username ILIKE $7 OR display_name ILIKE $7 OR email ILIKE $7) \
         ORDER BY username",
        USER_COLUMNS
    ))
    .bind(filter.is_active)
    .bind(filter.is_superuser)
    .bind(filter.is_staff)
    .bind(bit)
    .bind(bit_set)
    .bind(filter.department_id)
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// Active users only; used to resolve responsible names.
pub async fn summaries(pool: &PGPool) -> Result<Vec<UserSummary>, sqlx::Error> {
    sqlx::query_as::<_, UserSummary>(
        "SELECT id, username, display_name FROM users WHERE is_active ORDER BY username",
    )
    .fetch_all(pool)
    .await
}

pub async fn toggle_active(id: Uuid, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET is_active = NOT is_active WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_groups(id: Uuid, group_mask: i32, is_staff: bool, pool: &PGPool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET group_mask = $2, is_staff = $3 WHERE id = $1 RETURNING {}",
        USER_COLUMNS
    ))
    .bind(id)
    .bind(group_mask)
    .bind(is_staff)
    .fetch_optional(pool)
    .await
}
