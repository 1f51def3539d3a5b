use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgConnection, prelude::FromRow};
use uuid::Uuid;

use crate::{
    errors::ApiError,
    models::{Event, EventRecord, EventRow, EventStatus, Location, UserSummary},
    PGPool,
};

const EVENT_COLUMNS: &str = "id, title, description, category_id, department_id, date_start, \
     date_end, status, is_published, created_by, created_at, updated_at";

#[derive(FromRow)]
struct JoinedEventRow {
    #[sqlx(flatten)]
    event: EventRow,
    category_name: Option<String>,
    department_name: Option<String>,
    creator_username: Option<String>,
}

#[derive(FromRow)]
struct EventLocationRow {
    event_id: i64,
    #[sqlx(flatten)]
    location: Location,
}

#[derive(FromRow)]
struct EventResponsibleRow {
    event_id: i64,
    #[sqlx(flatten)]
    user: UserSummary,
}

/// Inserts the row and returns the new id. `event.id` is ignored.
pub async fn insert(event: &Event, conn: &mut PgConnection) -> Result<i64, sqlx::Error> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO events (title, description, category_id, department_id, date_start, date_end, \
         status, is_published, created_by, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING id",
    )
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.category_id)
    .bind(event.department_id)
    .bind(event.date_start)
    .bind(event.date_end)
    .bind(event.status.as_str())
    .bind(event.is_published)
    .bind(event.created_by)
    .bind(event.created_at)
    .bind(event.updated_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn get_by_id(id: i64, pool: &PGPool) -> Result<Option<Event>, ApiError> {
    let row = sqlx::query_as::<_, EventRow>(&format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Event::try_from).transpose()
}

/// Writes every editable column; `created_by` and `created_at` are never touched.
pub async fn update(event: &Event, conn: &mut PgConnection) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE events SET title = $2, description = $3, category_id = $4, department_id = $5, \
         date_start = $6, date_end = $7, status = $8, is_published = $9, updated_at = $10 \
         WHERE id = $1",
    )
    .bind(event.id)
    .bind(&event.title)
    .bind(&event.description)
    .bind(event.category_id)
    .bind(event.department_id)
    .bind(event.date_start)
    .bind(event.date_end)
    .bind(event.status.as_str())
    .bind(event.is_published)
    .bind(event.updated_at)
    .execute(conn)
    .await?;
    Ok(res.rows_affected())
}

pub async fn set_status(
    id: i64,
    status: EventStatus,
    now: DateTime<Utc>,
    pool: &PGPool,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE events SET status = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .bind(now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

/// Flips the flag in a single statement and returns the new value.
pub async fn toggle_publish(id: i64, now: DateTime<Utc>, pool: &PGPool) -> Result<Option<bool>, sqlx::Error> {
    let row: Option<(bool,)> = sqlx::query_as(
        "UPDATE events SET is_published = NOT is_published, updated_at = $2 \
         WHERE id = $1 RETURNING is_published",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(published,)| published))
}

pub async fn set_published(
    id: i64,
    published: bool,
    now: DateTime<Utc>,
    pool: &PGPool,
) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE events SET is_published = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(published)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete(id: i64, pool: &PGPool) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn replace_locations(id: i64, location_ids: &[i64], conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM event_locations WHERE event_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO event_locations (event_id, location_id) \
         SELECT $1, location_id FROM UNNEST($2::BIGINT[]) AS t (location_id) ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(location_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn replace_responsibles(id: i64, user_ids: &[Uuid], conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM event_responsibles WHERE event_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO event_responsibles (event_id, user_id) \
         SELECT $1, user_id FROM UNNEST($2::UUID[]) AS t (user_id) ON CONFLICT DO NOTHING",
    )
    .bind(id)
    .bind(user_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Every event with its names, locations and responsibles resolved.
pub async fn load_records(pool: &PGPool) -> Result<Vec<EventRecord>, ApiError> {
    fetch_records(None, pool).await
}

pub async fn load_record(id: i64, pool: &PGPool) -> Result<Option<EventRecord>, ApiError> {
    Ok(fetch_records(Some(id), pool).await?.pop())
}

async fn fetch_records(only: Option<i64>, pool: &PGPool) -> Result<Vec<EventRecord>, ApiError> {
    let rows = sqlx::query_as::<_, JoinedEventRow>(
        "SELECT e.id, e.title, e.description, e.category_id, e.department_id, e.date_start, \
         e.date_end, e.status, e.is_published, e.created_by, e.created_at, e.updated_at, \
         c.name AS category_name, d.name AS department_name, u.username AS creator_username \
         FROM events e \
         LEFT JOIN categories c ON c.id = e.category_id \
         LEFT JOIN departments d ON d.id = e.department_id \
         LEFT JOIN users u ON u.id = e.created_by \
         WHERE ($1::BIGINT IS NULL OR e.id = $1) \
         ORDER BY e.id",
    )
    .bind(only)
    .fetch_all(pool)
    .await?;

    let location_rows = sqlx::query_as::<_, EventLocationRow>(
        "SELECT el.event_id, l.id, l.name, l.address, l.description \
         FROM event_locations el JOIN locations l ON l.id = el.location_id \
         WHERE ($1::BIGINT IS NULL OR el.event_id = $1) \
         ORDER BY l.name, l.id",
    )
    .bind(only)
    .fetch_all(pool)
    .await?;

    let responsible_rows = sqlx::query_as::<_, EventResponsibleRow>(
        "SELECT er.event_id, u.id, u.username, u.display_name \
         FROM event_responsibles er JOIN users u ON u.id = er.user_id \
         WHERE ($1::BIGINT IS NULL OR er.event_id = $1) \
         ORDER BY u.display_name, u.username",
    )
    .bind(only)
    .fetch_all(pool)
    .await?;

    let mut locations: HashMap<i64, Vec<Location>> = HashMap::new();
    for row in location_rows {
        locations.entry(row.event_id).or_default().push(row.location);
    }
    let mut responsibles: HashMap<i64, Vec<UserSummary>> = HashMap::new();
    for row in responsible_rows {
        responsibles.entry(row.event_id).or_default().push(row.user);
    }

    rows.into_iter()
        .map(|row| -> Result<EventRecord, ApiError> {
            let event = Event::try_from(row.event)?;
            Ok(EventRecord {
                locations: locations.remove(&event.id).unwrap_or_default(),
                responsibles: responsibles.remove(&event.id).unwrap_or_default(),
                category_name: row.category_name,
                department_name: row.department_name,
                creator_username: row.creator_username,
                event,
            })
        })
        .collect()
}
