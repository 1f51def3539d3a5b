use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::service::access::Groups;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// Catalog listing rows carry usage counts alongside the entity.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct DepartmentOverview {
    pub id: i64,
    pub name: String,
    pub events_count: i64,
    pub users_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct CategoryOverview {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub description: Option<String>,
    pub events_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct LocationOverview {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub events_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub pwd_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub group_mask: i32,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn groups(&self) -> Groups {
        Groups::from_mask(self.group_mask)
    }
}

/// The slice of a user that event listings need.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    #[display(fmt = "planned")]
    Planned,
    #[display(fmt = "ongoing")]
    Ongoing,
    #[display(fmt = "completed")]
    Completed,
    #[display(fmt = "cancelled")]
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Planned,
        EventStatus::Ongoing,
        EventStatus::Completed,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Planned => "planned",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Completed => "completed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    /// Human readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            EventStatus::Planned => "Planned",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Completed => "Completed",
            EventStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for EventStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EventStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ApiError::validation(format!("unknown status '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub department_id: i64,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub status: EventStatus,
    pub is_published: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Rejects blank titles and windows that end before they start.
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_title(&self.title)?;
        validate_window(self.date_start, self.date_end)
    }
}

pub fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }
    Ok(())
}

pub fn validate_window(
    date_start: DateTime<Utc>,
    date_end: Option<DateTime<Utc>>,
) -> Result<(), ApiError> {
    match date_end {
        Some(end) if end < date_start => Err(ApiError::validation(
            "date_end must not be earlier than date_start",
        )),
        _ => Ok(()),
    }
}

/// Row shape of the `events` table; status is stored as text.
#[derive(Debug, FromRow)]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub department_id: i64,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub status: String,
    pub is_published: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = ApiError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<EventStatus>().map_err(|_| {
            log::error!("event #{} has unknown status '{}'", row.id, row.status);
            ApiError::InternalError
        })?;
        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            category_id: row.category_id,
            department_id: row.department_id,
            date_start: row.date_start,
            date_end: row.date_end,
            status,
            is_published: row.is_published,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// An event together with everything the list, search and export need,
/// resolved up front so the filtering core never touches the database.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub event: Event,
    pub category_name: Option<String>,
    pub department_name: Option<String>,
    pub locations: Vec<Location>,
    pub responsibles: Vec<UserSummary>,
    pub creator_username: Option<String>,
}
