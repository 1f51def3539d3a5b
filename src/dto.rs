use actix_web::web;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{errors::ApiError, models::User};

#[derive(Debug, Deserialize, Clone)]
pub struct NewUserDto {
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
    pub pwd: String,
    pub pwd_confirm: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginUserRequest {
    pub username: String,
    pub pwd: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthUserResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: &Uuid, username: &str, exp: usize) -> Self {
        Self {
            sub: *user_id,
            username: username.to_string(),
            exp,
        }
    }
}

/// Public shape of a user: groups spelled out, password hash never leaves.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<i64>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<&'static str>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            department_id: user.department_id,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            groups: user.groups().names(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UserListQuery {
    pub is_active: Option<String>,
    pub is_superuser: Option<String>,
    pub staff_access: Option<String>,
    pub in_admin_group: Option<String>,
    pub department_id: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SetGroupsDto {
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceDto {
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewEventDto {
    pub title: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub department_id: i64,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    /// Extra windows; one event is created per window.
    #[serde(default)]
    pub occurrences: Vec<OccurrenceDto>,
    #[serde(default)]
    pub location_ids: Vec<i64>,
    #[serde(default)]
    pub responsible_ids: Vec<Uuid>,
    #[serde(default)]
    pub is_published: bool,
}

impl NewEventDto {
    /// The top-level window first, followed by any extra occurrences.
    pub fn windows(&self) -> Result<Vec<OccurrenceDto>, ApiError> {
        let mut windows = Vec::with_capacity(self.occurrences.len() + 1);
        if let Some(date_start) = self.date_start {
            windows.push(OccurrenceDto {
                date_start,
                date_end: self.date_end,
            });
        } else if self.date_end.is_some() {
            return Err(ApiError::validation("date_end given without date_start"));
        }
        windows.extend(self.occurrences.iter().copied());
        if windows.is_empty() {
            return Err(ApiError::validation("date_start is required"));
        }
        Ok(windows)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdateEventDto {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub department_id: Option<i64>,
    pub date_start: Option<DateTime<Utc>>,
    pub date_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clear_date_end: bool,
    /// Explicit status; when absent the status is re-derived.
    pub status: Option<String>,
    pub is_published: Option<bool>,
    pub location_ids: Option<Vec<i64>>,
    pub responsible_ids: Option<Vec<Uuid>>,
}

/// Raw list parameters. Everything stays a string so that malformed values
/// degrade to "no filter" instead of failing extraction.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct EventListQuery {
    pub category_id: Option<String>,
    pub department_id: Option<String>,
    pub status: Option<String>,
    pub is_published: Option<String>,
    pub location_id: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(alias = "search", alias = "search_text")]
    pub q: Option<String>,
    #[serde(alias = "sort_order")]
    pub sort: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl EventListQuery {
    /// Builds the query from raw pairs. Repeated keys and aliases never fail:
    /// the last value wins and unknown keys are ignored.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = EventListQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "category_id" => &mut query.category_id,
                "department_id" => &mut query.department_id,
                "status" => &mut query.status,
                "is_published" => &mut query.is_published,
                "location_id" => &mut query.location_id,
                "month" => &mut query.month,
                "year" => &mut query.year,
                "start_date" => &mut query.start_date,
                "end_date" => &mut query.end_date,
                "q" | "search" | "search_text" => &mut query.q,
                "sort" | "sort_order" => &mut query.sort,
                "page" => &mut query.page,
                "page_size" => &mut query.page_size,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }

    /// Parses a raw query string; an undecodable one means no filters at all.
    pub fn from_query_string(query_string: &str) -> Self {
        match web::Query::<Vec<(String, String)>>::from_query(query_string) {
            Ok(pairs) => EventListQuery::from_pairs(pairs.into_inner()),
            Err(_) => EventListQuery::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BulkStatusDto {
    pub ids: Vec<i64>,
    pub status: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BulkPublishDto {
    pub ids: Vec<i64>,
    pub published: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BulkIdsDto {
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub id: i64,
    pub reason: String,
}

#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
pub struct BulkOutcome {
    pub affected: usize,
    pub skipped: Vec<SkippedItem>,
}

impl BulkOutcome {
    pub fn skip(&mut self, id: i64, err: &ApiError) {
        let reason = match err {
            ApiError::NotFound { .. } => "not found".to_string(),
            ApiError::PermissionDenied => "permission denied".to_string(),
            _ => "failed".to_string(),
        };
        self.skipped.push(SkippedItem { id, reason });
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct PublishState {
    pub id: i64,
    pub is_published: bool,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DepartmentDto {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategoryDto {
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationDto {
    pub name: String,
    pub address: Option<String>,
    pub description: Option<String>,
}

/// One row of the old free-text event table.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct LegacyEventRow {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub place: Option<String>,
    pub responsible: Option<String>,
    pub comment: Option<String>,
    pub category_id: Option<i64>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LegacyImportDto {
    pub default_category_id: i64,
    pub default_department_id: i64,
    pub rows: Vec<LegacyEventRow>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct UnmatchedNames {
    pub row: usize,
    pub responsibles: Vec<String>,
    pub places: Vec<String>,
}

/// A legacy row that could not be imported, by its 0-based position.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug, Serialize, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub created: Vec<i64>,
    pub skipped: Vec<SkippedRow>,
    pub unmatched: Vec<UnmatchedNames>,
}
