//! Conversion of rows from the old free-text event table.
//!
//! The old schema kept responsible people and places as comma separated
//! text. Names are matched against existing users and locations; anything
//! that does not match is reported back and never created on the fly.

use crate::{
    dto::{LegacyEventRow, NewEventDto},
    errors::ApiError,
    models::{validate_title, validate_window, Location, UserSummary},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportDefaults {
    pub category_id: i64,
    pub department_id: i64,
}

#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub event: NewEventDto,
    pub unmatched_responsibles: Vec<String>,
    pub unmatched_places: Vec<String>,
}

fn split_names(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub fn normalize_legacy(
    row: &LegacyEventRow,
    users: &[UserSummary],
    locations: &[Location],
    defaults: ImportDefaults,
) -> Result<NormalizedRow, ApiError> {
    let title = row.name.clone().unwrap_or_default();
    validate_title(&title)?;
    let date_start = row
        .date
        .ok_or_else(|| ApiError::validation("legacy row has no date"))?;
    validate_window(date_start, row.end_date)?;

    let mut responsible_ids = Vec::new();
    let mut unmatched_responsibles = Vec::new();
    for name in split_names(row.responsible.as_deref()) {
        let found = users
            .iter()
            .find(|u| same_name(&u.username, &name) || same_name(&u.display_name, &name));
        match found {
            Some(user) if !responsible_ids.contains(&user.id) => responsible_ids.push(user.id),
            Some(_) => {}
            None => unmatched_responsibles.push(name),
        }
    }

    let mut location_ids = Vec::new();
    let mut unmatched_places = Vec::new();
    for place in split_names(row.place.as_deref()) {
        match locations.iter().find(|l| same_name(&l.name, &place)) {
            Some(location) if !location_ids.contains(&location.id) => location_ids.push(location.id),
            Some(_) => {}
            None => unmatched_places.push(place),
        }
    }

    let description = row
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    Ok(NormalizedRow {
        event: NewEventDto {
            title: title.trim().to_string(),
            description,
            category_id: row.category_id.unwrap_or(defaults.category_id),
            department_id: row.department_id.unwrap_or(defaults.department_id),
            date_start: Some(date_start),
            date_end: row.end_date,
            occurrences: vec![],
            location_ids,
            responsible_ids,
            is_published: false,
        },
        unmatched_responsibles,
        unmatched_places,
    })
}
