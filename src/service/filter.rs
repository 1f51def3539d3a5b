//! Event query engine.
//!
//! Criteria are parsed leniently from raw request parameters: anything that
//! does not parse is treated as "not supplied". Every supplied criterion is
//! ANDed, and the result is ordered by `date_start` with title and id as
//! tie-breakers so the same snapshot always yields the same sequence.

use std::{cmp::Ordering, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    dto::EventListQuery,
    models::{Event, EventRecord, EventStatus},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("desc") | Some("-date_start") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventCriteria {
    pub category_id: Option<i64>,
    pub department_id: Option<i64>,
    pub status: Option<EventStatus>,
    pub is_published: Option<bool>,
    pub location_id: Option<i64>,
    pub month: Option<u32>,
    pub year: Option<i32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search_text: Option<String>,
    pub sort_order: SortOrder,
}

impl EventCriteria {
    pub fn from_query(query: &EventListQuery) -> Self {
        EventCriteria {
            category_id: parse_number(query.category_id.as_deref()),
            department_id: parse_number(query.department_id.as_deref()),
            status: query
                .status
                .as_deref()
                .and_then(|s| s.parse::<EventStatus>().ok()),
            is_published: parse_flag(query.is_published.as_deref()),
            location_id: parse_number(query.location_id.as_deref()),
            month: parse_number(query.month.as_deref()).filter(|m| (1..=12).contains(m)),
            year: parse_number(query.year.as_deref()),
            start_date: parse_date(query.start_date.as_deref()),
            end_date: parse_date(query.end_date.as_deref()),
            search_text: query
                .q
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort_order: SortOrder::parse(query.sort.as_deref()),
        }
    }

    pub fn matches(&self, record: &EventRecord, now: DateTime<Utc>) -> bool {
        let event = &record.event;
        if self.category_id.is_some_and(|id| id != event.category_id) {
            return false;
        }
        if self.department_id.is_some_and(|id| id != event.department_id) {
            return false;
        }
        if self.status.is_some_and(|status| status != event.status) {
            return false;
        }
        if self.is_published.is_some_and(|published| published != event.is_published) {
            return false;
        }
        if let Some(location_id) = self.location_id {
            if !record.locations.iter().any(|l| l.id == location_id) {
                return false;
            }
        }
        self.matches_period(event, now) && self.matches_range(event) && self.matches_text(record)
    }

    /// Month/year match on either end of the window.
    fn matches_period(&self, event: &Event, now: DateTime<Utc>) -> bool {
        let year = match (self.month, self.year) {
            (None, None) => return true,
            (_, Some(year)) => year,
            (Some(_), None) => now.year(),
        };
        let within = |ts: DateTime<Utc>| ts.year() == year && self.month.map_or(true, |m| ts.month() == m);
        within(event.date_start) || event.date_end.is_some_and(within)
    }

    /// Inclusive overlap of the event window with `[start_date 00:00:00, end_date 23:59:59]`.
    fn matches_range(&self, event: &Event) -> bool {
        let start = self
            .start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let end = self
            .end_date
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|dt| dt.and_utc());

        let reaches_start = start.map_or(true, |start| {
            event.date_start >= start || event.date_end.is_some_and(|de| de >= start)
        });
        // date_end <= end implies date_start <= end, so the start alone decides.
        let begins_before_end = end.map_or(true, |end| event.date_start <= end);
        reaches_start && begins_before_end
    }

    /// Every term must hit at least one searchable field.
    fn matches_text(&self, record: &EventRecord) -> bool {
        let Some(text) = self.search_text.as_deref() else {
            return true;
        };
        text.split_whitespace()
            .map(str::to_lowercase)
            .all(|term| term_matches(record, &term))
    }
}

fn term_matches(record: &EventRecord, term: &str) -> bool {
    let hit = |field: &str| field.to_lowercase().contains(term);
    let event = &record.event;
    hit(event.title.as_str())
        || event.description.as_deref().is_some_and(hit)
        || record
            .locations
            .iter()
            .any(|l| hit(l.name.as_str()) || l.address.as_deref().is_some_and(hit))
        || record
            .responsibles
            .iter()
            .any(|u| hit(u.username.as_str()) || hit(u.display_name.as_str()))
        || record.category_name.as_deref().is_some_and(hit)
        || record.department_name.as_deref().is_some_and(hit)
}

pub fn compare(a: &EventRecord, b: &EventRecord, order: SortOrder) -> Ordering {
    let by_date = a.event.date_start.cmp(&b.event.date_start);
    let by_date = match order {
        SortOrder::Asc => by_date,
        SortOrder::Desc => by_date.reverse(),
    };
    by_date
        .then_with(|| a.event.title.cmp(&b.event.title))
        .then_with(|| a.event.id.cmp(&b.event.id))
}

/// Filters and orders a borrowed view over `events`.
pub fn filter_events<'a, I>(events: I, criteria: &EventCriteria, now: DateTime<Utc>) -> Vec<&'a EventRecord>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut matched: Vec<&EventRecord> = events
        .into_iter()
        .filter(|record| criteria.matches(record, now))
        .collect();
    matched.sort_by(|a, b| compare(a, b, criteria.sort_order));
    matched
}

pub(crate) fn parse_number<T: FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<T>().ok())
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

pub(crate) fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") => Some(true),
        Some("false") | Some("0") | Some("no") => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::fixtures::{ts, RecordBuilder};

    fn now() -> DateTime<Utc> {
        ts(2025, 6, 15, 12, 0)
    }

    fn ids(events: Vec<&EventRecord>) -> Vec<i64> {
        events.into_iter().map(|r| r.event.id).collect()
    }

    fn query(pairs: &[(&str, &str)]) -> EventListQuery {
        let map: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        serde_json::from_value(serde_json::Value::Object(map)).unwrap()
    }

    #[test]
    fn malformed_numbers_are_ignored() {
        let criteria = EventCriteria::from_query(&query(&[
            ("category_id", "abc"),
            ("department_id", "1.5"),
            ("month", "13"),
            ("year", "twenty"),
            ("start_date", "10/01/2025"),
            ("is_published", "maybe"),
            ("status", "archived"),
        ]));
        assert_eq!(criteria, EventCriteria::default());
    }

    #[test]
    fn well_formed_query_is_parsed() {
        let criteria = EventCriteria::from_query(&query(&[
            ("category_id", " 3 "),
            ("month", "2"),
            ("year", "2025"),
            ("start_date", "2025-01-10"),
            ("q", "  open day "),
            ("sort", "DESC"),
            ("is_published", "yes"),
            ("status", "Cancelled"),
        ]));
        assert_eq!(criteria.category_id, Some(3));
        assert_eq!(criteria.month, Some(2));
        assert_eq!(criteria.year, Some(2025));
        assert_eq!(criteria.start_date, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(criteria.search_text.as_deref(), Some("open day"));
        assert_eq!(criteria.sort_order, SortOrder::Desc);
        assert_eq!(criteria.is_published, Some(true));
        assert_eq!(criteria.status, Some(EventStatus::Cancelled));
    }

    #[test]
    fn search_terms_are_anded_across_fields() {
        let events = vec![
            RecordBuilder::new(1, "Alpha Day", ts(2025, 1, 1, 9, 0))
                .department(1, "Beta Wing")
                .build(),
            RecordBuilder::new(2, "Alpha Day", ts(2025, 1, 1, 9, 0))
                .department(2, "Gamma Wing")
                .build(),
        ];
        let criteria = EventCriteria {
            search_text: Some("alpha beta".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &criteria, now())), vec![1]);
    }

    #[test]
    fn search_covers_every_field() {
        let base = ts(2025, 1, 1, 9, 0);
        let events = vec![
            RecordBuilder::new(1, "Seminar", base).description("Quantum talk").build(),
            RecordBuilder::new(2, "Seminar", base).location(1, "Main hall", Some("Quantum street 1")).build(),
            RecordBuilder::new(3, "Seminar", base).responsible("ivanov", "Quantum Ivanov").build(),
            RecordBuilder::new(4, "Seminar", base).category(2, "Quantum club").build(),
            RecordBuilder::new(5, "Seminar", base).department(2, "Quantum faculty").build(),
            RecordBuilder::new(6, "Quantum night", base).build(),
            RecordBuilder::new(7, "Seminar", base).build(),
        ];
        let criteria = EventCriteria {
            search_text: Some("QUANTUM".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &criteria, now())), vec![6, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn date_range_uses_overlap() {
        let events = vec![
            RecordBuilder::new(1, "Partial", ts(2025, 1, 5, 9, 0)).end(ts(2025, 1, 12, 18, 0)).build(),
            RecordBuilder::new(2, "After", ts(2025, 1, 21, 9, 0)).end(ts(2025, 1, 25, 18, 0)).build(),
            RecordBuilder::new(3, "Inside", ts(2025, 1, 15, 9, 0)).build(),
            RecordBuilder::new(4, "Before", ts(2025, 1, 1, 9, 0)).end(ts(2025, 1, 9, 23, 0)).build(),
            RecordBuilder::new(5, "Spanning", ts(2025, 1, 1, 9, 0)).end(ts(2025, 2, 1, 9, 0)).build(),
            RecordBuilder::new(6, "Last evening", ts(2025, 1, 20, 23, 30)).build(),
        ];
        let criteria = EventCriteria {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 20),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &criteria, now())), vec![5, 1, 3, 6]);
    }

    #[test]
    fn open_ended_range_bounds() {
        let events = vec![
            RecordBuilder::new(1, "Early", ts(2025, 1, 1, 9, 0)).build(),
            RecordBuilder::new(2, "Late", ts(2025, 3, 1, 9, 0)).build(),
        ];
        let from = EventCriteria {
            start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        };
        let until = EventCriteria {
            end_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &from, now())), vec![2]);
        assert_eq!(ids(filter_events(&events, &until, now())), vec![1]);
    }

    #[test]
    fn month_matches_either_end_and_defaults_year() {
        let events = vec![
            RecordBuilder::new(1, "Starts in March", ts(2025, 3, 30, 9, 0)).end(ts(2025, 4, 2, 9, 0)).build(),
            RecordBuilder::new(2, "Ends in March", ts(2025, 2, 27, 9, 0)).end(ts(2025, 3, 1, 9, 0)).build(),
            RecordBuilder::new(3, "March last year", ts(2024, 3, 10, 9, 0)).build(),
            RecordBuilder::new(4, "May", ts(2025, 5, 10, 9, 0)).build(),
        ];
        let march = EventCriteria {
            month: Some(3),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &march, now())), vec![2, 1]);

        let march_2024 = EventCriteria {
            month: Some(3),
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &march_2024, now())), vec![3]);

        let year_only = EventCriteria {
            year: Some(2025),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &year_only, now())), vec![2, 1, 4]);
    }

    #[test]
    fn criteria_are_anded() {
        let base = ts(2025, 1, 1, 9, 0);
        let events = vec![
            RecordBuilder::new(1, "Talk", base).category(1, "Science").department(1, "Physics").build(),
            RecordBuilder::new(2, "Talk", base).category(1, "Science").department(2, "History").build(),
            RecordBuilder::new(3, "Talk", base).category(2, "Sport").department(1, "Physics").build(),
        ];
        let criteria = EventCriteria {
            category_id: Some(1),
            department_id: Some(1),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &criteria, now())), vec![1]);
    }

    #[test]
    fn exact_criteria_on_status_publication_and_location() {
        let base = ts(2025, 1, 1, 9, 0);
        let events = vec![
            RecordBuilder::new(1, "A", base).status(EventStatus::Cancelled).published().build(),
            RecordBuilder::new(2, "B", base).published().location(7, "Gym", None).build(),
            RecordBuilder::new(3, "C", base).location(7, "Gym", None).build(),
        ];
        let cancelled = EventCriteria {
            status: Some(EventStatus::Cancelled),
            ..Default::default()
        };
        let published_in_gym = EventCriteria {
            is_published: Some(true),
            location_id: Some(7),
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &cancelled, now())), vec![1]);
        assert_eq!(ids(filter_events(&events, &published_in_gym, now())), vec![2]);
    }

    #[test]
    fn ordering_is_stable_in_both_directions() {
        let early = ts(2025, 1, 1, 9, 0);
        let late = ts(2025, 1, 2, 9, 0);
        let events = vec![
            RecordBuilder::new(1, "Zeta", early).build(),
            RecordBuilder::new(2, "Alpha", late).build(),
            RecordBuilder::new(3, "Alpha", early).build(),
            RecordBuilder::new(4, "Alpha", early).build(),
        ];
        let asc = EventCriteria::default();
        let desc = EventCriteria {
            sort_order: SortOrder::Desc,
            ..Default::default()
        };
        assert_eq!(ids(filter_events(&events, &asc, now())), vec![3, 4, 1, 2]);
        assert_eq!(ids(filter_events(&events, &desc, now())), vec![2, 3, 4, 1]);
    }

    #[test]
    fn reapplying_a_filter_changes_nothing() {
        let base = ts(2025, 1, 1, 9, 0);
        let events = vec![
            RecordBuilder::new(1, "A", base).category(5, "Culture").build(),
            RecordBuilder::new(2, "B", base).category(6, "Sport").build(),
            RecordBuilder::new(3, "C", base).category(5, "Culture").build(),
        ];
        let criteria = EventCriteria {
            category_id: Some(5),
            ..Default::default()
        };
        let once = filter_events(&events, &criteria, now());
        let twice = filter_events(once.iter().copied(), &criteria, now());
        assert_eq!(ids(once), ids(twice));
    }
}
