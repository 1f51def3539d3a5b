//! Grouped report over an already filtered event list.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::EventRecord;

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const EMPTY_CELL: &str = "—";

pub const HEADERS: [&str; 12] = [
    "ID",
    "Title",
    "Status",
    "Start",
    "End",
    "Category",
    "Department",
    "Responsible",
    "Locations",
    "Published",
    "Creator",
    "Description",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub date_start: String,
    pub date_end: String,
    pub category: String,
    pub department: String,
    pub responsibles: String,
    pub locations: String,
    pub published: String,
    pub creator: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportGroup {
    pub category: String,
    pub rows: Vec<ExportRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub generated_at: DateTime<Utc>,
    pub headers: Vec<&'static str>,
    pub total: usize,
    pub groups: Vec<ExportGroup>,
}

pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%d.%m.%Y %H:%M").to_string(),
        None => EMPTY_CELL.to_string(),
    }
}

impl From<&EventRecord> for ExportRow {
    fn from(record: &EventRecord) -> Self {
        let event = &record.event;
        ExportRow {
            id: event.id,
            title: event.title.clone(),
            status: event.status.label().to_string(),
            date_start: format_timestamp(Some(event.date_start)),
            date_end: format_timestamp(event.date_end),
            category: record.category_name.clone().unwrap_or_default(),
            department: record.department_name.clone().unwrap_or_default(),
            responsibles: record
                .responsibles
                .iter()
                .map(|u| u.display_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            locations: record
                .locations
                .iter()
                .map(|l| l.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            published: if event.is_published { "Yes" } else { "No" }.to_string(),
            creator: record.creator_username.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
        }
    }
}

fn group_key(record: &EventRecord) -> &str {
    record
        .category_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNCATEGORIZED)
}

/// Sorts by (category, start, title, id) and groups in first-seen order.
pub fn group_by_category<'a, I>(records: I) -> Vec<ExportGroup>
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut sorted: Vec<&EventRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| {
        group_key(a)
            .cmp(group_key(b))
            .then_with(|| a.event.date_start.cmp(&b.event.date_start))
            .then_with(|| a.event.title.cmp(&b.event.title))
            .then_with(|| a.event.id.cmp(&b.event.id))
    });

    let mut groups: Vec<ExportGroup> = Vec::new();
    for record in sorted {
        let key = group_key(record);
        match groups.last_mut() {
            Some(group) if group.category == key => group.rows.push(ExportRow::from(record)),
            _ => groups.push(ExportGroup {
                category: key.to_string(),
                rows: vec![ExportRow::from(record)],
            }),
        }
    }
    groups
}

pub fn build_report<'a, I>(records: I, generated_at: DateTime<Utc>) -> ExportReport
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let groups = group_by_category(records);
    ExportReport {
        generated_at,
        headers: HEADERS.to_vec(),
        total: groups.iter().map(|g| g.rows.len()).sum(),
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;
    use crate::service::fixtures::{ts, RecordBuilder};
    use uuid::Uuid;

    #[test]
    fn groups_by_category_in_sorted_order() {
        let records = vec![
            RecordBuilder::new(1, "Match", ts(2025, 3, 2, 10, 0)).category(2, "Sport").build(),
            RecordBuilder::new(2, "Concert", ts(2025, 3, 5, 19, 0)).category(1, "Culture").build(),
            RecordBuilder::new(3, "Loose end", ts(2025, 3, 1, 9, 0)).uncategorized().build(),
            RecordBuilder::new(4, "Run", ts(2025, 3, 1, 8, 0)).category(2, "Sport").build(),
            RecordBuilder::new(5, "Play", ts(2025, 3, 1, 19, 0)).category(1, "Culture").build(),
        ];
        let groups = group_by_category(&records);
        let layout: Vec<(String, Vec<i64>)> = groups
            .iter()
            .map(|g| (g.category.clone(), g.rows.iter().map(|r| r.id).collect()))
            .collect();
        assert_eq!(
            layout,
            vec![
                ("Culture".to_string(), vec![5, 2]),
                ("Sport".to_string(), vec![4, 1]),
                ("Uncategorized".to_string(), vec![3]),
            ]
        );
    }

    #[test]
    fn row_is_fully_resolved() {
        let record = RecordBuilder::new(9, "Open day", ts(2025, 4, 12, 10, 0))
            .end(ts(2025, 4, 12, 16, 30))
            .category(1, "Culture")
            .department(2, "Admissions")
            .location(1, "Main hall", None)
            .location(2, "Library", None)
            .responsible("petrova", "Anna Petrova")
            .responsible("sidorov", "Ivan Sidorov")
            .status(EventStatus::Ongoing)
            .published()
            .created_by(Uuid::new_v4(), "admin")
            .build();
        let row = ExportRow::from(&record);
        assert_eq!(row.status, "Ongoing");
        assert_eq!(row.date_start, "12.04.2025 10:00");
        assert_eq!(row.date_end, "12.04.2025 16:30");
        assert_eq!(row.responsibles, "Anna Petrova, Ivan Sidorov");
        assert_eq!(row.locations, "Main hall, Library");
        assert_eq!(row.published, "Yes");
        assert_eq!(row.creator, "admin");
    }

    #[test]
    fn open_ended_event_has_placeholder_end() {
        let record = RecordBuilder::new(1, "Exhibition", ts(2025, 4, 1, 10, 0)).build();
        assert_eq!(ExportRow::from(&record).date_end, EMPTY_CELL);
    }

    #[test]
    fn report_counts_rows() {
        let records = vec![
            RecordBuilder::new(1, "A", ts(2025, 1, 1, 9, 0)).build(),
            RecordBuilder::new(2, "B", ts(2025, 1, 2, 9, 0)).build(),
        ];
        let report = build_report(&records, ts(2025, 1, 3, 0, 0));
        assert_eq!(report.total, 2);
        assert_eq!(report.headers.len(), HEADERS.len());
        assert_eq!(report.groups.len(), 1);
    }
}
