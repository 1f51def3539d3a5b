use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use mplan_service::{
    config::Settings,
    dto::EventListQuery,
    models::{Event, EventRecord, EventStatus, UserSummary},
    service::{
        access::{visible_events, Principal, Role},
        event::{export_report, list_page},
        export::UNCATEGORIZED,
        filter::{filter_events, EventCriteria},
        pagination::paginate,
    },
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
}

fn record(id: i64, title: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> EventRecord {
    EventRecord {
        event: Event {
            id,
            title: title.to_string(),
            description: None,
            category_id: 1,
            department_id: 1,
            date_start: start,
            date_end: end,
            status: EventStatus::Planned,
            is_published: false,
            created_by: None,
            created_at: start,
            updated_at: start,
        },
        category_name: Some("Lectures".to_string()),
        department_name: Some("Physics".to_string()),
        locations: vec![],
        responsibles: vec![],
        creator_username: None,
    }
}

fn admin() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        username: "root".to_string(),
        department_id: None,
        role: Role::Admin,
    }
}

fn settings() -> Settings {
    Settings {
        database_url: "postgres://localhost/unused".to_string(),
        db_max_connections: 1,
        host: "127.0.0.1".to_string(),
        port: 8080,
        jwt_secret: "secret".to_string(),
        access_token_ttl_secs: 60,
        page_size: 20,
        max_page_size: 100,
    }
}

fn query(pairs: &[(&str, &str)]) -> EventListQuery {
    let map: serde_json::Map<String, serde_json::Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    serde_json::from_value(serde_json::Value::Object(map)).unwrap()
}

fn ids(records: &[&EventRecord]) -> Vec<i64> {
    records.iter().map(|r| r.event.id).collect()
}

#[test]
fn every_search_term_must_hit_some_field() {
    let mut beta = record(1, "Alpha Day", at(2025, 3, 1), None);
    beta.department_name = Some("Beta Wing".to_string());
    let mut gamma = record(2, "Alpha Day", at(2025, 3, 2), None);
    gamma.department_name = Some("Gamma Wing".to_string());
    let records = vec![beta, gamma];

    let criteria = EventCriteria::from_query(&query(&[("q", "alpha beta")]));
    let found = filter_events(&records, &criteria, at(2025, 1, 1));
    assert_eq!(ids(&found), vec![1]);
}

#[test]
fn date_range_matches_partial_overlap() {
    let records = vec![
        record(1, "Overlapping", at(2025, 1, 5), Some(at(2025, 1, 12))),
        record(2, "Later", at(2025, 1, 21), Some(at(2025, 1, 25))),
        record(3, "Last day", at(2025, 1, 20), None),
    ];
    let criteria = EventCriteria::from_query(&query(&[
        ("start_date", "2025-01-10"),
        ("end_date", "2025-01-20"),
    ]));
    let found = filter_events(&records, &criteria, at(2025, 1, 1));
    assert_eq!(ids(&found), vec![1, 3]);
}

#[test]
fn empty_page_is_page_one_of_one() {
    let empty: Vec<EventRecord> = vec![];
    let page = paginate(&empty, 20, 5);
    assert!(page.items.is_empty());
    assert_eq!(page.page_number, 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.total_count, 0);
}

#[test]
fn department_head_sees_own_events_in_other_departments() {
    let head = Principal {
        id: Uuid::new_v4(),
        username: "head".to_string(),
        department_id: Some(1),
        role: Role::DepartmentHead,
    };
    let mut own_elsewhere = record(1, "Own", at(2025, 2, 1), None);
    own_elsewhere.event.department_id = 2;
    own_elsewhere.event.created_by = Some(head.id);
    let in_department = record(2, "Department", at(2025, 2, 2), None);
    let mut foreign = record(3, "Foreign", at(2025, 2, 3), None);
    foreign.event.department_id = 2;
    let records = vec![own_elsewhere, in_department, foreign];

    assert_eq!(ids(&visible_events(&records, Some(&head))), vec![1, 2]);
    assert!(visible_events(&records, None).is_empty());
}

#[test]
fn malformed_criteria_return_the_full_visible_list() {
    let records: Vec<EventRecord> = (1..=3)
        .map(|id| record(id, "Talk", at(2025, 4, id as u32), None))
        .collect();
    let page = list_page(
        &records,
        Some(&admin()),
        &query(&[("month", "13"), ("category_id", "abc"), ("page", "x")]),
        &settings(),
        at(2025, 1, 1),
    );
    assert_eq!(page.total_count, 3);
    assert_eq!(page.page_number, 1);
}

#[test]
fn reapplying_a_category_filter_changes_nothing() {
    let mut other = record(2, "Other", at(2025, 5, 2), None);
    other.event.category_id = 7;
    let records = vec![record(1, "One", at(2025, 5, 1), None), other];
    let criteria = EventCriteria::from_query(&query(&[("category_id", "7")]));

    let once = filter_events(&records, &criteria, at(2025, 1, 1));
    let twice = filter_events(once.iter().copied(), &criteria, at(2025, 1, 1));
    assert_eq!(ids(&once), vec![2]);
    assert_eq!(ids(&once), ids(&twice));
}

#[test]
fn descending_order_keeps_title_tie_break() {
    let records = vec![
        record(1, "Zeta", at(2025, 6, 1), None),
        record(2, "Alpha", at(2025, 6, 1), None),
        record(3, "Mid", at(2025, 6, 2), None),
    ];
    let page = list_page(
        &records,
        Some(&admin()),
        &query(&[("sort", "desc")]),
        &settings(),
        at(2025, 1, 1),
    );
    let order: Vec<i64> = page.items.iter().map(|r| r.event.id).collect();
    assert_eq!(order, vec![3, 2, 1]);
}

#[test]
fn export_groups_by_category_with_uncategorized_bucket() {
    let mut orphan = record(1, "Orphan", at(2025, 7, 1), None);
    orphan.category_name = None;
    let mut talk = record(2, "Talk", at(2025, 7, 3), Some(at(2025, 7, 3)));
    talk.responsibles.push(UserSummary {
        id: Uuid::new_v4(),
        username: "ivanov".to_string(),
        display_name: "Ivan Ivanov".to_string(),
    });
    let early = record(3, "Early talk", at(2025, 7, 2), None);
    let records = vec![orphan, talk, early];

    let report = export_report(&records, Some(&admin()), &EventListQuery::default(), at(2025, 8, 1));
    assert_eq!(report.total, 3);
    let categories: Vec<&str> = report.groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(categories, vec!["Lectures", UNCATEGORIZED]);
    let lecture_ids: Vec<i64> = report.groups[0].rows.iter().map(|r| r.id).collect();
    assert_eq!(lecture_ids, vec![3, 2]);
}
