use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::models::{Event, EventRecord, EventStatus, Location, UserSummary};

pub(crate) fn ts(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
}

pub(crate) struct RecordBuilder(EventRecord);

impl RecordBuilder {
    pub(crate) fn new(id: i64, title: &str, date_start: DateTime<Utc>) -> Self {
        RecordBuilder(EventRecord {
            event: Event {
                id,
                title: title.to_string(),
                description: None,
                category_id: 1,
                department_id: 1,
                date_start,
                date_end: None,
                status: EventStatus::Planned,
                is_published: false,
                created_by: None,
                created_at: date_start,
                updated_at: date_start,
            },
            category_name: Some("General".to_string()),
            department_name: Some("Rectorate".to_string()),
            locations: vec![],
            responsibles: vec![],
            creator_username: None,
        })
    }

    pub(crate) fn end(mut self, date_end: DateTime<Utc>) -> Self {
        self.0.event.date_end = Some(date_end);
        self
    }

    pub(crate) fn category(mut self, id: i64, name: &str) -> Self {
        self.0.event.category_id = id;
        self.0.category_name = Some(name.to_string());
        self
    }

    pub(crate) fn uncategorized(mut self) -> Self {
        self.0.category_name = None;
        self
    }

    pub(crate) fn department(mut self, id: i64, name: &str) -> Self {
        self.0.event.department_id = id;
        self.0.department_name = Some(name.to_string());
        self
    }

    pub(crate) fn description(mut self, text: &str) -> Self {
        self.0.event.description = Some(text.to_string());
        self
    }

    pub(crate) fn location(mut self, id: i64, name: &str, address: Option<&str>) -> Self {
        self.0.locations.push(Location {
            id,
            name: name.to_string(),
            address: address.map(str::to_string),
            description: None,
        });
        self
    }

    pub(crate) fn responsible(mut self, username: &str, display_name: &str) -> Self {
        self.0.responsibles.push(UserSummary {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: display_name.to_string(),
        });
        self
    }

    pub(crate) fn status(mut self, status: EventStatus) -> Self {
        self.0.event.status = status;
        self
    }

    pub(crate) fn published(mut self) -> Self {
        self.0.event.is_published = true;
        self
    }

    pub(crate) fn created_by(mut self, user: Uuid, username: &str) -> Self {
        self.0.event.created_by = Some(user);
        self.0.creator_username = Some(username.to_string());
        self
    }

    pub(crate) fn build(self) -> EventRecord {
        self.0
    }
}
