//! Event lifecycle derivation.
//!
//! Status follows the event window relative to `now`. `Cancelled` is only
//! ever entered or left through an explicit status change.

use chrono::{DateTime, Utc};

use crate::models::{Event, EventStatus};

pub fn derive_status(
    current: EventStatus,
    date_start: DateTime<Utc>,
    date_end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> EventStatus {
    if current == EventStatus::Cancelled {
        return EventStatus::Cancelled;
    }
    match date_end {
        Some(end) if end < now => EventStatus::Completed,
        _ if date_start <= now && now <= date_end.unwrap_or(now) => EventStatus::Ongoing,
        _ => EventStatus::Planned,
    }
}

/// Re-derives the stored status; returns whether it changed.
pub fn refresh(event: &mut Event, now: DateTime<Utc>) -> bool {
    let next = derive_status(event.status, event.date_start, event.date_end, now);
    if next == event.status {
        return false;
    }
    event.status = next;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn future_event_is_planned() {
        assert_eq!(
            derive_status(EventStatus::Planned, at(10, 9), Some(at(10, 18)), at(5, 12)),
            EventStatus::Planned
        );
    }

    #[test]
    fn running_event_is_ongoing() {
        assert_eq!(
            derive_status(EventStatus::Planned, at(10, 9), Some(at(10, 18)), at(10, 12)),
            EventStatus::Ongoing
        );
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(
            derive_status(EventStatus::Planned, at(10, 9), Some(at(10, 18)), at(10, 9)),
            EventStatus::Ongoing
        );
        assert_eq!(
            derive_status(EventStatus::Planned, at(10, 9), Some(at(10, 18)), at(10, 18)),
            EventStatus::Ongoing
        );
    }

    #[test]
    fn finished_event_is_completed() {
        assert_eq!(
            derive_status(EventStatus::Ongoing, at(10, 9), Some(at(10, 18)), at(11, 0)),
            EventStatus::Completed
        );
    }

    #[test]
    fn open_ended_event_stays_ongoing() {
        assert_eq!(
            derive_status(EventStatus::Planned, at(1, 9), None, at(31, 23)),
            EventStatus::Ongoing
        );
    }

    #[test]
    fn completed_event_moved_to_future_is_planned_again() {
        assert_eq!(
            derive_status(EventStatus::Completed, at(20, 9), None, at(10, 9)),
            EventStatus::Planned
        );
    }

    #[test]
    fn refresh_reports_changes() {
        let mut event = Event {
            id: 1,
            title: "Lecture".to_string(),
            description: None,
            category_id: 1,
            department_id: 1,
            date_start: at(10, 9),
            date_end: Some(at(10, 11)),
            status: EventStatus::Planned,
            is_published: false,
            created_by: None,
            created_at: at(1, 0),
            updated_at: at(1, 0),
        };
        assert!(refresh(&mut event, at(12, 0)));
        assert_eq!(event.status, EventStatus::Completed);
        assert!(!refresh(&mut event, at(12, 0)));
    }

    fn any_status() -> impl Strategy<Value = EventStatus> {
        prop::sample::select(EventStatus::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn derivation_is_idempotent(
            status in any_status(),
            start in 0i64..1_000_000,
            length in proptest::option::of(0i64..100_000),
            now in 0i64..1_200_000,
        ) {
            let base = at(1, 0);
            let date_start = base + Duration::minutes(start);
            let date_end = length.map(|l| date_start + Duration::minutes(l));
            let now = base + Duration::minutes(now);
            let once = derive_status(status, date_start, date_end, now);
            let twice = derive_status(once, date_start, date_end, now);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn cancelled_is_sticky(start in 0i64..1_000_000, now in 0i64..1_200_000) {
            let base = at(1, 0);
            let date_start = base + Duration::minutes(start);
            let status = derive_status(
                EventStatus::Cancelled,
                date_start,
                Some(date_start + Duration::hours(2)),
                base + Duration::minutes(now),
            );
            prop_assert_eq!(status, EventStatus::Cancelled);
        }

        #[test]
        fn past_end_is_never_ongoing(
            status in any_status(),
            start in 0i64..1_000_000,
            length in 0i64..10_000,
            gap in 1i64..10_000,
        ) {
            prop_assume!(status != EventStatus::Cancelled);
            let date_start = at(1, 0) + Duration::minutes(start);
            let date_end = date_start + Duration::minutes(length);
            let now = date_end + Duration::minutes(gap);
            prop_assert_eq!(derive_status(status, date_start, Some(date_end), now), EventStatus::Completed);
        }
    }
}
