use crate::domain::models::{CalendarDay, Event};
use chrono::NaiveDate;
use std::collections::HashMap;

pub fn bind_events(days: Vec<CalendarDay>, events: &[Event]) -> Vec<CalendarDay> {
    let mut by_day: HashMap<NaiveDate, Vec<&Event>> = HashMap::new();
    for event in events {
        by_day.entry(event.day()).or_default().push(event);
    }

    days.into_iter()
        .map(|mut day| {
            day.events = by_day
                .get(&day.date)
                .map(|matches| matches.iter().map(|event| (*event).clone()).collect())
                .unwrap_or_default();
            day
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar_grid::build_month_grid;
    use chrono::{DateTime, NaiveDateTime, Utc};
    use proptest::prelude::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn event_at(id: &str, date_time: NaiveDateTime) -> Event {
        let created = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .expect("valid datetime")
            .with_timezone(&Utc);
        Event {
            id: id.to_string(),
            title: format!("event {id}"),
            description: None,
            date: date_time,
            time: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn evening_event_binds_to_its_calendar_day_only() {
        let evening = date(2024, 2, 15).and_hms_opt(18, 30, 0).expect("valid time");
        let grid = bind_events(build_month_grid(date(2024, 2, 1)), &[event_at("evt-1", evening)]);

        let with_events: Vec<_> = grid.iter().filter(|day| !day.events.is_empty()).collect();
        assert_eq!(with_events.len(), 1);
        assert_eq!(with_events[0].date, date(2024, 2, 15));
        assert_eq!(with_events[0].events[0].id, "evt-1");
    }

    #[test]
    fn padding_cells_receive_neighbouring_month_events() {
        let january = date(2024, 1, 30).and_hms_opt(9, 0, 0).expect("valid time");
        let grid = bind_events(build_month_grid(date(2024, 2, 1)), &[event_at("jan", january)]);
        let cell = grid
            .iter()
            .find(|day| day.date == date(2024, 1, 30))
            .expect("padding cell");
        assert!(!cell.is_in_anchor_month);
        assert_eq!(cell.events.len(), 1);
    }

    #[test]
    fn rebinding_replaces_previous_events() {
        let noon = date(2024, 2, 10).and_hms_opt(12, 0, 0).expect("valid time");
        let bound = bind_events(build_month_grid(date(2024, 2, 1)), &[event_at("old", noon)]);
        let rebound = bind_events(bound, &[]);
        assert!(rebound.iter().all(|day| day.events.is_empty()));
    }

    proptest! {
        #[test]
        fn binding_preserves_source_order_and_count(
            offsets in proptest::collection::vec((0u32..29u32, 0u32..24u32), 0..40)
        ) {
            let events: Vec<Event> = offsets
                .iter()
                .enumerate()
                .map(|(index, (day_offset, hour))| {
                    let at = date(2024, 2, 1 + day_offset)
                        .and_hms_opt(*hour, 0, 0)
                        .expect("valid time");
                    event_at(&index.to_string(), at)
                })
                .collect();

            let grid = bind_events(build_month_grid(date(2024, 2, 1)), &events);

            let total: usize = grid.iter().map(|day| day.events.len()).sum();
            prop_assert_eq!(total, events.len());
            for day in &grid {
                let expected: Vec<&str> = events
                    .iter()
                    .filter(|event| event.day() == day.date)
                    .map(|event| event.id.as_str())
                    .collect();
                let actual: Vec<&str> = day.events.iter().map(|event| event.id.as_str()).collect();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
