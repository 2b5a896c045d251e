use crate::domain::calendar_grid::{first_day_of_month, last_day_of_month, shift_month};
use crate::domain::models::Event;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    pub fn around(anchor: NaiveDate) -> Self {
        Self {
            start: first_day_of_month(shift_month(anchor, -1)),
            end: last_day_of_month(shift_month(anchor, 1)),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn filter(&self, events: Vec<Event>) -> Vec<Event> {
        events
            .into_iter()
            .filter(|event| self.contains(event.day()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn window_spans_previous_through_next_month() {
        let window = FetchWindow::around(date(2024, 1, 31));
        assert_eq!(window.start, date(2023, 12, 1));
        assert_eq!(window.end, date(2024, 2, 29));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let window = FetchWindow::around(date(2024, 6, 15));
        assert!(window.contains(date(2024, 5, 1)));
        assert!(window.contains(date(2024, 7, 31)));
        assert!(!window.contains(date(2024, 4, 30)));
        assert!(!window.contains(date(2024, 8, 1)));
    }
}
