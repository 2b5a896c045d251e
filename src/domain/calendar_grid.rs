use crate::domain::models::CalendarDay;
use chrono::{Datelike, Months, NaiveDate, Weekday};
use uuid::Uuid;

pub const WEEKDAY_LABELS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    first_day_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next_month| next_month.pred_opt())
        .unwrap_or(date)
}

/// Moves `date` by whole months, clamping the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

pub fn is_same_month(left: NaiveDate, right: NaiveDate) -> bool {
    left.year() == right.year() && left.month() == right.month()
}

pub fn month_title(anchor: NaiveDate) -> String {
    anchor.format("%B %Y").to_string()
}

pub fn build_month_grid(anchor: NaiveDate) -> Vec<CalendarDay> {
    let first = first_day_of_month(anchor);
    let last = last_day_of_month(anchor);

    let mut days = Vec::with_capacity(42);

    let mut leading = Vec::new();
    let mut cursor = first;
    while cursor.weekday() != Weekday::Mon {
        let Some(previous) = cursor.pred_opt() else {
            break;
        };
        leading.push(calendar_day(previous, false));
        cursor = previous;
    }
    days.extend(leading.into_iter().rev());

    days.extend(
        first
            .iter_days()
            .take_while(|day| *day <= last)
            .map(|day| calendar_day(day, true)),
    );

    let mut cursor = last;
    while cursor.weekday() != Weekday::Sun {
        let Some(next) = cursor.succ_opt() else {
            break;
        };
        days.push(calendar_day(next, false));
        cursor = next;
    }

    days
}

fn calendar_day(date: NaiveDate, is_in_anchor_month: bool) -> CalendarDay {
    CalendarDay {
        id: Uuid::new_v4().to_string(),
        date,
        day_of_month: date.day(),
        weekday_label: date.format("%a").to_string(),
        is_in_anchor_month,
        events: Vec::new(),
    }
}
