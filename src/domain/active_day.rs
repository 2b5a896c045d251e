use crate::domain::calendar_grid::is_same_month;
use crate::domain::models::{ActiveDaySelection, CalendarDay};
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResolution {
    pub selection: ActiveDaySelection,
    pub changed: bool,
}

/// The persisted id is never consulted: a selection in the anchor month is mapped by day-of-month
/// offset, anything else falls back to the first in-month cell.
pub fn resolve_active_day(
    grid: &[CalendarDay],
    persisted: Option<&ActiveDaySelection>,
    today: NaiveDate,
) -> Option<SelectionResolution> {
    let in_month: Vec<&CalendarDay> = grid.iter().filter(|day| day.is_in_anchor_month).collect();
    let first = *in_month.first()?;

    let Some(persisted) = persisted else {
        let day = in_month
            .iter()
            .copied()
            .find(|day| day.date == today)
            .unwrap_or(first);
        return Some(SelectionResolution {
            selection: ActiveDaySelection::for_day(day),
            changed: true,
        });
    };

    if is_same_month(persisted.date, first.date) {
        let offset = persisted.date.day0() as usize;
        return Some(match in_month.get(offset) {
            Some(day) => SelectionResolution {
                selection: ActiveDaySelection::for_day(day),
                changed: false,
            },
            None => SelectionResolution {
                selection: ActiveDaySelection::for_day(first),
                changed: true,
            },
        });
    }

    Some(SelectionResolution {
        selection: ActiveDaySelection::for_day(first),
        changed: true,
    })
}
