//! Read-side projections over the todo collection. Nothing here is cached;
//! every call scans the slice it is given.

use std::collections::BTreeSet;

use time::{Date, Month};

use crate::todos::{CalendarDay, Todo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayStats {
    pub active: usize,
    pub completed: usize,
}

impl DayStats {
    pub fn total(&self) -> usize {
        self.active + self.completed
    }

    pub fn has_completed(&self) -> bool {
        self.completed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthDay {
    pub day: CalendarDay,
    pub stats: DayStats,
}

pub fn dates_with_todos(items: &[Todo]) -> BTreeSet<CalendarDay> {
    items.iter().map(|todo| todo.date).collect()
}

pub fn stats_for_date(items: &[Todo], date: CalendarDay) -> DayStats {
    items
        .iter()
        .filter(|todo| todo.date == date)
        .fold(DayStats::default(), |mut stats, todo| {
            if todo.completed {
                stats.completed += 1;
            } else {
                stats.active += 1;
            }
            stats
        })
}

/// Every day of `month` in order, with its counts. Returns `None` for an
/// out-of-range year.
pub fn month_overview(items: &[Todo], year: i32, month: Month) -> Option<Vec<MonthDay>> {
    let first = Date::from_calendar_date(year, month, 1).ok()?;
    let days = time::util::days_in_year_month(year, month);
    let mut overview: Vec<MonthDay> = (0..days)
        .filter_map(|offset| first.checked_add(time::Duration::days(i64::from(offset))))
        .map(|date| MonthDay {
            day: CalendarDay::new(date),
            stats: DayStats::default(),
        })
        .collect();

    for todo in items {
        if todo.date.year() != year || todo.date.month() != month {
            continue;
        }
        let Some(entry) = overview.get_mut(usize::from(todo.date.day()) - 1) else {
            continue;
        };
        if todo.completed {
            entry.stats.completed += 1;
        } else {
            entry.stats.active += 1;
        }
    }
    Some(overview)
}
