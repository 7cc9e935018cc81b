use std::collections::BTreeSet;

use crate::index::DayStats;
use crate::session::Identity;
use crate::todos::{CalendarDay, Todo, TodoFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    SignedOut,
    SignedIn,
}

/// Everything the front end needs to draw the selected day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayView {
    pub identity: Identity,
    pub date: CalendarDay,
    pub filter: TodoFilter,
    pub todos: Vec<Todo>,
    /// Counts for the whole day, independent of `filter`.
    pub stats: DayStats,
    pub dates_with_todos: BTreeSet<CalendarDay>,
}

impl DayView {
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn can_clear_completed(&self) -> bool {
        self.stats.has_completed()
    }
}
