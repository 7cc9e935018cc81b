use crate::todos::{CalendarDay, TodoFilter, TodoId};

/// A user intent raised by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Login {
        email: String,
        password: String,
    },
    Signup {
        email: String,
        password: String,
        name: String,
    },
    Logout,
    SelectDate(CalendarDay),
    SetFilter(TodoFilter),
    AddTodo(String),
    ToggleTodo(TodoId),
    DeleteTodo(TodoId),
    EditTodo {
        id: TodoId,
        text: String,
    },
    ClearCompleted,
}

/// What a dispatched intent changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SignedIn { name: String },
    SignedOut,
    Selected,
    Added(TodoId),
    Changed,
    Unchanged,
    Cleared(usize),
}

impl Outcome {
    pub(super) fn from_applied(applied: bool) -> Self {
        if applied {
            Outcome::Changed
        } else {
            Outcome::Unchanged
        }
    }
}
