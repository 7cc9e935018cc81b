use anyhow::{Context, Result};

use crate::error::AppError;
use crate::index;
use crate::session::{Identity, SessionManager};
use crate::storage::StoreHandle;
use crate::todos::{CalendarDay, Todo, TodoFilter, TodoId, TodoRepository};

mod actions;
pub mod state;

pub use actions::{Intent, Outcome};
pub use state::{DayView, Surface};

/// Ties the session, the todo repository and the date projections together
/// and tracks which day and filter the user is looking at.
#[derive(Debug)]
pub struct Coordinator {
    session: SessionManager,
    todos: TodoRepository,
    selected_date: CalendarDay,
    filter: TodoFilter,
}

impl Coordinator {
    pub fn new(
        session: SessionManager,
        todos: TodoRepository,
        selected_date: CalendarDay,
    ) -> Self {
        Self {
            session,
            todos,
            selected_date,
            filter: TodoFilter::All,
        }
    }

    /// Builds both components on `store` and restores their persisted state.
    pub fn open(store: StoreHandle, selected_date: CalendarDay) -> Result<Self> {
        let mut session = SessionManager::new(store.clone());
        session.restore().context("restoring session")?;
        let mut todos = TodoRepository::new(store);
        todos.restore().context("restoring todos")?;
        Ok(Self::new(session, todos, selected_date))
    }

    pub fn with_filter(mut self, filter: TodoFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn surface(&self) -> Surface {
        if self.session.is_signed_in() {
            Surface::SignedIn
        } else {
            Surface::SignedOut
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.current()
    }

    pub fn selected_date(&self) -> CalendarDay {
        self.selected_date
    }

    pub fn filter(&self) -> TodoFilter {
        self.filter
    }

    pub fn login(&mut self, email: &str, password: &str) -> Result<&Identity, AppError> {
        Ok(self.session.login(email, password)?)
    }

    pub fn signup(
        &mut self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<&Identity, AppError> {
        Ok(self.session.signup(email, password, name)?)
    }

    /// Ends the session. The todo collection stays in memory and in the store.
    pub fn logout(&mut self) -> Result<(), AppError> {
        Ok(self.session.logout()?)
    }

    pub fn select_date(&mut self, date: CalendarDay) {
        self.selected_date = date;
    }

    pub fn set_filter(&mut self, filter: TodoFilter) {
        self.filter = filter;
    }

    pub fn add_todo(&mut self, text: &str) -> Result<Todo, AppError> {
        self.require_session()?;
        let date = self.selected_date;
        Ok(self.todos.add(text, date)?)
    }

    pub fn toggle_todo(&mut self, id: &TodoId) -> Result<bool, AppError> {
        self.require_session()?;
        Ok(self.todos.toggle(id)?)
    }

    pub fn delete_todo(&mut self, id: &TodoId) -> Result<bool, AppError> {
        self.require_session()?;
        Ok(self.todos.remove(id)?)
    }

    pub fn edit_todo(&mut self, id: &TodoId, text: &str) -> Result<bool, AppError> {
        self.require_session()?;
        Ok(self.todos.update(id, text)?)
    }

    pub fn clear_completed(&mut self) -> Result<usize, AppError> {
        self.require_session()?;
        Ok(self.todos.clear_completed()?)
    }

    /// All todos, for id lookups by the front end.
    pub fn todos(&self) -> Result<&[Todo], AppError> {
        self.require_session()?;
        Ok(self.todos.items())
    }

    pub fn view(&self) -> Result<DayView, AppError> {
        let identity = self.require_session()?.clone();
        let items = self.todos.items();
        Ok(DayView {
            identity,
            date: self.selected_date,
            filter: self.filter,
            todos: self
                .todos
                .for_date_filtered(self.selected_date, self.filter),
            stats: index::stats_for_date(items, self.selected_date),
            dates_with_todos: index::dates_with_todos(items),
        })
    }

    pub fn month(&self, year: i32, month: time::Month) -> Result<Vec<index::MonthDay>, AppError> {
        self.require_session()?;
        index::month_overview(self.todos.items(), year, month)
            .ok_or(AppError::MonthOutOfRange { year, month })
    }

    pub fn dispatch(&mut self, intent: Intent) -> Result<Outcome, AppError> {
        tracing::debug!(?intent, "dispatching intent");
        let outcome = match intent {
            Intent::Login { email, password } => {
                let identity = self.login(&email, &password)?;
                Outcome::SignedIn {
                    name: identity.name.clone(),
                }
            }
            Intent::Signup {
                email,
                password,
                name,
            } => {
                let identity = self.signup(&email, &password, &name)?;
                Outcome::SignedIn {
                    name: identity.name.clone(),
                }
            }
            Intent::Logout => {
                self.logout()?;
                Outcome::SignedOut
            }
            Intent::SelectDate(date) => {
                self.select_date(date);
                Outcome::Selected
            }
            Intent::SetFilter(filter) => {
                self.set_filter(filter);
                Outcome::Selected
            }
            Intent::AddTodo(text) => Outcome::Added(self.add_todo(&text)?.id),
            Intent::ToggleTodo(id) => Outcome::from_applied(self.toggle_todo(&id)?),
            Intent::DeleteTodo(id) => Outcome::from_applied(self.delete_todo(&id)?),
            Intent::EditTodo { id, text } => Outcome::from_applied(self.edit_todo(&id, &text)?),
            Intent::ClearCompleted => Outcome::Cleared(self.clear_completed()?),
        };
        Ok(outcome)
    }

    fn require_session(&self) -> Result<&Identity, AppError> {
        self.session.current().ok_or(AppError::SignedOut)
    }
}
