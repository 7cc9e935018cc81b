use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::TodoError;
use crate::storage::StoreHandle;

mod day;

pub use day::{CalendarDay, ParseDayError};

pub const TODOS_KEY: &str = "todomate-todos";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub text: String,
    pub completed: bool,
    pub date: CalendarDay,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Which part of a day's list to show.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Active => !todo.completed,
            TodoFilter::Completed => todo.completed,
        }
    }
}

/// Owns the todo collection and writes it back to the store after every
/// change. Items are kept newest first.
#[derive(Debug)]
pub struct TodoRepository {
    store: StoreHandle,
    items: Vec<Todo>,
    last_created_at: i64,
}

impl TodoRepository {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            items: Vec::new(),
            last_created_at: 0,
        }
    }

    /// Loads the persisted collection, dropping entries that fail shape checks.
    /// Missing or unreadable data leaves the repository empty.
    pub fn restore(&mut self) -> anyhow::Result<usize> {
        let raw = self.store.get(TODOS_KEY)?;
        self.items = match raw {
            Some(Value::Array(entries)) => validate_entries(entries),
            Some(other) => {
                tracing::warn!(kind = value_kind(&other), "stored todos are not a list, ignoring");
                Vec::new()
            }
            None => Vec::new(),
        };
        self.last_created_at = self
            .items
            .iter()
            .map(|todo| todo.created_at)
            .max()
            .unwrap_or(0);
        tracing::debug!(count = self.items.len(), "restored todos");
        Ok(self.items.len())
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &TodoId) -> Option<&Todo> {
        self.items.iter().find(|todo| &todo.id == id)
    }

    pub fn add(&mut self, text: &str, date: CalendarDay) -> Result<Todo, TodoError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TodoError::EmptyText);
        }
        let todo = Todo {
            id: self.fresh_id(),
            text: trimmed.to_string(),
            completed: false,
            date,
            created_at: self.next_created_at(),
        };
        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(todo.clone());
        next.extend_from_slice(&self.items);
        self.commit(next)?;
        self.last_created_at = todo.created_at;
        tracing::debug!(id = %todo.id, %date, "added todo");
        Ok(todo)
    }

    /// Flips `completed`. Returns false, without writing, when `id` is unknown.
    pub fn toggle(&mut self, id: &TodoId) -> Result<bool, TodoError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.items.clone();
        next[index].completed = !next[index].completed;
        let completed = next[index].completed;
        self.commit(next)?;
        tracing::debug!(%id, completed, "toggled todo");
        Ok(true)
    }

    pub fn remove(&mut self, id: &TodoId) -> Result<bool, TodoError> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        let mut next = self.items.clone();
        next.remove(index);
        self.commit(next)?;
        tracing::debug!(%id, "removed todo");
        Ok(true)
    }

    /// Replaces the text with its trimmed form. Empty, unchanged, or unknown
    /// targets are left alone and nothing is written.
    pub fn update(&mut self, id: &TodoId, text: &str) -> Result<bool, TodoError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(false);
        }
        let Some(index) = self.position(id) else {
            return Ok(false);
        };
        if self.items[index].text == trimmed {
            return Ok(false);
        }
        let mut next = self.items.clone();
        next[index].text = trimmed.to_string();
        self.commit(next)?;
        tracing::debug!(%id, "updated todo text");
        Ok(true)
    }

    pub fn clear_completed(&mut self) -> Result<usize, TodoError> {
        let next: Vec<Todo> = self
            .items
            .iter()
            .filter(|todo| !todo.completed)
            .cloned()
            .collect();
        let removed = self.items.len() - next.len();
        if removed > 0 {
            self.commit(next)?;
            tracing::debug!(removed, "cleared completed todos");
        }
        Ok(removed)
    }

    pub fn for_date(&self, date: CalendarDay) -> Vec<Todo> {
        self.for_date_filtered(date, TodoFilter::All)
    }

    pub fn for_date_filtered(&self, date: CalendarDay, filter: TodoFilter) -> Vec<Todo> {
        self.items
            .iter()
            .filter(|todo| todo.date == date && filter.matches(todo))
            .cloned()
            .collect()
    }

    /// Writes `next` and only then adopts it, so a failed write leaves the
    /// in-memory collection matching the store.
    fn commit(&mut self, next: Vec<Todo>) -> Result<(), TodoError> {
        self.store
            .set_as(TODOS_KEY, &next)
            .map_err(TodoError::Persist)?;
        self.items = next;
        Ok(())
    }

    fn position(&self, id: &TodoId) -> Option<usize> {
        self.items.iter().position(|todo| &todo.id == id)
    }

    fn fresh_id(&self) -> TodoId {
        loop {
            let id = TodoId::generate();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    /// Saturates at `i64::MAX` when a restored stamp is already there.
    fn next_created_at(&self) -> i64 {
        let now = (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64;
        now.max(self.last_created_at.saturating_add(1))
    }
}

fn validate_entries(entries: Vec<Value>) -> Vec<Todo> {
    let total = entries.len();
    let mut seen = HashSet::new();
    let items: Vec<Todo> = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<Todo>(entry) {
            Ok(todo) if todo.text.trim().is_empty() => {
                tracing::warn!(index, id = %todo.id, "dropping stored todo with empty text");
                None
            }
            Ok(todo) if !seen.insert(todo.id.clone()) => {
                tracing::warn!(index, id = %todo.id, "dropping stored todo with duplicate id");
                None
            }
            Ok(todo) => Some(todo),
            Err(err) => {
                tracing::warn!(index, %err, "dropping malformed stored todo");
                None
            }
        })
        .collect();
    if items.len() != total {
        tracing::warn!(
            kept = items.len(),
            dropped = total - items.len(),
            "some stored todos failed validation"
        );
    }
    items
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
