pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod session;
pub mod storage;
pub mod todos;
pub mod validation;

pub use app::{Coordinator, DayView, Intent, Outcome, Surface};
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use error::{AppError, SessionError, TodoError, ValidationError};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, StoreHandle};
pub use todos::{CalendarDay, Todo, TodoFilter, TodoId, TodoRepository};
