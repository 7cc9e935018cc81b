use thiserror::Error;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("todo text cannot be empty")]
    EmptyText,

    #[error("persisting todos: {0:#}")]
    Persist(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("persisting identity: {0:#}")]
    Persist(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("sign in to manage todos")]
    SignedOut,

    #[error("{month} {year} is outside the supported calendar range")]
    MonthOutOfRange { year: i32, month: time::Month },

    #[error(transparent)]
    Todo(#[from] TodoError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Form-level input checks performed before a request reaches the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("email is required")]
    MissingEmail,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("password is required")]
    MissingPassword,

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("name is required")]
    MissingName,

    #[error("todo text cannot be empty")]
    EmptyText,
}
