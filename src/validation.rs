//! Input-shape checks the front end runs before calling into the session or
//! the repository. None of this is authentication.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AuthPolicy;
use crate::error::ValidationError;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("valid email regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Collects every problem with the form rather than stopping at the first.
pub fn check_credentials(
    credentials: &Credentials,
    mode: AuthMode,
    policy: &AuthPolicy,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if credentials.email.is_empty() {
        errors.push(ValidationError::MissingEmail);
    } else if !EMAIL_SHAPE.is_match(&credentials.email) {
        errors.push(ValidationError::InvalidEmail(credentials.email.clone()));
    }

    if credentials.password.is_empty() {
        errors.push(ValidationError::MissingPassword);
    } else if credentials.password.chars().count() < policy.min_password_len {
        errors.push(ValidationError::PasswordTooShort {
            min: policy.min_password_len,
        });
    }

    if mode == AuthMode::Signup
        && credentials
            .name
            .as_deref()
            .map_or(true, |name| name.is_empty())
    {
        errors.push(ValidationError::MissingName);
    }

    errors
}

pub fn check_todo_text(text: &str) -> Result<&str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::EmptyText)
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(email: &str, password: &str, name: Option<&str>) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn accepts_well_formed_login() {
        let errors = check_credentials(
            &creds("kim@example.com", "secret1", None),
            AuthMode::Login,
            &AuthPolicy::default(),
        );
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn reports_each_problem() {
        let errors = check_credentials(
            &creds("not-an-email", "short", Some("")),
            AuthMode::Signup,
            &AuthPolicy::default(),
        );
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidEmail("not-an-email".into()),
                ValidationError::PasswordTooShort { min: 6 },
                ValidationError::MissingName,
            ]
        );
    }

    #[test]
    fn empty_fields_are_missing_not_invalid() {
        let errors =
            check_credentials(&creds("", "", None), AuthMode::Login, &AuthPolicy::default());
        assert_eq!(
            errors,
            vec![ValidationError::MissingEmail, ValidationError::MissingPassword]
        );
    }

    #[test]
    fn email_needs_a_dotted_domain() {
        let policy = AuthPolicy::default();
        for email in ["a@b", "@example.com", "a b@c d"] {
            let errors =
                check_credentials(&creds(email, "secret1", None), AuthMode::Login, &policy);
            assert_eq!(
                errors,
                vec![ValidationError::InvalidEmail(email.into())],
                "{email}"
            );
        }
    }

    #[test]
    fn todo_text_is_trimmed() {
        assert_eq!(check_todo_text("  read  "), Ok("read"));
        assert_eq!(check_todo_text(" \n "), Err(ValidationError::EmptyText));
    }
}
