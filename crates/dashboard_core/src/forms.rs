//! crates/dashboard_core/src/forms.rs
//!
//! Synchronous input checks the views run before calling the auth store.
//! A failed check never reaches the backend.

use serde::Deserialize;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err("Email and password are required");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.is_empty() || self.password.is_empty() || self.username.is_empty() {
            return Err("Email, password, and username are required");
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err("Password must be at least 6 characters");
        }
        Ok(())
    }
}

/// The message a form shows: its own validation error wins over the store's.
pub fn display_error<'a>(form_error: Option<&'a str>, store_error: Option<&'a str>) -> Option<&'a str> {
    form_error.or(store_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str, username: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_string(),
            password: password.to_string(),
            username: username.to_string(),
        }
    }

    #[test]
    fn login_requires_both_fields() {
        let form = LoginForm {
            email: "a@x.com".to_string(),
            password: String::new(),
        };
        assert_eq!(form.validate(), Err("Email and password are required"));

        let form = LoginForm {
            email: "a@x.com".to_string(),
            password: "x".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn register_requires_every_field() {
        assert_eq!(
            register("a@x.com", "secret1", "").validate(),
            Err("Email, password, and username are required")
        );
    }

    #[test]
    fn register_enforces_password_length() {
        assert_eq!(
            register("a@x.com", "12345", "alice").validate(),
            Err("Password must be at least 6 characters")
        );
        assert!(register("a@x.com", "123456", "alice").validate().is_ok());
    }

    #[test]
    fn password_length_counts_characters() {
        // Six characters, more than six bytes.
        assert!(register("a@x.com", "ééééé1", "alice").validate().is_ok());
    }

    #[test]
    fn form_error_takes_precedence() {
        assert_eq!(display_error(Some("local"), Some("remote")), Some("local"));
        assert_eq!(display_error(None, Some("remote")), Some("remote"));
        assert_eq!(display_error(None, None), None);
    }
}
