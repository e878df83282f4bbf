//! Form validation for sign-up.

use regex::Regex;
use std::sync::LazyLock;
use validator::{Validate, ValidationErrors};

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: u64 = 6;

/// Something, `@`, something, `.`, something; no whitespace in the parts.
pub static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email regex is valid"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() as u64 >= MIN_PASSWORD_LEN
}

/// Sign-up form as submitted.
#[derive(Debug, Clone, Default, Validate)]
pub struct RegistrationForm {
    #[validate(regex(path = *EMAIL_SHAPE, message = "Not a valid email address."))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm: String,
}

impl RegistrationForm {
    /// All three fields are non-empty. Checked before any validation runs.
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty() && !self.confirm.is_empty()
    }

    /// Validate every field at once.
    pub fn check(&self) -> FieldChecks {
        match self.validate() {
            Ok(()) => FieldChecks::default(),
            Err(errors) => FieldChecks::from_errors(&errors),
        }
    }
}

/// Per-field validity flags shown next to each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChecks {
    pub email_valid: bool,
    pub password_valid: bool,
    pub passwords_match: bool,
}

impl Default for FieldChecks {
    /// Nothing flagged before the user types.
    fn default() -> Self {
        Self {
            email_valid: true,
            password_valid: true,
            passwords_match: true,
        }
    }
}

impl FieldChecks {
    fn from_errors(errors: &ValidationErrors) -> Self {
        let failed = errors.field_errors();
        Self {
            email_valid: !failed.contains_key("email"),
            password_valid: !failed.contains_key("password"),
            passwords_match: !failed.contains_key("confirm"),
        }
    }

    pub fn all_ok(&self) -> bool {
        self.email_valid && self.password_valid && self.passwords_match
    }
}
