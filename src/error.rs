// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with user-facing messages.

use crate::config::ConfigError;
use std::fmt;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Authentication failed: {0}")]
    Auth(AuthErrorCode),

    #[error("Identity service error: {0}")]
    IdentityApi(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Device service error: {0}")]
    Device(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message suitable for an alert dialog.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(code) => code.user_message().to_string(),
            AppError::NotSignedIn => "Please sign in first.".to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Device(_) => "Could not reach the device server.".to_string(),
            AppError::Database(_) => "Please try again in a moment.".to_string(),
            _ => "Something went wrong.".to_string(),
        }
    }

    /// True when the identity service rejected the request with `code`.
    pub fn is_auth_code(&self, code: &AuthErrorCode) -> bool {
        matches!(self, AppError::Auth(c) if c == code)
    }
}

/// Error codes reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    EmailExists,
    InvalidEmail,
    WeakPassword,
    OperationNotAllowed,
    ConfigurationNotFound,
    EmailNotFound,
    InvalidPassword,
    InvalidLoginCredentials,
    UserDisabled,
    TooManyAttempts,
    TokenExpired,
    Other(String),
}

impl AuthErrorCode {
    /// Parse the `error.message` field of an identity service error body.
    ///
    /// Some messages carry a detail suffix (`WEAK_PASSWORD : Password should
    /// be at least 6 characters`); only the leading code is significant.
    pub fn from_message(message: &str) -> Self {
        let code = message.split(':').next().unwrap_or_default().trim();
        match code {
            "EMAIL_EXISTS" => Self::EmailExists,
            "INVALID_EMAIL" => Self::InvalidEmail,
            "WEAK_PASSWORD" => Self::WeakPassword,
            "OPERATION_NOT_ALLOWED" => Self::OperationNotAllowed,
            "CONFIGURATION_NOT_FOUND" => Self::ConfigurationNotFound,
            "EMAIL_NOT_FOUND" => Self::EmailNotFound,
            "INVALID_PASSWORD" => Self::InvalidPassword,
            "INVALID_LOGIN_CREDENTIALS" => Self::InvalidLoginCredentials,
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" => Self::TokenExpired,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn user_message(&self) -> &str {
        match self {
            Self::EmailExists => "This email is already in use.",
            Self::InvalidEmail => "The email address is not valid.",
            Self::WeakPassword => "The password is too weak.",
            Self::OperationNotAllowed => "Email/password sign-up is disabled.",
            Self::ConfigurationNotFound => {
                "The authentication backend is misconfigured. Please restart the app."
            }
            Self::EmailNotFound | Self::InvalidPassword | Self::InvalidLoginCredentials => {
                "Incorrect email or password."
            }
            Self::UserDisabled => "This account has been disabled.",
            Self::TooManyAttempts => "Too many attempts. Try again later.",
            Self::TokenExpired => "Your session has expired. Please sign in again.",
            Self::Other(_) => "Sign-up failed.",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "{}", code),
            known => write!(f, "{:?}", known),
        }
    }
}

/// Result type alias for fallible operations.
pub type Result<T, E = AppError> = std::result::Result<T, E>;
