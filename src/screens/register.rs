// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration screen.
//!
//! Flow: editing → validating → duplicate check → submitting → succeeded or
//! failed. Inputs are re-checked on every keystroke; submit re-validates all
//! three fields, rejects a taken email (a failed lookup counts as taken),
//! then creates the account and its user record, in that order. If the
//! record cannot be written the new account is deleted again so no identity
//! is left without a record.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::AppError;
use crate::models::{Identity, UserRecord};
use crate::navigation::{Navigator, Route};
use crate::validation::{is_valid_email, is_valid_password, FieldChecks, RegistrationForm};
use crate::Backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationPhase {
    #[default]
    Editing,
    Validating,
    CheckingDuplicate,
    Submitting,
    Succeeded,
    Failed,
}

impl RegistrationPhase {
    pub fn is_busy(self) -> bool {
        matches!(
            self,
            Self::Validating | Self::CheckingDuplicate | Self::Submitting
        )
    }
}

/// Everything the registration UI renders.
#[derive(Debug, Clone, Default)]
pub struct RegisterState {
    pub form: RegistrationForm,
    pub checks: FieldChecks,
    pub email_duplicate: bool,
    pub show_password: bool,
    pub phase: RegistrationPhase,
}

impl RegisterState {
    /// The submit button is enabled when every field has text and nothing is
    /// in flight. Validity does not matter here.
    pub fn can_submit(&self) -> bool {
        self.form.is_complete() && !self.phase.is_busy()
    }
}

/// Why a submit did not register an account.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Every field is required")]
    Incomplete,

    #[error("Registration already in progress")]
    Busy,

    #[error("Invalid input: {0:?}")]
    InvalidInput(FieldChecks),

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Account creation failed: {0}")]
    SignUp(#[source] AppError),

    #[error("User record creation failed: {0}")]
    Profile(#[source] AppError),
}

impl RegistrationError {
    /// Message suitable for an alert dialog.
    pub fn user_message(&self) -> String {
        match self {
            Self::Incomplete | Self::InvalidInput(_) => "Please check your input.".to_string(),
            Self::Busy => "Please wait.".to_string(),
            Self::DuplicateEmail => "This email is already registered.".to_string(),
            Self::SignUp(AppError::Auth(code)) => code.user_message().to_string(),
            Self::SignUp(_) | Self::Profile(_) => "Sign-up failed.".to_string(),
        }
    }
}

enum SubmitGate {
    Started(RegistrationForm),
    Busy,
    Incomplete,
}

pub struct RegisterScreen {
    backend: Arc<Backend>,
    navigator: Navigator,
    state: watch::Sender<RegisterState>,
}

impl RegisterScreen {
    pub fn new(backend: Arc<Backend>, navigator: Navigator) -> Self {
        let (state, _) = watch::channel(RegisterState::default());
        Self {
            backend,
            navigator,
            state,
        }
    }

    pub fn state(&self) -> watch::Receiver<RegisterState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> RegisterState {
        self.state.borrow().clone()
    }

    pub fn can_submit(&self) -> bool {
        self.state.borrow().can_submit()
    }

    pub fn set_email(&self, email: &str) {
        self.state.send_modify(|s| {
            s.form.email = email.to_string();
            s.checks.email_valid = is_valid_email(email);
            s.email_duplicate = false;
        });
    }

    pub fn set_password(&self, password: &str) {
        self.state.send_modify(|s| {
            s.form.password = password.to_string();
            s.checks.password_valid = is_valid_password(password);
        });
    }

    pub fn set_confirm(&self, confirm: &str) {
        self.state.send_modify(|s| {
            s.form.confirm = confirm.to_string();
            s.checks.passwords_match = s.form.password == confirm;
        });
    }

    pub fn toggle_password_visibility(&self) {
        self.state.send_modify(|s| s.show_password = !s.show_password);
    }

    pub fn go_back(&self) -> bool {
        self.navigator.back()
    }

    /// Validate, check for a duplicate email, then create the account and
    /// its user record. On success the login screen is opened.
    pub async fn submit(&self) -> Result<Identity, RegistrationError> {
        let mut gate = SubmitGate::Incomplete;
        self.state.send_if_modified(|s| {
            if s.phase.is_busy() {
                gate = SubmitGate::Busy;
                return false;
            }
            if !s.form.is_complete() {
                return false;
            }
            s.phase = RegistrationPhase::Validating;
            gate = SubmitGate::Started(s.form.clone());
            true
        });

        let form = match gate {
            SubmitGate::Started(form) => form,
            SubmitGate::Busy => return Err(RegistrationError::Busy),
            SubmitGate::Incomplete => return Err(RegistrationError::Incomplete),
        };

        let result = self.register(&form).await;

        let phase = match result {
            Ok(_) => RegistrationPhase::Succeeded,
            Err(RegistrationError::InvalidInput(_)) => RegistrationPhase::Editing,
            Err(_) => RegistrationPhase::Failed,
        };
        self.state.send_modify(|s| s.phase = phase);

        if result.is_ok() {
            self.navigator.push(Route::Login);
        }
        result
    }

    async fn register(&self, form: &RegistrationForm) -> Result<Identity, RegistrationError> {
        let checks = form.check();
        self.state.send_modify(|s| s.checks = checks);
        if !checks.all_ok() {
            return Err(RegistrationError::InvalidInput(checks));
        }

        self.set_phase(RegistrationPhase::CheckingDuplicate);
        match self.backend.users.email_exists(&form.email).await {
            Ok(false) => {}
            Ok(true) => {
                self.state.send_modify(|s| s.email_duplicate = true);
                return Err(RegistrationError::DuplicateEmail);
            }
            Err(e) => {
                // Fail closed: an unverifiable email is treated as taken.
                tracing::error!(error = %e, "Duplicate email check failed");
                return Err(RegistrationError::DuplicateEmail);
            }
        }

        self.set_phase(RegistrationPhase::Submitting);
        let session = &self.backend.session;
        let identity = session
            .sign_up(&form.email, &form.password)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Account creation failed");
                RegistrationError::SignUp(e)
            })?;

        let record = UserRecord::new_registration(&form.email);
        if let Err(e) = self.backend.users.upsert_user(&identity.uid, &record).await {
            tracing::error!(uid = %identity.uid, error = %e, "User record creation failed, removing account");
            if let Err(cleanup) = session.delete_current_account().await {
                tracing::error!(
                    uid = %identity.uid,
                    error = %cleanup,
                    "Account removal failed; account has no user record"
                );
            }
            return Err(RegistrationError::Profile(e));
        }

        tracing::info!(uid = %identity.uid, "Registration complete");
        Ok(identity)
    }

    fn set_phase(&self, phase: RegistrationPhase) {
        self.state.send_modify(|s| s.phase = phase);
    }
}
