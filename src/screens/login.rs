//! Login screen.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::Identity;
use crate::navigation::{Navigator, Route};
use crate::Backend;

pub struct LoginScreen {
    backend: Arc<Backend>,
    navigator: Navigator,
    email: String,
    password: String,
}

impl LoginScreen {
    pub fn new(backend: Arc<Backend>, navigator: Navigator) -> Self {
        Self {
            backend,
            navigator,
            email: String::new(),
            password: String::new(),
        }
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Sign in and open the home screen.
    ///
    /// On failure nothing navigates; show `err.user_message()` to the user.
    pub async fn submit(&self) -> Result<Identity, AppError> {
        match self
            .backend
            .session
            .sign_in(self.email.trim(), &self.password)
            .await
        {
            Ok(identity) => {
                self.navigator.push(Route::Home);
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Login failed");
                Err(e)
            }
        }
    }

    pub fn go_to_register(&self) {
        self.navigator.push(Route::Register);
    }
}
