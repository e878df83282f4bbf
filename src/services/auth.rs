// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity service client (Firebase Authentication REST API).
//!
//! Handles:
//! - Email/password sign-in and sign-up
//! - ID token refresh
//! - Account deletion (used to undo a half-finished registration)

use crate::config::Config;
use crate::error::{AppError, AuthErrorCode};
use crate::models::AuthGrant;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Fallback lifetime when the service omits or garbles `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// Authentication backend operations.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AppError>;

    /// Create an account. The new account is signed in.
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, AppError>;

    /// Exchange a refresh token for a fresh ID token.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthGrant, AppError>;

    /// Delete the account the ID token belongs to.
    async fn delete_account(&self, id_token: &str) -> Result<(), AppError>;
}

/// Firebase Authentication REST client.
#[derive(Clone)]
pub struct FirebaseAuthClient {
    http: reqwest::Client,
    identity_url: String,
    secure_token_url: String,
    api_key: String,
}

impl FirebaseAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            identity_url: config.identity_toolkit_url.clone(),
            secure_token_url: config.secure_token_url.clone(),
            api_key: config.firebase_api_key.clone(),
        }
    }

    /// POST to an `accounts:*` endpoint.
    async fn post_accounts<B: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, AppError> {
        let url = format!("{}/accounts:{}", self.identity_url, method);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::IdentityApi(e.to_string()))?;

        self.check_response_json(response).await
    }

    async fn password_grant(
        &self,
        method: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthGrant, AppError> {
        let body = PasswordRequest {
            email,
            password,
            return_secure_token: true,
        };
        let response: PasswordResponse = self.post_accounts(method, &body).await?;

        Ok(AuthGrant {
            uid: response.local_id,
            email: response.email.or_else(|| Some(email.to_string())),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_in: parse_expires_in(response.expires_in.as_deref()),
        })
    }

    /// Check response and parse JSON body.
    ///
    /// Service errors arrive as `{"error": {"message": "CODE[ : detail]"}}`.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
                let code = AuthErrorCode::from_message(&envelope.error.message);
                tracing::debug!(status = %status, code = %code, "Identity service rejected request");
                return Err(AppError::Auth(code));
            }

            return Err(AppError::IdentityApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::IdentityApi(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
        self.password_grant("signInWithPassword", email, password).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
        self.password_grant("signUp", email, password).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthGrant, AppError> {
        let url = format!("{}/token", self.secure_token_url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::IdentityApi(format!("Token refresh request failed: {}", e)))?;

        let refreshed: RefreshResponse = self.check_response_json(response).await?;

        Ok(AuthGrant {
            uid: refreshed.user_id,
            email: None,
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
            expires_in: parse_expires_in(refreshed.expires_in.as_deref()),
        })
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), AppError> {
        let _: serde_json::Value = self
            .post_accounts("delete", &DeleteRequest { id_token })
            .await?;
        tracing::info!("Account deleted");
        Ok(())
    }
}

fn parse_expires_in(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    id_token: &'a str,
}

/// `accounts:signInWithPassword` / `accounts:signUp` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    /// Seconds, as a string
    expires_in: Option<String>,
}

/// Secure Token API response (snake_case, unlike Identity Toolkit).
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
