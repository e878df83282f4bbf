// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication session: current credentials plus auth-state notifications.

use crate::error::AppError;
use crate::models::{AuthGrant, BearerToken, Identity};
use crate::services::IdentityProvider;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Margin before ID token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// Tokens for the signed-in user.
#[derive(Clone)]
struct Credentials {
    uid: String,
    email: Option<String>,
    id_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    fn from_grant(grant: AuthGrant, previous_email: Option<String>) -> Self {
        Self {
            uid: grant.uid,
            email: grant.email.or(previous_email),
            id_token: grant.id_token,
            refresh_token: grant.refresh_token,
            expires_at: Utc::now() + Duration::seconds(grant.expires_in),
        }
    }

    fn bearer(&self) -> BearerToken {
        BearerToken {
            uid: self.uid.clone(),
            token: self.id_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Signed-in state of the app.
///
/// Auth-state listeners get a `watch::Receiver`; a fresh receiver sees the
/// current state immediately and then every later transition.
pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    credentials: Mutex<Option<Credentials>>,
    state: watch::Sender<Option<Identity>>,
}

impl AuthSession {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(None);
        Self {
            provider,
            credentials: Mutex::new(None),
            state,
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let grant = self.provider.sign_in(email, password).await?;
        tracing::info!(uid = %grant.uid, "Signed in");
        Ok(self.install(grant).await)
    }

    /// Create an account; the new account becomes the signed-in user.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        let grant = self.provider.sign_up(email, password).await?;
        tracing::info!(uid = %grant.uid, "Account created");
        Ok(self.install(grant).await)
    }

    /// Forget the current credentials.
    pub async fn sign_out(&self) {
        let previous = self.credentials.lock().await.take();
        if let Some(creds) = previous {
            tracing::info!(uid = %creds.uid, "Signed out");
        }
        self.state.send_replace(None);
    }

    /// Delete the signed-in account and sign out.
    pub async fn delete_current_account(&self) -> Result<(), AppError> {
        let id_token = self.id_token().await?;
        self.provider.delete_account(&id_token).await?;
        self.sign_out().await;
        Ok(())
    }

    pub fn current_user(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    /// Listen for auth-state transitions.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    /// Get a valid (non-expiring) ID token for the signed-in user.
    pub async fn id_token(&self) -> Result<String, AppError> {
        self.bearer_token()
            .await?
            .map(|bearer| bearer.token)
            .ok_or(AppError::NotSignedIn)
    }

    /// Current ID token with its owner and expiry, or `None` when signed out.
    ///
    /// Holding the credentials lock across the refresh call serializes
    /// concurrent refreshes.
    pub async fn bearer_token(&self) -> Result<Option<BearerToken>, AppError> {
        let mut guard = self.credentials.lock().await;
        let Some(creds) = guard.as_ref() else {
            return Ok(None);
        };

        let margin = Duration::seconds(TOKEN_REFRESH_MARGIN_SECS);
        if Utc::now() + margin < creds.expires_at {
            return Ok(Some(creds.bearer()));
        }

        tracing::debug!(uid = %creds.uid, "ID token expiring, refreshing");
        let grant = self.provider.refresh(&creds.refresh_token).await?;
        let refreshed = Credentials::from_grant(grant, creds.email.clone());
        let bearer = refreshed.bearer();
        *guard = Some(refreshed);
        Ok(Some(bearer))
    }

    async fn install(&self, grant: AuthGrant) -> Identity {
        let identity = grant.identity();
        let creds = Credentials::from_grant(grant, None);
        *self.credentials.lock().await = Some(creds);
        self.state.send_replace(Some(identity.clone()));
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        expires_in: i64,
        refreshes: AtomicUsize,
    }

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn sign_in(&self, email: &str, _password: &str) -> Result<AuthGrant, AppError> {
            Ok(AuthGrant {
                uid: "uid-1".to_string(),
                email: Some(email.to_string()),
                id_token: "id-0".to_string(),
                refresh_token: "refresh".to_string(),
                expires_in: self.expires_in,
            })
        }

        async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
            self.sign_in(email, password).await
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<AuthGrant, AppError> {
            let n = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AuthGrant {
                uid: "uid-1".to_string(),
                email: None,
                id_token: format!("id-{}", n),
                refresh_token: "refresh".to_string(),
                expires_in: 3600,
            })
        }

        async fn delete_account(&self, _id_token: &str) -> Result<(), AppError> {
            Ok(())
        }
    }

    fn session(expires_in: i64) -> AuthSession {
        AuthSession::new(Arc::new(StubProvider {
            expires_in,
            refreshes: AtomicUsize::new(0),
        }))
    }

    #[tokio::test]
    async fn test_subscriber_sees_current_state_then_transitions() {
        let session = session(3600);
        let mut rx = session.subscribe();
        assert!(rx.borrow_and_update().is_none());

        session.sign_in("cat@example.com", "secret1").await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().uid, "uid-1");

        session.sign_out().await;
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_id_token_requires_sign_in() {
        let session = session(3600);
        assert!(matches!(session.id_token().await, Err(AppError::NotSignedIn)));
    }

    #[tokio::test]
    async fn test_bearer_token_follows_sign_in_and_sign_out() {
        let session = session(3600);
        assert_eq!(session.bearer_token().await.unwrap(), None);

        session.sign_in("cat@example.com", "secret1").await.unwrap();
        let bearer = session.bearer_token().await.unwrap().unwrap();
        assert_eq!(bearer.uid, "uid-1");
        assert_eq!(bearer.token, "id-0");
        assert!(bearer.expires_at > Utc::now() + Duration::minutes(59));

        session.sign_out().await;
        assert_eq!(session.bearer_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fresh_token_is_reused() {
        let session = session(3600);
        session.sign_in("cat@example.com", "secret1").await.unwrap();
        assert_eq!(session.id_token().await.unwrap(), "id-0");
        assert_eq!(session.id_token().await.unwrap(), "id-0");
    }

    #[tokio::test]
    async fn test_expiring_token_is_refreshed_once() {
        // Inside the refresh margin from the start.
        let session = session(60);
        session.sign_in("cat@example.com", "secret1").await.unwrap();

        assert_eq!(session.id_token().await.unwrap(), "id-1");
        assert_eq!(session.id_token().await.unwrap(), "id-1");
        // Refresh responses carry no email; the old one is kept.
        assert_eq!(
            session.credentials.lock().await.as_ref().unwrap().email.as_deref(),
            Some("cat@example.com")
        );
    }

    #[tokio::test]
    async fn test_delete_current_account_signs_out() {
        let session = session(3600);
        session.sign_in("cat@example.com", "secret1").await.unwrap();
        session.delete_current_account().await.unwrap();
        assert!(session.current_user().is_none());
    }
}
