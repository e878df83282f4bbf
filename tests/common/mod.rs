// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dashmap::DashMap;
use parking_lot::Mutex;
use petwatch::config::Config;
use petwatch::db::{FirestoreDb, MemoryUserStore};
use petwatch::error::{AppError, AuthErrorCode};
use petwatch::models::AuthGrant;
use petwatch::services::IdentityProvider;
use petwatch::Backend;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Identity provider keeping accounts in memory.
#[derive(Default)]
pub struct FakeIdentityProvider {
    /// email -> (uid, password)
    accounts: DashMap<String, (String, String)>,
    next_uid: AtomicUsize,
    fail_sign_up: AtomicBool,
    /// Token handed out instead of `id-token-<uid>`.
    fixed_id_token: Option<String>,
    pub deletes: AtomicUsize,
}

#[allow(dead_code)]
impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose grants all carry `id_token`.
    pub fn with_id_token(id_token: &str) -> Self {
        Self {
            fixed_id_token: Some(id_token.to_string()),
            ..Self::default()
        }
    }

    pub fn add_account(&self, email: &str, password: &str) -> String {
        let uid = format!("uid-{}", self.next_uid.fetch_add(1, Ordering::SeqCst));
        self.accounts
            .insert(email.to_string(), (uid.clone(), password.to_string()));
        uid
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.accounts.contains_key(email)
    }

    pub fn set_fail_sign_up(&self, fail: bool) {
        self.fail_sign_up.store(fail, Ordering::SeqCst);
    }

    fn grant(&self, uid: &str, email: &str) -> AuthGrant {
        AuthGrant {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            id_token: self
                .fixed_id_token
                .clone()
                .unwrap_or_else(|| format!("id-token-{}", uid)),
            refresh_token: format!("refresh-{}", uid),
            expires_in: 3600,
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
        match self.accounts.get(email) {
            Some(account) if account.1 == password => Ok(self.grant(&account.0, email)),
            _ => Err(AppError::Auth(AuthErrorCode::InvalidLoginCredentials)),
        }
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthGrant, AppError> {
        if self.fail_sign_up.load(Ordering::SeqCst) {
            return Err(AppError::IdentityApi("Simulated outage".to_string()));
        }
        if self.accounts.contains_key(email) {
            return Err(AppError::Auth(AuthErrorCode::EmailExists));
        }
        let uid = self.add_account(email, password);
        Ok(self.grant(&uid, email))
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<AuthGrant, AppError> {
        Err(AppError::Auth(AuthErrorCode::TokenExpired))
    }

    async fn delete_account(&self, id_token: &str) -> Result<(), AppError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let uid = id_token.trim_start_matches("id-token-");
        self.accounts.retain(|_, account| account.0 != uid);
        Ok(())
    }
}

/// Backend over fakes plus handles to poke them.
#[allow(dead_code)]
pub struct TestBackend {
    pub backend: Arc<Backend>,
    pub identity: Arc<FakeIdentityProvider>,
    pub users: Arc<MemoryUserStore>,
}

#[allow(dead_code)]
pub fn test_backend(config: Config) -> TestBackend {
    let identity = Arc::new(FakeIdentityProvider::new());
    let users = Arc::new(MemoryUserStore::new());
    let backend = Backend::from_parts(config, identity.clone(), users.clone());
    TestBackend {
        backend: Arc::new(backend),
        identity,
        users,
    }
}

/// Config pointing at `device_base_url` with a short poll interval.
#[allow(dead_code)]
pub fn fast_config(device_base_url: &str) -> Config {
    Config {
        device_base_url: device_base_url.to_string(),
        status_poll_interval: Duration::from_millis(50),
        ..Config::default()
    }
}

/// What the fake device answers on `/status`.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum StatusReply {
    Status(&'static str),
    Malformed,
    ServerError,
}

/// Device service double served over real HTTP.
#[allow(dead_code)]
#[derive(Clone)]
pub struct FakeDevice {
    status: Arc<Mutex<StatusReply>>,
    capture: Arc<Mutex<Option<&'static str>>>,
    pub status_hits: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl FakeDevice {
    pub fn set_status(&self, reply: StatusReply) {
        *self.status.lock() = reply;
    }

    /// `None` makes `/capture` fail with 500.
    pub fn set_capture(&self, status: Option<&'static str>) {
        *self.capture.lock() = status;
    }

    pub fn hits(&self) -> usize {
        self.status_hits.load(Ordering::SeqCst)
    }
}

#[allow(dead_code)]
async fn device_status(State(device): State<FakeDevice>) -> Response {
    device.status_hits.fetch_add(1, Ordering::SeqCst);
    let reply = device.status.lock().clone();
    match reply {
        StatusReply::Status(s) => Json(serde_json::json!({ "status": s })).into_response(),
        StatusReply::Malformed => "definitely not json".into_response(),
        StatusReply::ServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

#[allow(dead_code)]
async fn device_capture(State(device): State<FakeDevice>) -> Response {
    let capture = *device.capture.lock();
    match capture {
        Some(s) => Json(serde_json::json!({ "status": s })).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Start a fake device on an ephemeral port. Returns it and its base URL.
#[allow(dead_code)]
pub async fn spawn_device(initial: StatusReply) -> (FakeDevice, String) {
    let device = FakeDevice {
        status: Arc::new(Mutex::new(initial)),
        capture: Arc::new(Mutex::new(Some("ok"))),
        status_hits: Arc::new(AtomicUsize::new(0)),
    };

    let app = Router::new()
        .route("/status", get(device_status))
        .route("/capture", get(device_capture))
        .with_state(device.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (device, format!("http://{}", addr))
}

/// Base URL nothing listens on.
#[allow(dead_code)]
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Wait until `rx` holds a value matching `pred`, failing after 5 s.
#[allow(dead_code)]
pub async fn wait_until<T>(
    rx: &mut tokio::sync::watch::Receiver<T>,
    pred: impl FnMut(&T) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("state sender dropped");
}

/// Create a test database connection signed in as the emulator owner.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    use petwatch::services::AuthSession;

    // The emulator lets the `owner` token bypass security rules.
    let identity = Arc::new(FakeIdentityProvider::with_id_token("owner"));
    identity.add_account("owner@example.com", "owner-password");
    let session = Arc::new(AuthSession::new(identity));
    session
        .sign_in("owner@example.com", "owner-password")
        .await
        .expect("Failed to sign in");
    FirestoreDb::new("test-project", session).expect("Failed to create Firestore client")
}
