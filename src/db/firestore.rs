// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations on the `users` collection.
//!
//! Requests are authorised with the signed-in user's ID token, so the
//! project's security rules apply exactly as they do for the mobile SDKs.
//! One gRPC client is kept per signed-in user and rebuilt when the user
//! changes. With nobody signed in only the duplicate-email query is allowed,
//! and it goes out over REST without credentials.

use crate::db::{collections, ListenerHandle, UserSnapshot, UserStore};
use crate::error::{AppError, Result};
use crate::lifecycle::{shutdown_requested, TaskHandle};
use crate::models::user::PetNameUpdate;
use crate::models::{BearerToken, UserRecord};
use crate::services::AuthSession;
use async_trait::async_trait;
use firestore::{
    FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

const FIRESTORE_REST_URL: &str = "https://firestore.googleapis.com/v1";

/// Listener target for single-document user subscriptions.
const USER_DOC_TARGET: FirestoreListenerTarget = FirestoreListenerTarget::new(17_u32);

/// Projection used by the duplicate-email query.
#[derive(Deserialize)]
struct EmailOnly {
    #[allow(dead_code)]
    email: String,
}

/// One element of a REST `runQuery` response.
#[derive(Deserialize)]
struct RunQueryResult {
    document: Option<serde_json::Value>,
}

/// gRPC client bound to one signed-in user.
struct AuthorizedClient {
    uid: String,
    db: firestore::FirestoreDb,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    project_id: String,
    /// `None` in offline mode.
    session: Option<Arc<AuthSession>>,
    http: reqwest::Client,
    rest_base_url: String,
    authorized: Arc<Mutex<Option<AuthorizedClient>>>,
}

impl FirestoreDb {
    /// Create a new Firestore client authorised by `session`.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub fn new(project_id: &str, session: Arc<AuthSession>) -> Result<Self> {
        let rest_base_url = match std::env::var("FIRESTORE_EMULATOR_HOST") {
            Ok(host) => {
                tracing::info!(host = %host, "Using Firestore Emulator");
                format!("http://{}/v1", host)
            }
            Err(_) => FIRESTORE_REST_URL.to_string(),
        };

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            project_id: project_id.to_string(),
            session: Some(session),
            http,
            rest_base_url,
            authorized: Arc::new(Mutex::new(None)),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            project_id: String::new(),
            session: None,
            http: reqwest::Client::new(),
            rest_base_url: String::new(),
            authorized: Arc::new(Mutex::new(None)),
        }
    }

    /// Helper to get the session or return an error if offline.
    fn get_session(&self) -> Result<&Arc<AuthSession>> {
        self.session
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// gRPC client carrying the signed-in user's token.
    ///
    /// Fails with `NotSignedIn` rather than sending an unauthenticated
    /// request.
    async fn get_client(&self) -> Result<firestore::FirestoreDb> {
        let session = self.get_session()?;
        let bearer = session.bearer_token().await?.ok_or(AppError::NotSignedIn)?;

        let mut authorized = self.authorized.lock().await;
        if let Some(client) = authorized.as_ref().filter(|c| c.uid == bearer.uid) {
            return Ok(client.db.clone());
        }

        let db = self.connect_as(session.clone(), bearer.clone()).await?;
        tracing::info!(project = %self.project_id, uid = %bearer.uid, "Connected to Firestore");
        *authorized = Some(AuthorizedClient {
            uid: bearer.uid,
            db: db.clone(),
        });
        Ok(db)
    }

    async fn connect_as(
        &self,
        session: Arc<AuthSession>,
        initial: BearerToken,
    ) -> Result<firestore::FirestoreDb> {
        let last = Arc::new(parking_lot::Mutex::new(initial));

        // The gRPC layer caches each token until shortly before `expiry`, so
        // the expiry handed out is the token's own. A client never sees
        // another user's token: once the session moves on it keeps getting
        // the last token it had.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(move || {
            let session = session.clone();
            let last = last.clone();
            let current = tokio::spawn(async move { session.bearer_token().await });
            async move {
                let current = current.await;
                let bearer = {
                    let mut last = last.lock();
                    match current {
                        Ok(Ok(Some(bearer))) if bearer.uid == last.uid => *last = bearer,
                        Ok(Err(e)) => tracing::warn!(error = %e, "ID token refresh failed"),
                        _ => {}
                    }
                    last.clone()
                };
                Ok(gcloud_sdk::Token {
                    token_type: "Bearer".to_string(),
                    token: gcloud_sdk::SecretValue::new(bearer.token.into()),
                    expiry: bearer.expires_at,
                })
            }
        });

        let options = firestore::FirestoreDbOptions::new(self.project_id.clone());

        firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))
    }

    /// `email == value` query over REST with no credentials.
    async fn email_exists_unauthenticated(&self, email: &str) -> Result<bool> {
        let url = format!(
            "{}/projects/{}/databases/(default)/documents:runQuery",
            self.rest_base_url, self.project_id
        );
        let body = serde_json::json!({
            "structuredQuery": {
                "from": [{ "collectionId": collections::USERS }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "email" },
                        "op": "EQUAL",
                        "value": { "stringValue": email },
                    }
                },
                "limit": 1,
            }
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("runQuery request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Database(format!("runQuery response unreadable: {}", e)))?;
        if !status.is_success() {
            return Err(AppError::Database(format!("runQuery HTTP {}: {}", status, text)));
        }

        query_found_document(&text)
    }
}

fn query_found_document(body: &str) -> Result<bool> {
    let results: Vec<RunQueryResult> = serde_json::from_str(body).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Malformed runQuery response: {}", e))
    })?;
    Ok(results.iter().any(|r| r.document.is_some()))
}

#[async_trait]
impl UserStore for FirestoreDb {
    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, AppError> {
        self.get_client()
            .await?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn upsert_user(&self, uid: &str, record: &UserRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()
            .await?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(uid)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn update_pet_name(&self, uid: &str, pet_name: &str) -> Result<(), AppError> {
        let update = PetNameUpdate {
            pet_name: pet_name.to_string(),
        };

        let _: () = self
            .get_client()
            .await?
            .fluent()
            .update()
            .fields(["pet_name"])
            .in_col(collections::USERS)
            .document_id(uid)
            .object(&update)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        if self.get_session()?.current_user().is_none() {
            return self.email_exists_unauthenticated(email).await;
        }

        let matches: Vec<EmailOnly> = self
            .get_client()
            .await?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("email").eq(email)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(!matches.is_empty())
    }

    async fn listen_user(
        &self,
        uid: &str,
        sink: mpsc::Sender<UserSnapshot>,
    ) -> Result<ListenerHandle, AppError> {
        let client = self.get_client().await?;

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(|e| AppError::Database(format!("Failed to create listener: {}", e)))?;

        client
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .batch_listen([uid.to_string()])
            .add_target(USER_DOC_TARGET, &mut listener)
            .map_err(|e| AppError::Database(format!("Failed to add listen target: {}", e)))?;

        listener
            .start(move |event| {
                let sink = sink.clone();
                async move {
                    let snapshot = match event {
                        FirestoreListenEvent::DocumentChange(ref change) => {
                            match change.document.as_ref() {
                                Some(doc) => {
                                    match firestore::FirestoreDb::deserialize_doc_to::<UserRecord>(
                                        doc,
                                    ) {
                                        Ok(record) => Some(Some(record)),
                                        Err(e) => {
                                            tracing::warn!(error = %e, "Malformed user document");
                                            None
                                        }
                                    }
                                }
                                None => None,
                            }
                        }
                        FirestoreListenEvent::DocumentDelete(_)
                        | FirestoreListenEvent::DocumentRemove(_) => Some(None),
                        _ => None,
                    };

                    if let Some(snapshot) = snapshot {
                        // Receiver gone means the subscriber was torn down.
                        let _ = sink.send(snapshot).await;
                    }
                    Ok(())
                }
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to start listener: {}", e)))?;

        tracing::debug!(uid, "User document listener started");

        let uid = uid.to_string();
        Ok(TaskHandle::spawn(move |mut shutdown| async move {
            shutdown_requested(&mut shutdown).await;
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(uid = %uid, error = %e, "Listener shutdown failed");
            }
            tracing::debug!(uid = %uid, "User document listener stopped");
        }))
    }
}
