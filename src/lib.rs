// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Petwatch: client core for a pet-monitoring companion app
//!
//! This crate holds everything below the UI: the backend handle (identity
//! service, document database, device service), connectivity polling, live
//! record subscriptions, sign-up validation, navigation, and the per-screen
//! view models a UI binds to.

pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod navigation;
pub mod screens;
pub mod services;
pub mod time_utils;
pub mod validation;

use config::Config;
use db::{FirestoreDb, UserStore};
use error::Result;
use services::{AuthSession, DeviceClient, FirebaseAuthClient, IdentityProvider};
use std::sync::Arc;

/// Shared backend handle.
///
/// Built once at startup and handed to each screen; never mutated after
/// construction.
pub struct Backend {
    pub config: Config,
    pub session: Arc<AuthSession>,
    pub users: Arc<dyn UserStore>,
    pub device: DeviceClient,
}

impl Backend {
    /// Load configuration from the environment and connect.
    pub fn from_env() -> Result<Self> {
        let config = Config::from_env()?;
        Self::connect(config)
    }

    /// Connect to the hosted services described by `config`.
    ///
    /// The database connection itself is opened on first use, once a user
    /// has signed in.
    pub fn connect(config: Config) -> Result<Self> {
        let identity: Arc<dyn IdentityProvider> = Arc::new(FirebaseAuthClient::new(&config));
        let session = Arc::new(AuthSession::new(identity));
        let db = FirestoreDb::new(&config.firebase_project_id, session.clone())?;

        tracing::info!(
            project = %config.firebase_project_id,
            device = %config.device_base_url,
            "Backend initialized"
        );

        Ok(Self {
            device: DeviceClient::new(&config),
            config,
            session,
            users: Arc::new(db),
        })
    }

    /// Build a backend over caller-supplied identity and storage.
    pub fn from_parts(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            device: DeviceClient::new(&config),
            session: Arc::new(AuthSession::new(identity)),
            config,
            users,
        }
    }
}
