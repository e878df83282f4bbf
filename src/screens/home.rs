// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Home screen: device reachability, profile summary, pet name editing.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::AppError;
use crate::lifecycle::{shutdown_requested, GateTicket, PublishGate, TaskHandle};
use crate::models::{Identity, UserRecord};
use crate::navigation::{Navigator, Route};
use crate::services::{ConnectivityPolicy, StatusPoller};
use crate::Backend;

/// Title shown while no pet name is saved or typed.
pub const DEFAULT_PET_NAME: &str = "포근이";

#[derive(Debug, Clone, Default)]
pub struct HomeState {
    pub connected: bool,
    pub pet_name_input: String,
    pub profile: Option<UserRecord>,
    pub identity: Option<Identity>,
}

impl HomeState {
    /// Saved pet name, else the name being edited, else the default.
    pub fn title(&self) -> &str {
        self.profile
            .as_ref()
            .and_then(|p| p.pet_name.as_deref())
            .filter(|name| !name.is_empty())
            .or_else(|| Some(self.pet_name_input.trim()).filter(|name| !name.is_empty()))
            .unwrap_or(DEFAULT_PET_NAME)
    }
}

pub struct HomeScreen {
    backend: Arc<Backend>,
    navigator: Navigator,
    state: Arc<watch::Sender<HomeState>>,
    gate: Arc<PublishGate>,
    poller: Option<TaskHandle>,
    profile_load: Option<TaskHandle>,
}

impl HomeScreen {
    /// Start the reachability poller and load the signed-in user's profile.
    pub fn mount(backend: Arc<Backend>, navigator: Navigator) -> Self {
        let identity = backend.session.current_user();
        let (state, _) = watch::channel(HomeState {
            identity: identity.clone(),
            ..HomeState::default()
        });
        let state = Arc::new(state);
        let gate = PublishGate::new();

        let poller = StatusPoller::new(
            backend.device.clone(),
            ConnectivityPolicy::Reachable,
            backend.config.status_poll_interval,
        );
        let poll_state = state.clone();
        let poller = poller.start(gate.ticket(), move |connected| {
            poll_state.send_if_modified(|s| {
                let changed = s.connected != connected;
                s.connected = connected;
                changed
            });
        });

        let profile_load = identity.map(|identity| {
            spawn_profile_load(&backend, identity.uid, state.clone(), gate.ticket())
        });

        Self {
            backend,
            navigator,
            state,
            gate,
            poller: Some(poller),
            profile_load,
        }
    }

    pub fn state(&self) -> watch::Receiver<HomeState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> HomeState {
        self.state.borrow().clone()
    }

    pub fn set_pet_name(&self, name: &str) {
        self.state.send_modify(|s| s.pet_name_input = name.to_string());
    }

    /// Write the edited pet name to the user's record.
    pub async fn save_pet_name(&self) -> Result<(), AppError> {
        let identity = self
            .backend
            .session
            .current_user()
            .ok_or(AppError::NotSignedIn)?;
        let name = self.state.borrow().pet_name_input.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Pet name is empty".to_string()));
        }

        self.backend
            .users
            .update_pet_name(&identity.uid, &name)
            .await
            .inspect_err(|e| {
                tracing::error!(uid = %identity.uid, error = %e, "Pet name update failed");
            })?;

        self.gate.ticket().publish(|| {
            self.state.send_modify(|s| {
                if let Some(profile) = s.profile.as_mut() {
                    profile.pet_name = Some(name.clone());
                }
            });
        });
        tracing::info!(uid = %identity.uid, "Pet name updated");
        Ok(())
    }

    pub fn open_camera(&self) {
        self.navigator.push(Route::Camera);
    }

    /// Sign out and return to login with no history behind it.
    pub async fn sign_out(&self) {
        self.backend.session.sign_out().await;
        self.navigator.reset(Route::Login);
    }

    pub async fn unmount(mut self) {
        self.gate.close();
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
        if let Some(load) = self.profile_load.take() {
            load.stop().await;
        }
    }
}

impl Drop for HomeScreen {
    fn drop(&mut self) {
        self.gate.close();
    }
}

fn spawn_profile_load(
    backend: &Backend,
    uid: String,
    state: Arc<watch::Sender<HomeState>>,
    ticket: GateTicket,
) -> TaskHandle {
    let users = backend.users.clone();
    TaskHandle::spawn(move |mut shutdown| async move {
        let loaded = tokio::select! {
            biased;
            _ = shutdown_requested(&mut shutdown) => return,
            loaded = users.get_user(&uid) => loaded,
        };

        match loaded {
            Ok(Some(record)) => {
                ticket.publish(|| {
                    state.send_modify(|s| {
                        if s.pet_name_input.is_empty() {
                            if let Some(name) = &record.pet_name {
                                s.pet_name_input = name.clone();
                            }
                        }
                        s.profile = Some(record);
                    })
                });
            }
            Ok(None) => tracing::warn!(uid = %uid, "No user record for signed-in user"),
            Err(e) => tracing::error!(uid = %uid, error = %e, "Profile load failed"),
        }
    })
}
