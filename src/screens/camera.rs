// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Camera screen: live stream, live temperature, power toggle, capture.

use std::sync::Arc;

use tokio::sync::watch;

use crate::lifecycle::{PublishGate, TaskHandle};
use crate::navigation::{Navigator, Route};
use crate::services::{
    temperature_label, ConnectivityPolicy, LiveFieldSubscription, LiveFields, StatusPoller,
};
use crate::Backend;

#[derive(Debug, Clone)]
pub struct CameraState {
    pub connected: bool,
    pub power_on: bool,
    pub live: Option<LiveFields>,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            connected: false,
            power_on: true,
            live: None,
        }
    }
}

impl CameraState {
    /// `"<n> ℃"` once a record has been seen.
    pub fn temperature_label(&self) -> Option<String> {
        self.live.as_ref().map(|live| temperature_label(live.cur_temp))
    }
}

/// Result of asking the device for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Saved,
    Failed,
    Unreachable,
}

impl CaptureOutcome {
    pub fn message(self) -> &'static str {
        match self {
            Self::Saved => "Screenshot saved.",
            Self::Failed => "Screenshot failed.",
            Self::Unreachable => "Could not reach the camera.",
        }
    }
}

pub struct CameraScreen {
    backend: Arc<Backend>,
    navigator: Navigator,
    state: Arc<watch::Sender<CameraState>>,
    gate: Arc<PublishGate>,
    poller: Option<TaskHandle>,
    subscription: Option<LiveFieldSubscription>,
}

impl CameraScreen {
    /// Subscribe to the user's record and start the power-state poller.
    ///
    /// With nobody signed in neither is started.
    pub async fn mount(backend: Arc<Backend>, navigator: Navigator) -> Self {
        let (state, _) = watch::channel(CameraState::default());
        let state = Arc::new(state);
        let gate = PublishGate::new();

        let mut screen = Self {
            backend: backend.clone(),
            navigator,
            state: state.clone(),
            gate: gate.clone(),
            poller: None,
            subscription: None,
        };

        let Some(identity) = backend.session.current_user() else {
            tracing::debug!("Camera screen mounted without a signed-in user");
            return screen;
        };

        let live_state = state.clone();
        match LiveFieldSubscription::open(backend.users.as_ref(), &identity.uid, move |fields| {
            live_state.send_modify(|s| s.live = Some(fields));
        })
        .await
        {
            Ok(subscription) => screen.subscription = Some(subscription),
            Err(e) => tracing::error!(uid = %identity.uid, error = %e, "Live field subscription failed"),
        }

        let poll_state = state;
        let poller = StatusPoller::new(
            backend.device.clone(),
            ConnectivityPolicy::PoweredOn,
            backend.config.status_poll_interval,
        )
        .start(gate.ticket(), move |connected| {
            poll_state.send_if_modified(|s| {
                let changed = s.connected != connected;
                s.connected = connected;
                changed
            });
        });
        screen.poller = Some(poller);

        screen
    }

    pub fn state(&self) -> watch::Receiver<CameraState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> CameraState {
        self.state.borrow().clone()
    }

    /// Flip the local power indicator. Nothing is sent to the device.
    pub fn toggle_power(&self) -> bool {
        let mut power_on = false;
        self.state.send_modify(|s| {
            s.power_on = !s.power_on;
            power_on = s.power_on;
        });
        power_on
    }

    pub async fn capture(&self) -> CaptureOutcome {
        match self.backend.device.capture().await {
            Ok(response) if response.is_ok() => CaptureOutcome::Saved,
            Ok(response) => {
                tracing::warn!(status = %response.status, "Capture rejected");
                CaptureOutcome::Failed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Capture request failed");
                CaptureOutcome::Unreachable
            }
        }
    }

    pub fn stream_url(&self) -> String {
        self.backend.device.stream_url()
    }

    pub fn player_html(&self) -> String {
        self.backend.device.player_html()
    }

    pub fn go_home(&self) {
        self.navigator.push(Route::Home);
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some() || self.poller.is_some()
    }

    pub async fn unmount(mut self) {
        self.gate.close();
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe().await;
        }
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
    }
}

impl Drop for CameraScreen {
    fn drop(&mut self) {
        self.gate.close();
    }
}
