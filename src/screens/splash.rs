// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Splash screen: routes to home or login once the auth state is known.
//!
//! Every auth-state notification (including the one for the state at mount
//! time) schedules one navigation after the splash delay. Once the first of
//! them has navigated away the router stops listening; navigations already
//! scheduled still fire. Unmounting cancels the listener and every
//! navigation still pending.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;

use crate::lifecycle::{shutdown_requested, GateTicket, PublishGate, TaskHandle};
use crate::models::Identity;
use crate::navigation::{Navigator, Route};
use crate::Backend;

/// Where a session in this state should land.
pub fn entry_route(identity: Option<&Identity>) -> Route {
    match identity {
        Some(_) => Route::Home,
        None => Route::Login,
    }
}

pub struct SplashScreen {
    gate: Arc<PublishGate>,
    router: Option<TaskHandle>,
}

impl SplashScreen {
    pub fn mount(backend: &Backend, navigator: Navigator) -> Self {
        let gate = PublishGate::new();
        let router = spawn_router(
            backend.session.subscribe(),
            navigator,
            backend.config.splash_delay,
            gate.ticket(),
        );

        Self {
            gate,
            router: Some(router),
        }
    }

    pub async fn unmount(mut self) {
        self.gate.close();
        if let Some(router) = self.router.take() {
            router.stop().await;
        }
    }
}

impl Drop for SplashScreen {
    fn drop(&mut self) {
        self.gate.close();
    }
}

fn spawn_router(
    mut auth: watch::Receiver<Option<Identity>>,
    navigator: Navigator,
    delay: Duration,
    ticket: GateTicket,
) -> TaskHandle {
    TaskHandle::spawn(move |mut shutdown| async move {
        let mut pending = JoinSet::new();
        let mut listening = true;

        let initial = auth.borrow_and_update().clone();
        schedule(&mut pending, initial, delay, &navigator, &ticket);

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                changed = auth.changed(), if listening => {
                    if changed.is_err() {
                        // Session dropped; let already scheduled routes fire.
                        listening = false;
                        continue;
                    }
                    let identity = auth.borrow_and_update().clone();
                    schedule(&mut pending, identity, delay, &navigator, &ticket);
                }
                Some(joined) = pending.join_next() => {
                    if listening && matches!(joined, Ok(true)) {
                        tracing::debug!("Left splash, no longer following auth state");
                        listening = false;
                    }
                    if !listening && pending.is_empty() {
                        break;
                    }
                }
            }
        }

        pending.abort_all();
        tracing::debug!("Splash router stopped");
    })
}

fn schedule(
    pending: &mut JoinSet<bool>,
    identity: Option<Identity>,
    delay: Duration,
    navigator: &Navigator,
    ticket: &GateTicket,
) {
    let route = entry_route(identity.as_ref());
    let navigator = navigator.clone();
    let ticket = ticket.clone();

    tracing::debug!(route = %route, delay_ms = delay.as_millis() as u64, "Scheduling entry route");
    pending.spawn(async move {
        tokio::time::sleep(delay).await;
        ticket.publish(|| navigator.replace(route))
    });
}
