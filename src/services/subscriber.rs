// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live field subscription on the signed-in user's record.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::db::{ListenerHandle, UserSnapshot, UserStore};
use crate::error::AppError;
use crate::lifecycle::{shutdown_requested, GateTicket, PublishGate, TaskHandle};
use crate::models::UserRecord;

const SNAPSHOT_BUFFER: usize = 16;

/// Fields republished to the UI on every record change.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveFields {
    pub cur_temp: f64,
    pub pet_name: Option<String>,
}

impl LiveFields {
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            cur_temp: record.cur_temp,
            pet_name: record.pet_name.clone(),
        }
    }
}

/// Format a temperature for display, e.g. `23 ℃`.
pub fn temperature_label(celsius: f64) -> String {
    format!("{} ℃", celsius)
}

/// Active subscription. Exactly one listener per instance.
///
/// After [`unsubscribe`](Self::unsubscribe) returns (or the value is
/// dropped) the callback is never invoked again.
pub struct LiveFieldSubscription {
    gate: Arc<PublishGate>,
    listener: Option<ListenerHandle>,
    forwarder: Option<TaskHandle>,
}

impl LiveFieldSubscription {
    /// Subscribe to `users/{uid}` and call `on_change` for each snapshot of an
    /// existing document, starting with the initial one.
    ///
    /// Snapshots of a missing document are ignored, leaving the last published
    /// value in place.
    pub async fn open<F>(
        store: &dyn UserStore,
        uid: &str,
        on_change: F,
    ) -> Result<Self, AppError>
    where
        F: Fn(LiveFields) + Send + Sync + 'static,
    {
        let gate = PublishGate::new();
        let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
        let listener = store.listen_user(uid, tx).await?;
        let forwarder = spawn_forwarder(rx, gate.ticket(), uid.to_string(), on_change);

        tracing::debug!(uid, "Live field subscription opened");

        Ok(Self {
            gate,
            listener: Some(listener),
            forwarder: Some(forwarder),
        })
    }

    /// Release the subscription.
    pub async fn unsubscribe(mut self) {
        // Close first: from here on no callback can run.
        self.gate.close();
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.stop().await;
        }
        if let Some(listener) = self.listener.take() {
            listener.stop().await;
        }
    }
}

impl Drop for LiveFieldSubscription {
    fn drop(&mut self) {
        self.gate.close();
    }
}

fn spawn_forwarder<F>(
    mut rx: mpsc::Receiver<UserSnapshot>,
    ticket: GateTicket,
    uid: String,
    on_change: F,
) -> TaskHandle
where
    F: Fn(LiveFields) + Send + Sync + 'static,
{
    TaskHandle::spawn(move |mut shutdown| async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                snapshot = rx.recv() => {
                    let Some(snapshot) = snapshot else {
                        tracing::debug!(uid = %uid, "Listener closed");
                        break;
                    };
                    let Some(record) = snapshot else {
                        tracing::debug!(uid = %uid, "User document missing, keeping last value");
                        continue;
                    };
                    let fields = LiveFields::from_record(&record);
                    if !ticket.publish(|| on_change(fields)) {
                        break;
                    }
                }
            }
        }
    })
}
