// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lifecycle primitives shared by pollers, subscriptions, and screens.
//!
//! A screen owns a [`TaskHandle`] per background job and a [`PublishGate`]
//! guarding the state those jobs write to. Closing the gate happens before
//! stopping the tasks, so once `close()` returns nothing published by an
//! earlier generation can reach the screen's state.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Generation-based gate for publishing into UI state.
#[derive(Debug, Default)]
pub struct PublishGate {
    generation: Mutex<u64>,
}

impl PublishGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Issue a ticket bound to the current generation.
    pub fn ticket(self: &Arc<Self>) -> GateTicket {
        GateTicket {
            gate: Arc::clone(self),
            generation: *self.generation.lock(),
        }
    }

    /// Invalidate every ticket issued so far.
    ///
    /// Blocks until any in-progress publish has finished.
    pub fn close(&self) {
        *self.generation.lock() += 1;
    }
}

/// Permission to publish while the issuing generation is current.
#[derive(Debug, Clone)]
pub struct GateTicket {
    gate: Arc<PublishGate>,
    generation: u64,
}

impl GateTicket {
    /// Run `publish` if the gate has not been closed since this ticket was issued.
    ///
    /// Returns whether `publish` ran.
    pub fn publish(&self, publish: impl FnOnce()) -> bool {
        let current = self.gate.generation.lock();
        if *current != self.generation {
            return false;
        }
        publish();
        true
    }

    pub fn is_open(&self) -> bool {
        *self.gate.generation.lock() == self.generation
    }
}

/// A spawned background task with a cooperative shutdown signal.
///
/// The task receives a `watch::Receiver<bool>` that flips to `true` (or
/// closes) when the handle is stopped or dropped.
pub struct TaskHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Spawn `make(shutdown_rx)` on the current runtime.
    pub fn spawn<F, Fut>(make: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(make(shutdown_rx));
        Self {
            shutdown,
            task: Some(task),
        }
    }

    /// Signal shutdown and wait for the task to finish.
    pub async fn stop(mut self) {
        self.shutdown.send_replace(true);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Background task panicked");
                }
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        // Detached: the task observes the signal and winds down on its own.
        self.shutdown.send_replace(true);
    }
}

/// Resolve once `shutdown` flips to `true` or its sender goes away.
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    // wait_for errors only when the sender is dropped, which also means stop.
    let _ = shutdown.wait_for(|stop| *stop).await;
}
