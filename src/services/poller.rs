// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Connectivity polling against the device status endpoint.
//!
//! **Polling strategy:**
//! - First request goes out immediately on start, then one per interval.
//! - Each tick runs its request as its own task, so a slow response may
//!   overlap the next tick. Results are applied newest-tick-wins; a late
//!   answer from an older tick never overwrites a newer one.
//! - Any failure (transport, non-2xx, malformed body) reads as disconnected.
//!   There is no retry beyond the next tick.
//! - Stopping the poller aborts outstanding requests; nothing is published
//!   after the owning gate closes.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};

use crate::lifecycle::{shutdown_requested, GateTicket, TaskHandle};
use crate::services::DeviceClient;

/// How a reported status string maps to "connected".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityPolicy {
    /// Connected only while the device reports `"on"` (camera screen).
    PoweredOn,
    /// Connected whenever the device answers `"on"` or `"off"` (home screen).
    Reachable,
}

impl ConnectivityPolicy {
    pub fn is_connected(self, status: &str) -> bool {
        match self {
            Self::PoweredOn => status == "on",
            Self::Reachable => status == "on" || status == "off",
        }
    }
}

/// Periodic connectivity checker.
#[derive(Clone)]
pub struct StatusPoller {
    device: DeviceClient,
    policy: ConnectivityPolicy,
    interval: Duration,
}

impl StatusPoller {
    pub fn new(device: DeviceClient, policy: ConnectivityPolicy, interval: Duration) -> Self {
        Self {
            device,
            policy,
            interval,
        }
    }

    /// Run one check. Fails closed.
    pub async fn check(&self) -> bool {
        match self.device.status().await {
            Ok(response) => self.policy.is_connected(&response.status),
            Err(e) => {
                tracing::debug!(error = %e, "Status poll failed");
                false
            }
        }
    }

    /// Start polling; `on_update` receives each applied result through `ticket`.
    pub fn start<F>(self, ticket: GateTicket, on_update: F) -> TaskHandle
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        TaskHandle::spawn(move |mut shutdown| async move {
            tracing::debug!(
                interval_ms = self.interval.as_millis() as u64,
                policy = ?self.policy,
                "Status poller started"
            );

            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut inflight = JoinSet::new();
            let mut next_tick: u64 = 0;
            let mut latest_applied: Option<u64> = None;

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut shutdown) => break,
                    Some(joined) = inflight.join_next() => {
                        match joined {
                            Ok((tick, connected)) => {
                                if latest_applied.is_some_and(|latest| tick < latest) {
                                    tracing::debug!(tick, "Discarding stale status result");
                                    continue;
                                }
                                latest_applied = Some(tick);
                                if !ticket.publish(|| on_update(connected)) {
                                    break;
                                }
                            }
                            Err(e) if e.is_panic() => {
                                tracing::error!(error = %e, "Status check panicked");
                            }
                            Err(_) => {}
                        }
                    }
                    _ = ticker.tick() => {
                        let poller = self.clone();
                        let tick = next_tick;
                        next_tick += 1;
                        inflight.spawn(async move { (tick, poller.check().await) });
                    }
                }
            }

            // Dropping the set aborts requests still in flight.
            inflight.abort_all();
            tracing::debug!("Status poller stopped");
        })
    }
}
