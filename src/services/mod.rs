// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - backend clients and background sync.

pub mod auth;
pub mod device;
pub mod poller;
pub mod session;
pub mod subscriber;

pub use auth::{FirebaseAuthClient, IdentityProvider};
pub use device::DeviceClient;
pub use poller::{ConnectivityPolicy, StatusPoller};
pub use session::AuthSession;
pub use subscriber::{temperature_label, LiveFieldSubscription, LiveFields};
