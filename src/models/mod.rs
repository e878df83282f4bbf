// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod device;
pub mod session;
pub mod user;

pub use device::{CaptureResponse, StatusResponse};
pub use session::{AuthGrant, BearerToken, Identity};
pub use user::UserRecord;
