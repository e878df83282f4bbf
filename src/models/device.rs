//! Response bodies of the device HTTP service.

use serde::Deserialize;

/// `GET /status` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    /// `"on"`, `"off"`, or anything else the device reports
    pub status: String,
}

/// `GET /capture` body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaptureResponse {
    pub status: String,
}

impl CaptureResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
