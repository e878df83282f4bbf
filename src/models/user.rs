//! User record stored in the `users` collection.

use serde::{Deserialize, Serialize};

use crate::time_utils::format_utc_iso8601;

/// Temperature a freshly registered device starts at (°C).
pub const DEFAULT_TEMPERATURE: f64 = 25.0;
/// Role assigned to every self-registered account.
pub const DEFAULT_ROLE: &str = "user";

/// Per-user document holding device and profile state.
///
/// The document ID is the identity's uid; the record itself does not repeat it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    /// Current temperature reported by the device (°C)
    pub cur_temp: f64,
    /// Target temperature (°C)
    pub set_temp: f64,
    /// Whether the heater is running
    pub heat_status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pet_name: Option<String>,
    pub role: String,
    /// Last login (ISO 8601)
    pub last_login: String,
    pub token: i64,
}

impl UserRecord {
    /// Record created at registration time.
    pub fn new_registration(email: &str) -> Self {
        Self {
            email: email.to_string(),
            cur_temp: DEFAULT_TEMPERATURE,
            set_temp: DEFAULT_TEMPERATURE,
            heat_status: false,
            pet_name: None,
            role: DEFAULT_ROLE.to_string(),
            last_login: format_utc_iso8601(chrono::Utc::now()),
            token: 1,
        }
    }
}

/// Partial write touching only `pet_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetNameUpdate {
    pub pet_name: String,
}
