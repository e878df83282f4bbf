//! Identity types issued by the authentication service.

/// Authenticated user handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique user ID; also the `users` document ID
    pub uid: String,
    pub email: Option<String>,
}

/// Tokens returned by a successful sign-in, sign-up, or refresh.
#[derive(Debug, Clone)]
pub struct AuthGrant {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds until `id_token` expires
    pub expires_in: i64,
}

impl AuthGrant {
    pub fn identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            email: self.email.clone(),
        }
    }
}

/// ID token of the signed-in user, as sent on database requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub uid: String,
    pub token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}
