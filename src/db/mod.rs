//! Database layer (Firestore, with an in-memory stand-in).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryUserStore;

use crate::error::AppError;
use crate::lifecycle::TaskHandle;
use crate::models::UserRecord;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// One push update for a watched document: `None` when it does not exist.
pub type UserSnapshot = Option<UserRecord>;

/// Running document listener. Dropping it stops delivery.
pub type ListenerHandle = TaskHandle;

/// Access to the `users` collection.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user record by uid.
    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, AppError>;

    /// Create or overwrite a user record.
    async fn upsert_user(&self, uid: &str, record: &UserRecord) -> Result<(), AppError>;

    /// Set `pet_name` without touching the other fields.
    async fn update_pet_name(&self, uid: &str, pet_name: &str) -> Result<(), AppError>;

    /// Whether any record has exactly this email.
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// Open a push subscription on `users/{uid}`.
    ///
    /// Snapshots are sent to `sink` until the returned handle is stopped or
    /// dropped, or the receiving side goes away.
    async fn listen_user(
        &self,
        uid: &str,
        sink: mpsc::Sender<UserSnapshot>,
    ) -> Result<ListenerHandle, AppError>;
}
