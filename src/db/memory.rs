//! In-memory `users` collection with change notification.
//!
//! Used for offline runs and tests. Reads and writes can be made to fail to
//! exercise the fail-closed paths.

use crate::db::{ListenerHandle, UserSnapshot, UserStore};
use crate::error::AppError;
use crate::lifecycle::{shutdown_requested, TaskHandle};
use crate::models::UserRecord;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// In-memory user store.
#[derive(Clone)]
pub struct MemoryUserStore {
    users: Arc<DashMap<String, UserRecord>>,
    /// uid of every changed document
    changes: broadcast::Sender<String>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            users: Arc::new(DashMap::new()),
            changes,
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make reads (get, query, listen) fail until reset.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make writes fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Remove a record, notifying listeners.
    pub fn remove(&self, uid: &str) -> Option<UserRecord> {
        let removed = self.users.remove(uid).map(|(_, record)| record);
        if removed.is_some() {
            let _ = self.changes.send(uid.to_string());
        }
        removed
    }

    /// Apply a server-side change (device updates such as `cur_temp`).
    pub fn modify(&self, uid: &str, change: impl FnOnce(&mut UserRecord)) -> bool {
        let changed = match self.users.get_mut(uid) {
            Some(mut record) => {
                change(record.value_mut());
                true
            }
            None => false,
        };
        if changed {
            let _ = self.changes.send(uid.to_string());
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn check_reads(&self) -> Result<(), AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Database("Simulated read failure".to_string()));
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("Simulated write failure".to_string()));
        }
        Ok(())
    }

    fn snapshot(&self, uid: &str) -> UserSnapshot {
        self.users.get(uid).map(|r| r.value().clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, uid: &str) -> Result<Option<UserRecord>, AppError> {
        self.check_reads()?;
        Ok(self.snapshot(uid))
    }

    async fn upsert_user(&self, uid: &str, record: &UserRecord) -> Result<(), AppError> {
        self.check_writes()?;
        self.users.insert(uid.to_string(), record.clone());
        let _ = self.changes.send(uid.to_string());
        Ok(())
    }

    async fn update_pet_name(&self, uid: &str, pet_name: &str) -> Result<(), AppError> {
        self.check_writes()?;
        if self.modify(uid, |record| record.pet_name = Some(pet_name.to_string())) {
            Ok(())
        } else {
            Err(AppError::Database(format!("No document to update: users/{}", uid)))
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        self.check_reads()?;
        Ok(self.users.iter().any(|entry| entry.value().email == email))
    }

    async fn listen_user(
        &self,
        uid: &str,
        sink: mpsc::Sender<UserSnapshot>,
    ) -> Result<ListenerHandle, AppError> {
        self.check_reads()?;

        // Subscribe before reading the initial snapshot so no change is missed.
        let mut changes = self.changes.subscribe();
        let store = self.clone();
        let uid = uid.to_string();

        Ok(TaskHandle::spawn(move |mut shutdown| async move {
            if sink.send(store.snapshot(&uid)).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_requested(&mut shutdown) => break,
                    changed = changes.recv() => {
                        match changed {
                            Ok(changed_uid) if changed_uid != uid => continue,
                            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => break,
                        }
                        if sink.send(store.snapshot(&uid)).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }))
    }
}
