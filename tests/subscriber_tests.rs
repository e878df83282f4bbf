// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live field subscription over the in-memory user store.

use parking_lot::Mutex;
use petwatch::db::{MemoryUserStore, UserStore};
use petwatch::models::UserRecord;
use petwatch::services::{temperature_label, LiveFieldSubscription, LiveFields};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

mod common;
use common::wait_until;

fn record(cur_temp: f64, pet_name: Option<&str>) -> UserRecord {
    UserRecord {
        cur_temp,
        pet_name: pet_name.map(str::to_string),
        ..UserRecord::new_registration("cat@example.com")
    }
}

async fn subscribe(
    store: &MemoryUserStore,
    uid: &str,
) -> (
    LiveFieldSubscription,
    watch::Receiver<Option<LiveFields>>,
    Arc<Mutex<usize>>,
) {
    let (tx, rx) = watch::channel(None);
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();
    let subscription = LiveFieldSubscription::open(store, uid, move |fields| {
        *counter.lock() += 1;
        tx.send_replace(Some(fields));
    })
    .await
    .unwrap();
    (subscription, rx, calls)
}

#[tokio::test]
async fn test_initial_snapshot_is_published() {
    let store = MemoryUserStore::new();
    store.upsert_user("u1", &record(23.0, None)).await.unwrap();

    let (subscription, mut rx, _) = subscribe(&store, "u1").await;
    wait_until(&mut rx, |f| f.is_some()).await;

    let fields = rx.borrow().clone().unwrap();
    assert_eq!(temperature_label(fields.cur_temp), "23 ℃");
    assert_eq!(fields.pet_name, None);

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn test_changes_are_republished() {
    let store = MemoryUserStore::new();
    store.upsert_user("u1", &record(23.0, None)).await.unwrap();
    let (subscription, mut rx, _) = subscribe(&store, "u1").await;
    wait_until(&mut rx, |f| f.is_some()).await;

    store.modify("u1", |r| r.cur_temp = 26.5);
    wait_until(&mut rx, |f| f.as_ref().is_some_and(|f| f.cur_temp == 26.5)).await;

    store.modify("u1", |r| r.pet_name = Some("Mochi".to_string()));
    wait_until(&mut rx, |f| {
        f.as_ref().is_some_and(|f| f.pet_name.as_deref() == Some("Mochi"))
    })
    .await;

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn test_missing_document_publishes_nothing() {
    let store = MemoryUserStore::new();
    let (subscription, rx, calls) = subscribe(&store, "ghost").await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*calls.lock(), 0);
    assert!(rx.borrow().is_none());

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn test_deleted_document_keeps_last_value() {
    let store = MemoryUserStore::new();
    store.upsert_user("u1", &record(21.0, None)).await.unwrap();
    let (subscription, mut rx, calls) = subscribe(&store, "u1").await;
    wait_until(&mut rx, |f| f.is_some()).await;
    let before = *calls.lock();

    store.remove("u1");
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(*calls.lock(), before);
    assert_eq!(rx.borrow().as_ref().map(|f| f.cur_temp), Some(21.0));

    subscription.unsubscribe().await;
}

#[tokio::test]
async fn test_no_callback_after_unsubscribe() {
    let store = MemoryUserStore::new();
    store.upsert_user("u1", &record(23.0, None)).await.unwrap();
    let (subscription, mut rx, calls) = subscribe(&store, "u1").await;
    wait_until(&mut rx, |f| f.is_some()).await;

    subscription.unsubscribe().await;
    let before = *calls.lock();

    for t in 0..5 {
        store.modify("u1", |r| r.cur_temp = 30.0 + f64::from(t));
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*calls.lock(), before);
}

#[tokio::test]
async fn test_no_callback_after_drop() {
    let store = MemoryUserStore::new();
    store.upsert_user("u1", &record(23.0, None)).await.unwrap();
    let (subscription, mut rx, calls) = subscribe(&store, "u1").await;
    wait_until(&mut rx, |f| f.is_some()).await;

    drop(subscription);
    let before = *calls.lock();

    store.modify("u1", |r| r.cur_temp = 40.0);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(*calls.lock(), before);
}

#[tokio::test]
async fn test_open_fails_when_store_unavailable() {
    let store = MemoryUserStore::new();
    store.set_fail_reads(true);

    let result = LiveFieldSubscription::open(&store, "u1", |_| {}).await;
    assert!(result.is_err());
}
