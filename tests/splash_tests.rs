// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Splash routing on a paused clock.

use petwatch::config::Config;
use petwatch::navigation::{Navigator, Route};
use petwatch::screens::SplashScreen;
use std::time::Duration;
use tokio::time::sleep;

mod common;
use common::test_backend;

#[tokio::test(start_paused = true)]
async fn test_signed_out_routes_to_login_after_delay() {
    let t = test_backend(Config::default());
    let nav = Navigator::new(Route::Splash);
    let splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(1499)).await;
    assert_eq!(nav.current(), Route::Splash);

    sleep(Duration::from_millis(2)).await;
    assert_eq!(nav.current(), Route::Login);
    // Replaced, so there is no way back to the splash screen.
    assert_eq!(nav.history(), vec![Route::Login]);

    splash.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_signed_in_routes_to_home() {
    let t = test_backend(Config::default());
    t.identity.add_account("cat@example.com", "abcdef");
    t.backend
        .session
        .sign_in("cat@example.com", "abcdef")
        .await
        .unwrap();

    let nav = Navigator::new(Route::Splash);
    let splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(1501)).await;
    assert_eq!(nav.history(), vec![Route::Home]);

    splash.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_each_auth_change_schedules_its_own_route() {
    let t = test_backend(Config::default());
    t.identity.add_account("cat@example.com", "abcdef");

    let nav = Navigator::new(Route::Splash);
    let splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(500)).await;
    t.backend
        .session
        .sign_in("cat@example.com", "abcdef")
        .await
        .unwrap();

    // First firing (signed out) lands at 1500 ms.
    sleep(Duration::from_millis(1001)).await;
    assert_eq!(nav.current(), Route::Login);

    // Second firing (signed in) lands at 2000 ms.
    sleep(Duration::from_millis(500)).await;
    assert_eq!(nav.current(), Route::Home);
    assert_eq!(nav.history(), vec![Route::Home]);

    splash.unmount().await;
}

#[tokio::test(start_paused = true)]
async fn test_router_ignores_auth_changes_after_leaving_splash() {
    let t = test_backend(Config::default());
    t.identity.add_account("cat@example.com", "abcdef");

    let nav = Navigator::new(Route::Splash);
    // Never unmounted.
    let _splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(1501)).await;
    assert_eq!(nav.current(), Route::Login);

    t.backend
        .session
        .sign_in("cat@example.com", "abcdef")
        .await
        .unwrap();
    nav.push(Route::Home);
    nav.push(Route::Camera);

    sleep(Duration::from_secs(5)).await;
    t.backend.session.sign_out().await;
    sleep(Duration::from_secs(5)).await;

    assert_eq!(
        nav.history(),
        vec![Route::Login, Route::Home, Route::Camera]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_pending_navigation() {
    let t = test_backend(Config::default());
    let nav = Navigator::new(Route::Splash);
    let splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(1000)).await;
    splash.unmount().await;

    sleep(Duration::from_secs(5)).await;
    assert_eq!(nav.current(), Route::Splash);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_navigation() {
    let t = test_backend(Config::default());
    let nav = Navigator::new(Route::Splash);
    let splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(1000)).await;
    drop(splash);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(nav.current(), Route::Splash);
}

#[tokio::test(start_paused = true)]
async fn test_delay_comes_from_config() {
    let t = test_backend(Config {
        splash_delay: Duration::from_millis(200),
        ..Config::default()
    });
    let nav = Navigator::new(Route::Splash);
    let splash = SplashScreen::mount(&t.backend, nav.clone());

    sleep(Duration::from_millis(201)).await;
    assert_eq!(nav.current(), Route::Login);

    splash.unmount().await;
}
