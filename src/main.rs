// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Petwatch headless client
//!
//! Boots the backend, runs the splash router, optionally signs in with
//! credentials from the environment, and logs camera screen state until
//! interrupted.

use petwatch::{
    navigation::{Navigator, Route},
    screens::{CameraScreen, LoginScreen, SplashScreen},
    Backend,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    let backend = match Backend::from_env() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!(error = %e, "Backend initialization failed");
            std::process::exit(1);
        }
    };
    tracing::info!(device = %backend.config.device_base_url, "Starting Petwatch");

    let navigator = Navigator::new(Route::Splash);
    let mut routes = navigator.watch();

    let splash = SplashScreen::mount(&backend, navigator.clone());
    routes.wait_for(|route| *route != Route::Splash).await?;
    splash.unmount().await;

    if navigator.current() == Route::Login {
        sign_in_from_env(&backend, &navigator).await;
    }

    if navigator.current() != Route::Home {
        tracing::info!(route = %navigator.current(), "Not signed in, exiting");
        return Ok(());
    }

    navigator.push(Route::Camera);
    let camera = CameraScreen::mount(backend.clone(), navigator.clone()).await;
    let mut state = camera.state();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                tracing::info!(
                    connected = snapshot.connected,
                    power_on = snapshot.power_on,
                    temperature = snapshot.temperature_label().as_deref().unwrap_or("-"),
                    "Camera state"
                );
            }
        }
    }

    camera.unmount().await;
    tracing::info!("Shutting down");
    Ok(())
}

async fn sign_in_from_env(backend: &Arc<Backend>, navigator: &Navigator) {
    let (Ok(email), Ok(password)) = (
        std::env::var("PETWATCH_EMAIL"),
        std::env::var("PETWATCH_PASSWORD"),
    ) else {
        return;
    };

    let mut login = LoginScreen::new(backend.clone(), navigator.clone());
    login.set_email(&email);
    login.set_password(&password);
    if let Err(e) = login.submit().await {
        tracing::warn!(message = %e.user_message(), "Sign-in from environment failed");
    }
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), tracing_subscriber::filter::ParseError> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("petwatch=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
