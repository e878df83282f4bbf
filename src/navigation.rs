// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen routing with a history stack.

use parking_lot::Mutex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;

/// Named destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Splash,
    Login,
    Register,
    Home,
    Camera,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Splash => "/splash",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Home => "/home",
            Route::Camera => "/camera",
        }
    }

    /// Screens that only make sense with a signed-in user.
    pub fn requires_auth(self) -> bool {
        matches!(self, Route::Home | Route::Camera)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown route: {0}")]
pub struct UnknownRoute(String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "/splash" => Ok(Route::Splash),
            "/login" => Ok(Route::Login),
            "/register" => Ok(Route::Register),
            "/home" => Ok(Route::Home),
            "/camera" => Ok(Route::Camera),
            other => Err(UnknownRoute(other.to_string())),
        }
    }
}

/// Shared navigation stack. Cloning shares the same stack.
///
/// The stack is never empty; the last entry is the visible screen.
#[derive(Clone)]
pub struct Navigator {
    stack: Arc<Mutex<Vec<Route>>>,
    current: Arc<watch::Sender<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self {
            stack: Arc::new(Mutex::new(vec![initial])),
            current: Arc::new(current),
        }
    }

    /// Open `route` on top of the current screen.
    pub fn push(&self, route: Route) {
        let mut stack = self.stack.lock();
        stack.push(route);
        self.publish(&stack, "push");
    }

    /// Swap the current screen for `route`; earlier history stays.
    pub fn replace(&self, route: Route) {
        let mut stack = self.stack.lock();
        stack.pop();
        stack.push(route);
        self.publish(&stack, "replace");
    }

    /// Replace the whole history with `route`.
    pub fn reset(&self, route: Route) {
        let mut stack = self.stack.lock();
        stack.clear();
        stack.push(route);
        self.publish(&stack, "reset");
    }

    /// Go back one entry. Returns false at the root.
    pub fn back(&self) -> bool {
        let mut stack = self.stack.lock();
        if stack.len() <= 1 {
            return false;
        }
        stack.pop();
        self.publish(&stack, "back");
        true
    }

    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    pub fn history(&self) -> Vec<Route> {
        self.stack.lock().clone()
    }

    /// Observe the visible route.
    pub fn watch(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }

    fn publish(&self, stack: &[Route], op: &'static str) {
        if let Some(&top) = stack.last() {
            tracing::debug!(op, route = %top, depth = stack.len(), "Navigated");
            self.current.send_replace(top);
        }
    }
}
