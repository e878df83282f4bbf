//! Per-screen view models.
//!
//! Each screen is mounted with the shared [`Backend`](crate::Backend) and a
//! [`Navigator`](crate::navigation::Navigator), publishes its state through a
//! `watch` channel, and stops its background work on `unmount`.

pub mod camera;
pub mod home;
pub mod login;
pub mod register;
pub mod splash;

pub use camera::{CameraScreen, CameraState, CaptureOutcome};
pub use home::{HomeScreen, HomeState, DEFAULT_PET_NAME};
pub use login::LoginScreen;
pub use register::{RegisterScreen, RegisterState, RegistrationError, RegistrationPhase};
pub use splash::{entry_route, SplashScreen};
