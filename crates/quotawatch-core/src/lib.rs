//! quotawatch-core - usage client, refresh controller and formatting for the
//! quotawatch terminal dashboard.
//!
//! The refresh controller is a pure reducer ([`refresh::Controller`]) driven
//! by an async runner ([`refresh::RefreshRunner`]). Presentation only ever
//! sees the read-only [`refresh::ControllerView`].

pub mod auth;
pub mod config;
pub mod format;
pub mod refresh;
pub mod usage;
