//! Client core for the finsight personal finance dashboard.
//!
//! [`api::ApiClient`] talks to the REST backend, [`store::DashboardStore`]
//! aggregates what the dashboard shows, [`refresh::RefreshController`] keeps it
//! current in the background and [`notify::NotificationRelay`] carries
//! user-facing messages. [`app::App`] wires them together.

pub mod api;
pub mod app;
pub mod boundary;
pub mod chat;
pub mod clock;
pub mod config;
pub mod credentials;
pub mod duration;
pub mod format;
pub mod models;
pub mod notify;
pub mod portfolio;
pub mod refresh;
pub mod session;
pub mod staleness;
pub mod store;
