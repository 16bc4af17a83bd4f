//! # nids-client - resilient client for the NIDS dashboard backend
//!
//! The dashboard polls a detection backend for alerts, health and host
//! metrics. This crate is the piece between the views and the network: it
//! retries transient failures with exponential backoff and jitter,
//! classifies errors, and reports each failed request to the user exactly
//! once.
//!
//! ## Quick Start
//!
//! ```no_run
//! use nids_client::{Client, DashboardApi, NotificationCenter};
//! use nids_client::models::{AlertSummary, BackendStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nids_client::Error> {
//!     let toasts = NotificationCenter::new();
//!     let client = Client::builder()
//!         .config(nids_client::ClientConfig::from_env())?
//!         .notifier(toasts.clone())
//!         .build()?;
//!     let api = DashboardApi::new(client);
//!
//!     let status = BackendStatus::from_health(&api.health().await);
//!     println!("backend: {:?}", status);
//!
//!     if let Ok(alerts) = api.alerts().await {
//!         let summary = AlertSummary::from_alerts(&alerts);
//!         println!("{} intrusions / {} total", summary.intrusions, summary.total);
//!     }
//!
//!     for toast in toasts.active() {
//!         eprintln!("! {}", toast.notification.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! | Failure | Class | Retried |
//! |---|---|---|
//! | no response (network error, timeout) | `Network` | yes |
//! | HTTP 408, 429, 500, 502, 503, 504 | `Transient` | yes |
//! | any other status | `Terminal` | no |
//!
//! Retry `n` (at most 3) waits `min(1s * 2^n, 10s)` plus up to 1s of
//! jitter. See [`RetryPolicy`].
//!
//! ## Notifications
//!
//! Only the final failure of a request is shown: 10s for network errors,
//! 5s for everything else. Requests that recover on a retry show nothing.
//! Callers should log errors and degrade, not raise their own toasts.

pub mod api;
mod client;
pub mod config;
mod descriptor;
mod error;
pub mod models;
pub mod notify;
pub mod poll;
mod response;
pub mod retry;

pub use api::DashboardApi;
pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use descriptor::RequestDescriptor;
pub use error::{Error, ErrorClass, Result, GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE};
pub use notify::{Notification, NotificationCenter, Notifier, Severity, TracingNotifier};
pub use response::Response;
pub use retry::{RetryDecision, RetryPolicy};
