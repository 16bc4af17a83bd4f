//! Headless dashboard: polls the backend the way the web views do.
//!
//! This example shows how to:
//! - Build a client from `NIDS_API_BASE` / `NIDS_TIMEOUT_MS`
//! - Poll system stats, alerts and health every 4 seconds
//! - Pop up newly detected intrusions
//! - Render the client's failure notifications without raising duplicates
//!
//! Run with: `cargo run --example dashboard_poll`

use nids_client::models::{AlertSummary, BackendStatus, IntrusionWatcher};
use nids_client::poll::{PollHandle, DEFAULT_POLL_INTERVAL};
use nids_client::{Client, ClientConfig, DashboardApi, Error, NotificationCenter};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("nids_client=info,dashboard_poll=info")
        .init();

    let toasts = NotificationCenter::new();
    let client = Client::builder()
        .config(ClientConfig::from_env())?
        .notifier(toasts.clone())
        .build()?;
    let api = DashboardApi::new(client);

    println!("Polling {} every {:?}", api.client().base_url(), DEFAULT_POLL_INTERVAL);

    let stats_api = api.clone();
    let stats = PollHandle::spawn(
        DEFAULT_POLL_INTERVAL,
        move || {
            let api = stats_api.clone();
            async move { api.system_stats().await }
        },
        |result| {
            // Failures were already reported by the client.
            if let Ok(stats) = result {
                println!(
                    "cpu {:5.1}%  mem {:5.1}%  disk {:5.1}%  net {:.2} MB",
                    stats.cpu, stats.memory, stats.disk, stats.net_speed
                );
            }
        },
    );

    let alerts_api = api.clone();
    let mut watcher = IntrusionWatcher::new();
    let alerts = PollHandle::spawn(
        DEFAULT_POLL_INTERVAL,
        move || {
            let api = alerts_api.clone();
            async move { api.alerts().await }
        },
        move |result| {
            let Ok(alerts) = result else { return };
            let summary = AlertSummary::from_alerts(&alerts);
            println!(
                "alerts: {} total, {} intrusions, {} normal",
                summary.total, summary.intrusions, summary.normal
            );
            if let Some(alert) = watcher.observe(&alerts) {
                println!(
                    "!!! intrusion {} -> {} (score {:.2})",
                    alert.src_ip, alert.dst_ip, alert.score
                );
            }
        },
    );

    let health_api = api.clone();
    let health = PollHandle::spawn(
        DEFAULT_POLL_INTERVAL,
        move || {
            let api = health_api.clone();
            async move { api.health().await }
        },
        |result| println!("backend: {:?}", BackendStatus::from_health(&result)),
    );

    let toast_area = toasts.clone();
    let toast_view = PollHandle::spawn(
        Duration::from_secs(1),
        move || {
            let toasts = toast_area.clone();
            async move { toasts.active() }
        },
        |active| {
            for toast in active {
                eprintln!("[toast #{}] {}", toast.id, toast.notification.message);
            }
        },
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Failed to listen for ctrl-c: {}", e);
    }

    stats.stop().await;
    alerts.stop().await;
    health.stop().await;
    toast_view.stop().await;
    toasts.clear();

    Ok(())
}
