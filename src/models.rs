//! Response shapes of the backend endpoints and the small derivations the
//! dashboard views compute from them.

use serde::{Deserialize, Serialize};

/// Label the detector assigns to malicious flows.
pub const INTRUSION_LABEL: i64 = 1;

/// Label the detector assigns to benign flows.
pub const NORMAL_LABEL: i64 = 0;

/// One stored detection result, as returned by `GET /api/alerts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: u64,
    #[serde(default)]
    pub src_ip: String,
    #[serde(default)]
    pub dst_ip: String,
    pub score: f64,
    pub label: i64,
    /// Per-model scores: random forest, SVM, neural network.
    #[serde(default)]
    pub rf: Option<f64>,
    #[serde(default)]
    pub svm: Option<f64>,
    #[serde(default)]
    pub ann: Option<f64>,
    /// Unix timestamp (seconds).
    pub ts: i64,
}

impl Alert {
    pub fn is_intrusion(&self) -> bool {
        self.label == INTRUSION_LABEL
    }
}

/// `GET /api/health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Host metrics from `GET /api/system`. Percentages are 0-100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStats {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    /// Bytes sent since boot.
    pub net_sent: u64,
    /// Bytes received since boot.
    pub net_recv: u64,
    /// Total transfer in MB.
    pub net_speed: f64,
}

/// `POST /api/predict` request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowFeatures {
    pub src_ip: String,
    pub dst_ip: String,
    /// `[pkt_count, bytes, duration, avg_pkt_size, bytes_per_sec]`
    pub features: Vec<f64>,
}

/// `POST /api/predict` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub rf: f64,
    pub svm: f64,
    pub ann: f64,
    /// Ensemble score.
    pub score: f64,
    pub label: i64,
    /// `"Intrusion"` or `"Normal"`.
    pub status: String,
}

impl Prediction {
    pub fn is_intrusion(&self) -> bool {
        self.label == INTRUSION_LABEL
    }
}

/// Alert counts shown on the dashboard summary card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertSummary {
    pub intrusions: usize,
    pub normal: usize,
    pub total: usize,
}

impl AlertSummary {
    /// Counts alerts by label. Alerts with any other label only add to `total`.
    pub fn from_alerts(alerts: &[Alert]) -> Self {
        let count = |label| alerts.iter().filter(|a| a.label == label).count();
        Self {
            intrusions: count(INTRUSION_LABEL),
            normal: count(NORMAL_LABEL),
            total: alerts.len(),
        }
    }
}

/// Reachability badge for the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Online,
    Offline,
}

impl BackendStatus {
    /// `Online` only for a successful health call reporting `"ok"`.
    pub fn from_health<E>(result: &Result<HealthReport, E>) -> Self {
        match result {
            Ok(report) if report.status == "ok" => BackendStatus::Online,
            _ => BackendStatus::Offline,
        }
    }
}

/// Spots newly stored intrusions across successive alert polls.
///
/// The backend returns alerts newest first. The first list seen only primes
/// the watcher, so alerts that existed before the dashboard opened never pop up.
#[derive(Debug, Clone, Default)]
pub struct IntrusionWatcher {
    last_seen_id: Option<u64>,
}

impl IntrusionWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen_id(&self) -> Option<u64> {
        self.last_seen_id
    }

    /// Records the latest alert list and returns the newest alert if it is
    /// both new and an intrusion.
    pub fn observe<'a>(&mut self, alerts: &'a [Alert]) -> Option<&'a Alert> {
        let newest = alerts.first();
        let Some(last_seen) = self.last_seen_id else {
            self.last_seen_id = Some(newest.map_or(0, |a| a.id));
            return None;
        };
        let newest = newest?;
        if newest.id <= last_seen {
            return None;
        }
        self.last_seen_id = Some(newest.id);
        newest.is_intrusion().then_some(newest)
    }
}
