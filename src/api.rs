//! Typed wrappers for the NIDS backend endpoints.
//!
//! Failures are logged and returned. The client has already notified the
//! user by the time a wrapper sees an error, so wrappers never notify again.

use crate::{
    models::{Alert, FlowFeatures, HealthReport, Prediction, SystemStats},
    Client, Result,
};

pub const ALERTS_PATH: &str = "/api/alerts";
pub const HEALTH_PATH: &str = "/api/health";
pub const SYSTEM_PATH: &str = "/api/system";
pub const PREDICT_PATH: &str = "/api/predict";

/// The four endpoints the dashboard uses.
///
/// # Examples
///
/// ```no_run
/// use nids_client::{Client, DashboardApi, models::AlertSummary};
///
/// # async fn example() -> Result<(), nids_client::Error> {
/// let api = DashboardApi::new(Client::from_env()?);
/// let alerts = api.alerts().await?;
/// let summary = AlertSummary::from_alerts(&alerts);
/// println!("{} intrusions out of {}", summary.intrusions, summary.total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DashboardApi {
    client: Client,
}

impl DashboardApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Latest stored alerts, newest first.
    pub async fn alerts(&self) -> Result<Vec<Alert>> {
        self.client
            .get::<Vec<Alert>>(ALERTS_PATH)
            .await
            .map(|response| response.into_data())
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to fetch alerts"))
    }

    pub async fn health(&self) -> Result<HealthReport> {
        self.client
            .get::<HealthReport>(HEALTH_PATH)
            .await
            .map(|response| response.into_data())
            .inspect_err(|e| tracing::warn!(error = %e, "Health check failed"))
    }

    pub async fn system_stats(&self) -> Result<SystemStats> {
        self.client
            .get::<SystemStats>(SYSTEM_PATH)
            .await
            .map(|response| response.into_data())
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to fetch system stats"))
    }

    /// Scores one flow. The backend also stores the result as an alert.
    pub async fn predict(&self, flow: &FlowFeatures) -> Result<Prediction> {
        self.client
            .post::<_, Prediction>(PREDICT_PATH, flow)
            .await
            .map(|response| response.into_data())
            .inspect_err(|e| tracing::warn!(error = %e, "Prediction failed"))
    }
}
