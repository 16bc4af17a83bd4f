//! Integration tests using wiremock to simulate the NIDS backend.

use nids_client::models::{Alert, BackendStatus, FlowFeatures, HealthReport};
use nids_client::{
    Client, DashboardApi, Error, Notification, NotificationCenter, Notifier, RequestDescriptor,
    RetryPolicy, Severity, NETWORK_ERROR_MESSAGE,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Same shape as the default policy, scaled down so tests finish quickly.
fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(100),
        jitter: Duration::from_millis(5),
    }
}

fn client_for(uri: &str, center: &NotificationCenter, policy: RetryPolicy) -> Client {
    Client::builder()
        .base_url(uri)
        .unwrap()
        .retry_policy(policy)
        .notifier(center.clone())
        .build()
        .unwrap()
}

/// Keeps every notification handed to it, suppressed or not.
#[derive(Default)]
struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn received(&self) -> Vec<Notification> {
        self.received.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}

fn recording_client(uri: &str, recorder: &Arc<RecordingNotifier>) -> Client {
    Client::builder()
        .base_url(uri)
        .unwrap()
        .retry_policy(fast_policy())
        .notifier(recorder.clone())
        .build()
        .unwrap()
}

fn alert_rows() -> serde_json::Value {
    json!([
        {"id": 2, "src_ip": "10.0.0.9", "dst_ip": "8.8.8.8", "score": 0.91, "label": 1,
         "rf": 0.9, "svm": 0.85, "ann": 0.97, "ts": 1700000200},
        {"id": 1, "src_ip": "10.0.0.3", "dst_ip": "1.1.1.1", "score": 0.08, "label": 0,
         "rf": 0.1, "svm": 0.05, "ann": 0.09, "ts": 1700000100}
    ])
}

#[tokio::test]
async fn test_successful_get_request() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health"))
        .and(header("content-type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok", "message": "Backend running successfully"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let response = client.get::<serde_json::Value>("/api/health").await.unwrap();

    assert_eq!(response.data["status"], "ok");
    assert_eq!(response.status.as_u16(), 200);
    assert_eq!(response.retries, 0);
    assert!(!response.was_retried());
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_predict_posts_json_body() {
    let mock_server = MockServer::start().await;

    let flow = FlowFeatures {
        src_ip: "192.168.1.10".to_string(),
        dst_ip: "8.8.8.8".to_string(),
        features: vec![12.0, 3400.0, 0.8, 283.3, 4250.0],
    };

    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .and(body_json(&flow))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rf": 0.4, "svm": 0.5, "ann": 0.7, "score": 0.54, "label": 1, "status": "Intrusion"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let api = DashboardApi::new(client_for(&mock_server.uri(), &center, fast_policy()));

    let prediction = api.predict(&flow).await.unwrap();

    assert!(prediction.is_intrusion());
    assert_eq!(prediction.status, "Intrusion");
    assert_eq!(prediction.score, 0.54);
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_terminal_error_is_not_retried() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/predict"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "model not found"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, RetryPolicy::default());

    let start = Instant::now();
    let result = client
        .post::<_, serde_json::Value>("/api/predict", &json!({"features": [1, 2, 3]}))
        .await;

    let err = result.unwrap_err();
    assert!(
        matches!(err, Error::HttpError { status, .. } if status.as_u16() == 404),
        "Expected HttpError, got {:?}",
        err
    );
    assert!(!err.is_retryable());
    // No backoff wait happened.
    assert!(start.elapsed() < Duration::from_secs(2));

    let active = center.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].notification.message, "model not found");
    assert_eq!(active[0].notification.duration, Duration::from_secs(5));
}

#[tokio::test]
async fn test_recovers_after_one_transient_error() {
    init_tracing();
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();
    let rows = alert_rows();

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                ResponseTemplate::new(503).set_body_string("Service unavailable")
            } else {
                ResponseTemplate::new(200).set_body_json(&rows)
            }
        })
        .mount(&mock_server)
        .await;

    // Default policy: the single retry waits 2000..3000ms.
    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, RetryPolicy::default());

    let start = Instant::now();
    let response = client.get::<Vec<Alert>>("/api/alerts").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(response.data.len(), 2);
    assert_eq!(response.data[0].id, 2);
    assert_eq!(response.retries, 1);
    assert_eq!(attempt_count.load(Ordering::SeqCst), 2);
    assert!(elapsed >= Duration::from_millis(2000), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(4000), "elapsed {:?}", elapsed);
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_success_on_last_retry_notifies_nothing() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/api/system"))
        .respond_with(move |_req: &wiremock::Request| {
            let count = attempt_count_clone.fetch_add(1, Ordering::SeqCst);
            match count {
                0 => ResponseTemplate::new(502),
                1 => ResponseTemplate::new(429),
                2 => ResponseTemplate::new(408),
                _ => ResponseTemplate::new(200).set_body_json(json!({
                    "cpu": 12.5, "memory": 40.0, "disk": 71.2,
                    "net_sent": 10, "net_recv": 20, "net_speed": 0.5
                })),
            }
        })
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let api = DashboardApi::new(client_for(&mock_server.uri(), &center, fast_policy()));

    let stats = api.system_stats().await.unwrap();

    assert_eq!(stats.cpu, 12.5);
    assert_eq!(attempt_count.load(Ordering::SeqCst), 4);
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_retries_exhausted() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Server error"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let result = client.get::<Vec<Alert>>("/api/alerts").await;

    match result {
        Err(Error::HttpError { status, .. }) => assert_eq!(status.as_u16(), 500),
        _ => panic!("Expected HttpError, got {:?}", result),
    }

    let active = center.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].notification.message, "Internal server error");
    assert_eq!(active[0].notification.duration, Duration::from_secs(5));
}

#[tokio::test]
async fn test_repeated_timeouts() {
    init_tracing();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/system"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"cpu": 1.0}))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(4)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = Client::builder()
        .base_url(mock_server.uri())
        .unwrap()
        .timeout(Duration::from_millis(50))
        .retry_policy(fast_policy())
        .notifier(center.clone())
        .build()
        .unwrap();

    let start = Instant::now();
    let result = client.get::<serde_json::Value>("/api/system").await;
    let elapsed = start.elapsed();

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Timeout), "Expected Timeout, got {:?}", err);
    assert!(err.is_network());

    // Four timed-out attempts plus the backoff floors (10 + 20 + 40ms).
    assert!(elapsed >= Duration::from_millis(4 * 50 + 70), "elapsed {:?}", elapsed);

    let active = center.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].notification.message, NETWORK_ERROR_MESSAGE);
    assert_eq!(active[0].notification.duration, Duration::from_secs(10));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on the discard port.
    let center = NotificationCenter::new();
    let client = client_for("http://127.0.0.1:9", &center, fast_policy());

    let result = client.get::<serde_json::Value>("/api/health").await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "Expected Network error, got {:?}", err);
    assert!(err.is_retryable());

    let active = center.active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].notification.duration, Duration::from_secs(10));

    let health: Result<HealthReport, Error> = Err(err);
    assert_eq!(BackendStatus::from_health(&health), BackendStatus::Offline);
}

#[tokio::test]
async fn test_deserialization_error_is_terminal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let result = client.get::<Vec<Alert>>("/api/alerts").await;

    match result {
        Err(Error::DeserializationFailed {
            raw_response,
            status,
            ..
        }) => {
            assert_eq!(status.as_u16(), 200);
            assert_eq!(raw_response, "<html>maintenance</html>");
        }
        _ => panic!("Expected DeserializationFailed, got {:?}", result),
    }
    assert_eq!(center.len(), 1);
}

#[tokio::test]
async fn test_concurrent_failures_each_notify() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(ResponseTemplate::new(403))
        .expect(2)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let (first, second) = tokio::join!(
        client.get::<Vec<Alert>>("/api/alerts"),
        client.get::<Vec<Alert>>("/api/alerts"),
    );
    assert!(first.is_err());
    assert!(second.is_err());

    let active = center.active();
    assert_eq!(active.len(), 2);
    assert!(active
        .iter()
        .all(|toast| toast.notification.message == "Access forbidden"));
    assert_ne!(active[0].id, active[1].id);
}

#[tokio::test]
async fn test_retry_counters_are_not_shared() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    // Every other response fails, so two interleaved requests each see a
    // mix of failures and successes.
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(move |_req: &wiremock::Request| {
            if attempt_count_clone.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(json!({"status": "ok"}))
            }
        })
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let first = client.get::<serde_json::Value>("/api/health").await.unwrap();
    let second = client.get::<serde_json::Value>("/api/health").await.unwrap();

    assert_eq!(first.retries, 1);
    assert_eq!(second.retries, 1);
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_abandoned_request_does_not_notify() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(200)))
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), client.get::<Vec<Alert>>("/api/alerts"))
            .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(center.is_empty());
}

#[tokio::test]
async fn test_descriptor_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .and(query_param("limit", "10"))
        .and(header("x-dashboard", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alert_rows()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let client = client_for(&mock_server.uri(), &center, fast_policy());

    let descriptor = RequestDescriptor::get("/api/alerts")
        .with_query_param("limit", "10")
        .with_header("x-dashboard", "main")
        .unwrap();

    let response = client.send::<Vec<Alert>>(descriptor).await.unwrap();
    assert_eq!(response.len(), 2);
    assert!(response.raw_body.contains("10.0.0.9"));
}

#[tokio::test]
async fn test_exhausted_retries_reach_notifier_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/system"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&mock_server)
        .await;

    let recorder = Arc::new(RecordingNotifier::default());
    let client = recording_client(&mock_server.uri(), &recorder);

    let result = client.get::<serde_json::Value>("/api/system").await;
    assert!(result.is_err());

    let received = recorder.received();
    assert_eq!(received.len(), 1, "got {:?}", received);
    assert_eq!(received[0].severity, Severity::Error);
    assert_eq!(received[0].message, "Bad gateway");
    assert!(!received[0].suppressed);
}

#[tokio::test]
async fn test_recovered_request_never_reaches_notifier() {
    let mock_server = MockServer::start().await;
    let attempt_count = Arc::new(AtomicUsize::new(0));
    let attempt_count_clone = attempt_count.clone();

    Mock::given(method("GET"))
        .and(path("/api/alerts"))
        .respond_with(move |_req: &wiremock::Request| {
            if attempt_count_clone.fetch_add(1, Ordering::SeqCst) < 2 {
                ResponseTemplate::new(503)
            } else {
                ResponseTemplate::new(200).set_body_json(alert_rows())
            }
        })
        .mount(&mock_server)
        .await;

    let recorder = Arc::new(RecordingNotifier::default());
    let client = recording_client(&mock_server.uri(), &recorder);

    let response = client.get::<Vec<Alert>>("/api/alerts").await.unwrap();

    assert_eq!(response.retries, 2);
    assert!(recorder.received().is_empty());
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nids/api/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "message": "up"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let center = NotificationCenter::new();
    let api = DashboardApi::new(client_for(
        &format!("{}/nids", mock_server.uri()),
        &center,
        fast_policy(),
    ));

    let health = api.health().await;

    assert_eq!(BackendStatus::from_health(&health), BackendStatus::Online);
    assert!(center.is_empty());
}
