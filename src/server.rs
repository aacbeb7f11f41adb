//! # HTTP Inference Server
//!
//! HTTP server exposing the prediction endpoint along with the standard
//! operational endpoints.
//!
//! ## Endpoints
//!
//! - `POST /predict`: validates a 12-field health-survey payload, scales
//!   the feature vector, classifies it, and returns the diagnosis
//! - `GET /health`: simple health check returning 200 OK
//! - `GET /metrics`: JSON snapshot of the request/prediction counters
//! - `OPTIONS *`: CORS preflight (all origins permitted)
//! - Other paths return 404 Not Found
//!
//! ## Concurrency Model
//!
//! The loaded artifacts are immutable after startup and shared behind an
//! `Arc`, so request handlers are stateless and need no synchronization.
//! Transform and inference are synchronous in-memory arithmetic.

use crate::artifacts::{diagnosis_label, ensure_model_file, Classifier, Scaler};
use crate::config::ServiceConfig;
use crate::error::{DiascreenError, Result};
use crate::features::FeatureRecord;
use crate::metrics::MetricsCollector;
use http::{Method, StatusCode};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, instrument, warn};

/// Process-wide immutable inference state
///
/// Holds the two fitted artifacts plus the metrics collector. Created once
/// during startup, then shared read-only across all request handlers.
#[derive(Debug)]
pub struct InferenceState {
    /// Fitted feature scaler
    pub scaler: Scaler,
    /// Fitted classifier
    pub classifier: Classifier,
    /// Request/prediction counters
    pub metrics: MetricsCollector,
}

impl InferenceState {
    /// Performs artifact bootstrap and builds the shared state
    ///
    /// Downloads the model artifact when absent and a URL is configured,
    /// then loads and validates both artifacts. Any failure is returned as
    /// an error and must abort startup: the service never begins accepting
    /// requests without both artifacts in memory.
    pub async fn initialize(config: &ServiceConfig) -> Result<Arc<Self>> {
        ensure_model_file(&config.model_path, config.model_url.as_deref()).await?;
        let classifier = Classifier::load(&config.model_path)?;
        let scaler = Scaler::load(&config.scaler_path)?;
        Ok(Arc::new(InferenceState {
            scaler,
            classifier,
            metrics: MetricsCollector::new(),
        }))
    }
}

/// HTTP inference server
///
/// Owns the listener lifecycle: binding, request dispatch, and graceful
/// shutdown. Configuration and inference state are immutable after
/// construction.
pub struct InferenceServer {
    /// Validated service configuration
    config: Arc<ServiceConfig>,
    /// Shared artifacts and metrics
    state: Arc<InferenceState>,
}

impl InferenceServer {
    /// Creates a new server instance
    ///
    /// No network connections are established during construction; the
    /// listener binds in [`InferenceServer::start`].
    pub fn new(config: Arc<ServiceConfig>, state: Arc<InferenceState>) -> Self {
        Self { config, state }
    }

    /// Starts the server and blocks until a ctrl-c signal arrives
    ///
    /// # Error Conditions
    ///
    /// - Address already in use (port conflict)
    /// - Permission denied for privileged ports
    #[instrument(skip(self))]
    pub async fn start(self) -> Result<()> {
        let (_shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        };
        tokio::select! {
            result = self.start_with_shutdown(shutdown_rx, None) => result,
            _ = ctrl_c => {
                info!("Shutdown signal received, stopping inference server");
                Ok(())
            }
        }
    }

    /// Starts the server with an explicit shutdown channel
    ///
    /// Blocks the current task until `shutdown_rx` fires or the server
    /// fails. When `ready_tx` is provided, the bound local address is sent
    /// on it once the listener is accepting connections; this is how tests
    /// drive the server on an ephemeral port.
    pub async fn start_with_shutdown(
        self,
        shutdown_rx: oneshot::Receiver<()>,
        ready_tx: Option<oneshot::Sender<SocketAddr>>,
    ) -> Result<()> {
        info!(
            listen_addr = %self.config.listen_addr,
            service_name = %self.config.service_name,
            "Starting inference server"
        );

        let state = Arc::clone(&self.state);
        let make_svc = make_service_fn(move |_conn| {
            let state = Arc::clone(&state);
            async move {
                Ok::<_, Infallible>(service_fn(move |req| {
                    handle_request(req, Arc::clone(&state))
                }))
            }
        });

        let builder = Server::try_bind(&self.config.listen_addr).map_err(|e| {
            error!(error = %e, listen_addr = %self.config.listen_addr, "Failed to bind to address");
            DiascreenError::internal(
                format!("failed to bind {}", self.config.listen_addr),
                Some(Box::new(e)),
            )
        })?;

        let server = builder.serve(make_svc);
        let local_addr = server.local_addr();
        info!(local_addr = %local_addr, "Inference server listening");

        if let Some(ready_tx) = ready_tx {
            let _ = ready_tx.send(local_addr);
        }

        let graceful = server.with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            info!("Inference server shutdown signal received");
        });

        if let Err(e) = graceful.await {
            error!(error = %e, "Inference server error");
            return Err(DiascreenError::internal(
                "HTTP server error",
                Some(Box::new(e)),
            ));
        }

        info!("Inference server shut down");
        Ok(())
    }
}

/// Routes incoming HTTP requests to the appropriate handler
///
/// Every response, including errors, carries `Access-Control-Allow-Origin:
/// *` — the service permits all origins.
#[instrument(skip_all, fields(method = ?req.method(), path = req.uri().path()))]
async fn handle_request(
    req: Request<Body>,
    state: Arc<InferenceState>,
) -> std::result::Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!(method = %method, path = %path, "Processing request");

    let mut response = match (&method, path.as_str()) {
        (&Method::POST, "/predict") => handle_predict(req, state).await,
        (&Method::GET, "/health") => handle_health(),
        (&Method::GET, "/metrics") => handle_metrics(state),
        (&Method::OPTIONS, _) => handle_preflight(),
        _ => {
            warn!(method = %method, path = %path, "Request to unknown endpoint");
            Response::builder()
                .status(StatusCode::NOT_FOUND)
                .header("content-type", "text/plain")
                .body(Body::from("Not Found"))
                .unwrap_or_else(|_| Response::new(Body::empty()))
        }
    };

    response
        .headers_mut()
        .insert("access-control-allow-origin", http::HeaderValue::from_static("*"));

    debug!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        "Request completed"
    );

    Ok(response)
}

/// Handles `POST /predict`
///
/// Runs the validate → assemble → scale → classify → map pipeline and
/// converts the outcome into an HTTP response. Validation failures map to
/// 400 with the missing field names enumerated; transform, inference, and
/// body-parse failures map to 500 with the error message surfaced
/// verbatim. No retries, no partial results.
async fn handle_predict(req: Request<Body>, state: Arc<InferenceState>) -> Response<Body> {
    state.metrics.record_request();

    match run_prediction(req, &state).await {
        Ok(prediction) => {
            state.metrics.record_completion(Some(prediction));
            debug!(prediction, diagnosis = diagnosis_label(prediction), "Prediction served");
            json_response(
                StatusCode::OK,
                &json!({
                    "prediction": prediction,
                    "diagnosis": diagnosis_label(prediction),
                }),
            )
        }
        Err(e) => {
            state.metrics.record_completion(None);
            let status = StatusCode::from_u16(e.to_http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            warn!(error = %e, status = status.as_u16(), "Prediction request failed");
            json_response(status, &json!({ "error": e.to_string() }))
        }
    }
}

/// The prediction pipeline proper, separated so every failure funnels
/// through one error-to-response conversion
async fn run_prediction(req: Request<Body>, state: &InferenceState) -> Result<usize> {
    let body = hyper::body::to_bytes(req.into_body())
        .await
        .map_err(|e| DiascreenError::internal("failed to read request body", Some(Box::new(e))))?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| DiascreenError::internal("request body is not valid JSON", Some(Box::new(e))))?;
    let payload = payload
        .as_object()
        .ok_or_else(|| DiascreenError::internal("request body must be a JSON object", None))?;

    let record = FeatureRecord::from_payload(payload)?;
    let scaled = state.scaler.transform(&record);
    state.classifier.predict(&scaled)
}

/// Handles `GET /health`
fn handle_health() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/plain")
        .header("cache-control", "no-cache")
        .body(Body::from("healthy"))
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build health response");
            Response::new(Body::empty())
        })
}

/// Handles `GET /metrics`
fn handle_metrics(state: Arc<InferenceState>) -> Response<Body> {
    let snapshot = state.metrics.snapshot();
    match serde_json::to_string(&snapshot) {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header("content-type", "application/json")
            .header("cache-control", "no-cache, no-store, must-revalidate")
            .body(Body::from(body))
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to build metrics response");
                Response::new(Body::empty())
            }),
        Err(e) => {
            error!(error = %e, "Failed to serialize metrics snapshot");
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("content-type", "text/plain")
                .body(Body::from("Internal Server Error"))
                .unwrap_or_else(|_| Response::new(Body::empty()))
        }
    }
}

/// Handles CORS preflight requests for any path
fn handle_preflight() -> Response<Body> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("access-control-allow-methods", "GET, POST, OPTIONS")
        .header("access-control-allow-headers", "content-type")
        .body(Body::empty())
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build preflight response");
            Response::new(Body::empty())
        })
}

fn json_response(status: StatusCode, body: &Value) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to build JSON response");
            Response::new(Body::empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::{CLASS_COUNT, MODEL_SCHEMA, SCALER_SCHEMA};
    use crate::features::FEATURE_COUNT;

    fn test_state() -> Arc<InferenceState> {
        // Class score rises with BMI: coefficient row c has weight c on
        // feature index 2.
        let mut coefficients = vec![vec![0.0; FEATURE_COUNT]; CLASS_COUNT];
        for (class, row) in coefficients.iter_mut().enumerate() {
            row[2] = class as f64;
        }
        Arc::new(InferenceState {
            scaler: Scaler {
                schema: SCALER_SCHEMA.to_string(),
                mean: vec![0.0; FEATURE_COUNT],
                scale: vec![1.0; FEATURE_COUNT],
            },
            classifier: Classifier {
                schema: MODEL_SCHEMA.to_string(),
                coefficients,
                intercepts: vec![0.0; CLASS_COUNT],
            },
            metrics: MetricsCollector::new(),
        })
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    const FULL_BODY: &str = r#"{
        "HighBP": 1, "HighChol": 0, "BMI": 28.5, "Smoker": 0,
        "Stroke": 0, "HeartDiseaseorAttack": 0, "PhysActivity": 1,
        "Fruits": 1, "Veggies": 1, "HvyAlcoholConsump": 0,
        "Sex": 1, "Age": 9
    }"#;

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_predict_success() {
        let state = test_state();
        let response = handle_request(predict_request(FULL_BODY), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "*"
        );
        let body = body_json(response).await;
        // Positive BMI means class 2 has the highest score.
        assert_eq!(body["prediction"], 2);
        assert_eq!(body["diagnosis"], "Diabetes");
        assert_eq!(state.metrics.snapshot().predictions[2], 1);
    }

    #[tokio::test]
    async fn test_predict_is_deterministic() {
        let state = test_state();
        let first = body_json(
            handle_request(predict_request(FULL_BODY), Arc::clone(&state))
                .await
                .unwrap(),
        )
        .await;
        let second = body_json(
            handle_request(predict_request(FULL_BODY), Arc::clone(&state))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_predict_empty_payload_lists_all_missing_fields() {
        let state = test_state();
        let response = handle_request(predict_request("{}"), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Missing fields:"));
        for field in crate::features::EXPECTED_FIELDS {
            assert!(message.contains(field), "missing {field} in error message");
        }
        assert_eq!(state.metrics.snapshot().total_errors, 1);
    }

    #[tokio::test]
    async fn test_predict_non_numeric_value_is_500() {
        let state = test_state();
        let body = FULL_BODY.replace("28.5", "\"28.5\"");
        let response = handle_request(predict_request(&body), state).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("BMI"));
    }

    #[tokio::test]
    async fn test_predict_malformed_body_is_500() {
        let state = test_state();
        let response = handle_request(predict_request("not json"), Arc::clone(&state))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = handle_request(predict_request("[1, 2, 3]"), state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("JSON object"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reports_counters() {
        let state = test_state();
        handle_request(predict_request(FULL_BODY), Arc::clone(&state))
            .await
            .unwrap();

        let request = Request::builder()
            .method(Method::GET)
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(request, state).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["total_requests"], 1);
        assert_eq!(body["total_errors"], 0);
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let request = Request::builder()
            .method(Method::GET)
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_preflight_grants_all_origins() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/predict")
            .body(Body::empty())
            .unwrap();
        let response = handle_request(request, test_state()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(response.headers().contains_key("access-control-allow-methods"));
    }
}
