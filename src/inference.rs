//! Request-to-response mapping for single classification requests.
//!
//! The handler owns no state between calls: parse the request, run the
//! endpoint call through the Invoker, map the outcome to a status code.
//! Internal failure detail never reaches the response body.

use crate::client::{Classification, Invoker, SensorEndpoint};
use crate::models::{FlexionError, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, warn};

/// Status code plus JSON body, independent of any HTTP framework.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(classification: &Classification) -> Self {
        Self {
            status_code: 200,
            body: json!({ "classification": classification }),
        }
    }

    fn bad_request(message: String) -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": message }),
        }
    }

    fn server_error(message: String) -> Self {
        Self {
            status_code: 500,
            body: json!({ "error": message }),
        }
    }
}

/// Maps inference requests to responses.
pub struct InferenceHandler {
    endpoint: Arc<dyn SensorEndpoint>,
    invoker: Invoker,
}

impl InferenceHandler {
    pub fn new(endpoint: Arc<dyn SensorEndpoint>, invoker: Invoker) -> Self {
        Self { endpoint, invoker }
    }

    /// Handle one request of the form `{"flex_value": <number>}`.
    pub async fn handle(&self, request: &Value) -> ApiResponse {
        match self.classify_request(request).await {
            Ok(classification) => ApiResponse::ok(&classification),
            Err(FlexionError::InvalidRequest(message)) => {
                warn!(%message, "Rejected inference request");
                ApiResponse::bad_request(message)
            }
            Err(e) if e.is_reportable() => {
                error!(error = %e, "Classification failed");
                ApiResponse::server_error(e.to_string())
            }
            Err(e) => {
                error!(error = %e, "Classification failed");
                ApiResponse::server_error("Internal server error".to_string())
            }
        }
    }

    async fn classify_request(&self, request: &Value) -> Result<Classification> {
        let flex_value = parse_flex_value(request)?;
        let endpoint = Arc::clone(&self.endpoint);
        self.invoker
            .run("endpoint classify", || {
                let endpoint = Arc::clone(&endpoint);
                async move { endpoint.classify(flex_value).await }
            })
            .await
    }
}

fn parse_flex_value(request: &Value) -> Result<f64> {
    let field = request.get("flex_value").ok_or_else(|| {
        FlexionError::InvalidRequest("Missing 'flex_value' in request".to_string())
    })?;
    field
        .as_f64()
        .ok_or_else(|| FlexionError::InvalidRequest("flex_value must be a number".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Fails the first `failures` calls with a 503, then answers.
    struct FlakyEndpoint {
        failures: u32,
        calls: AtomicU32,
        label: String,
    }

    impl FlakyEndpoint {
        fn new(failures: u32, label: &str) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                label: label.to_string(),
            }
        }
    }

    #[async_trait]
    impl SensorEndpoint for FlakyEndpoint {
        async fn classify(&self, _flex_value: f64) -> Result<Classification> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(FlexionError::Remote {
                    status: 503,
                    message: "endpoint warming up".to_string(),
                });
            }
            Ok(Classification::Label(self.label.clone()))
        }
    }

    /// Always fails with an internal error carrying sensitive detail.
    struct BrokenEndpoint;

    #[async_trait]
    impl SensorEndpoint for BrokenEndpoint {
        async fn classify(&self, _flex_value: f64) -> Result<Classification> {
            Err(FlexionError::Internal(
                "model artifact corrupted at /srv/secret/model.json".to_string(),
            ))
        }
    }

    fn handler_for(endpoint: Arc<dyn SensorEndpoint>) -> InferenceHandler {
        InferenceHandler::new(endpoint, Invoker::new(3, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let endpoint = Arc::new(FlakyEndpoint::new(2, "Low"));
        let handler = handler_for(endpoint.clone());

        let response = handler.handle(&json!({"flex_value": 42})).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, json!({"classification": "Low"}));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_integer_and_float_values_accepted() {
        let handler = handler_for(Arc::new(FlakyEndpoint::new(0, "Medium")));

        let int_response = handler.handle(&json!({"flex_value": 42})).await;
        let float_response = handler.handle(&json!({"flex_value": 42.5})).await;

        assert_eq!(int_response.status_code, 200);
        assert_eq!(float_response.status_code, 200);
    }

    #[tokio::test]
    async fn test_missing_field_is_rejected() {
        let endpoint = Arc::new(FlakyEndpoint::new(0, "Low"));
        let handler = handler_for(endpoint.clone());

        let response = handler.handle(&json!({"reading": 42})).await;

        assert_eq!(response.status_code, 400);
        let message = response.body["error"].as_str().unwrap();
        assert!(message.contains("flex_value"));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_numeric_field_is_rejected() {
        let endpoint = Arc::new(FlakyEndpoint::new(0, "Low"));
        let handler = handler_for(endpoint.clone());

        let response = handler.handle(&json!({"flex_value": "bad"})).await;

        assert_eq!(response.status_code, 400);
        let message = response.body["error"].as_str().unwrap();
        assert!(message.contains("flex_value"));
        assert!(message.contains("number"));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhaustion_maps_to_500_with_terminal_message() {
        let endpoint = Arc::new(FlakyEndpoint::new(10, "Low"));
        let handler = handler_for(endpoint.clone());

        let response = handler.handle(&json!({"flex_value": 42})).await;

        assert_eq!(response.status_code, 500);
        let message = response.body["error"].as_str().unwrap();
        assert!(message.contains("endpoint classify"));
        assert!(message.contains("3 attempts"));
        assert_eq!(endpoint.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unexpected_failure_is_a_generic_500() {
        let handler = handler_for(Arc::new(BrokenEndpoint));

        let response = handler.handle(&json!({"flex_value": 42})).await;

        assert_eq!(response.status_code, 500);
        let message = response.body["error"].as_str().unwrap();
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("secret"));
    }

    #[tokio::test]
    async fn test_detailed_classification_passes_through() {
        struct DetailedEndpoint;

        #[async_trait]
        impl SensorEndpoint for DetailedEndpoint {
            async fn classify(&self, _flex_value: f64) -> Result<Classification> {
                Ok(Classification::Detailed {
                    label: "High".to_string(),
                    confidence: Some(0.9),
                })
            }
        }

        let handler = handler_for(Arc::new(DetailedEndpoint));
        let response = handler.handle(&json!({"flex_value": 900})).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.body,
            json!({"classification": {"label": "High", "confidence": 0.9}})
        );
    }
}
