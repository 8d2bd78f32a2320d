//! HTTP client for the deployed classification endpoint.
//!
//! One POST per call. Retries live in the Invoker, never here.

use crate::models::{resolve_token, EndpointConfig, FlexionError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Decoded endpoint response.
///
/// Deployed models answer with either a bare label string or a structured
/// object; both shapes serialize back to the wire form they arrived in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Classification {
    Detailed {
        label: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    Label(String),
}

impl Classification {
    /// The predicted class label regardless of response shape.
    pub fn label(&self) -> &str {
        match self {
            Self::Detailed { label, .. } => label,
            Self::Label(label) => label,
        }
    }
}

/// A deployed model that classifies single flex readings.
#[async_trait]
pub trait SensorEndpoint: Send + Sync {
    /// Classify one reading. Exactly one network attempt.
    async fn classify(&self, flex_value: f64) -> Result<Classification>;
}

/// reqwest-backed endpoint client.
pub struct EndpointClient {
    http: reqwest::Client,
    base_url: String,
    name: String,
    timeout: Duration,
    token: Option<String>,
}

impl EndpointClient {
    /// Build a client from config, resolving the bearer token eagerly so a
    /// misconfigured token fails at startup rather than mid-request.
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let token = resolve_token("endpoint", &config.api_key, &config.api_key_env)?;
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FlexionError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            name: config.name.clone(),
            timeout,
            token,
        })
    }

    fn invocation_url(&self) -> String {
        format!("{}/endpoints/{}/invocations", self.base_url, self.name)
    }
}

#[async_trait]
impl SensorEndpoint for EndpointClient {
    async fn classify(&self, flex_value: f64) -> Result<Classification> {
        let url = self.invocation_url();
        debug!(%url, flex_value, "Invoking endpoint");

        let mut request = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/csv")
            .body(flex_value.to_string());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FlexionError::Timeout(self.timeout)
            } else {
                FlexionError::Network(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(FlexionError::Network)?;

        if !status.is_success() {
            return Err(FlexionError::Remote {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| FlexionError::ParseError(format!("Endpoint response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_bare_label() {
        let c: Classification = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(c, Classification::Label("Low".to_string()));
        assert_eq!(c.label(), "Low");
    }

    #[test]
    fn test_decodes_structured_response() {
        let c: Classification =
            serde_json::from_str(r#"{"label": "High", "confidence": 0.92}"#).unwrap();
        match &c {
            Classification::Detailed { label, confidence } => {
                assert_eq!(label, "High");
                assert_eq!(*confidence, Some(0.92));
            }
            other => panic!("expected detailed response, got {other:?}"),
        }
        assert_eq!(c.label(), "High");
    }

    #[test]
    fn test_serializes_back_to_wire_shape() {
        let bare = Classification::Label("Low".to_string());
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            serde_json::json!("Low")
        );

        let detailed = Classification::Detailed {
            label: "High".to_string(),
            confidence: None,
        };
        assert_eq!(
            serde_json::to_value(&detailed).unwrap(),
            serde_json::json!({"label": "High"})
        );
    }

    #[test]
    fn test_invocation_url_handles_trailing_slash() {
        let mut config = EndpointConfig::default();
        config.base_url = "http://sensors.internal:8080/".to_string();
        let client = EndpointClient::new(&config).unwrap();
        assert_eq!(
            client.invocation_url(),
            "http://sensors.internal:8080/endpoints/flex-classifier/invocations"
        );
    }
}
