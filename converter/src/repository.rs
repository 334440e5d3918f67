//! Destination repository collaborator: schema validation and publishing.
//!
//! A validator rejection and a publish rejection are ordinary outcomes, not
//! errors. Only an unreachable service (or a validator answering with a
//! non-success status) is a [`ConvertError`].

use std::fmt;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::CedarConfig;
use crate::error::ConvertError;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// HTTP status the repository answers a successful creation with.
pub const STATUS_CREATED: u16 = 201;

/// Kind of artifact being published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// A whole template.
    Template,
    /// A template element.
    Element,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Template => "template",
            ResourceKind::Element => "element",
        })
    }
}

/// One validator error or warning.
///
/// Serializes back to the validator's own shape, `extra` keys included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// JSON path of the offending node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Every other key the validator sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Validator verdict.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValidationOutcome {
    /// Whether the document passed.
    #[serde(deserialize_with = "bool_or_string")]
    pub validates: bool,
    /// Errors, in validator order.
    #[serde(default)]
    pub errors: Vec<Diagnostic>,
    /// Warnings, in validator order.
    #[serde(default)]
    pub warnings: Vec<Diagnostic>,
}

/// Status and body of one publish call.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    /// HTTP status code.
    pub status: u16,
    /// Response body: parsed JSON, the raw text as a JSON string if it was
    /// not JSON, or `Null` if it was empty.
    pub payload: Value,
}

impl PublishOutcome {
    /// True when the artifact was created.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.status == STATUS_CREATED
    }
}

/// Validates and publishes destination documents.
pub trait TemplateRepository {
    /// Runs `document` through the schema validator.
    ///
    /// # Errors
    ///
    /// Returns an error if the validator cannot be reached, answers with a
    /// non-success status, or sends an unexpected body.
    fn validate(&self, document: &str) -> Result<ValidationOutcome, ConvertError>;

    /// Creates `document` as a new artifact of `kind`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the repository cannot be reached; a
    /// rejection is reported through [`PublishOutcome`].
    fn publish(&self, document: &str, kind: ResourceKind) -> Result<PublishOutcome, ConvertError>;
}

/// Blocking CEDAR REST client.
pub struct CedarClient {
    client: Client,
    base_url: String,
    validator_endpoint: String,
    templates_endpoint: String,
    template_elements_endpoint: String,
    api_key: String,
}

impl CedarClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &CedarConfig) -> Result<Self, ConvertError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConvertError::transport(&config.base_url, e))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            validator_endpoint: config.validator_endpoint.clone(),
            templates_endpoint: config.templates_endpoint.clone(),
            template_elements_endpoint: config.template_elements_endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn post(&self, endpoint: &str, document: &str) -> Result<(String, Response), ConvertError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("apiKey {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
            .body(document.to_owned())
            .send()
            .map_err(|e| ConvertError::transport(&url, e))?;
        Ok((url, response))
    }
}

impl TemplateRepository for CedarClient {
    fn validate(&self, document: &str) -> Result<ValidationOutcome, ConvertError> {
        let (url, response) = self.post(&self.validator_endpoint, document)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConvertError::UpstreamUnavailable {
                endpoint: url,
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|e| ConvertError::transport(&url, e))?;
        serde_json::from_str(&body)
            .map_err(|source| ConvertError::Format { what: "validation response", source })
    }

    fn publish(&self, document: &str, kind: ResourceKind) -> Result<PublishOutcome, ConvertError> {
        let endpoint = match kind {
            ResourceKind::Template => &self.templates_endpoint,
            ResourceKind::Element => &self.template_elements_endpoint,
        };
        let (url, response) = self.post(endpoint, document)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| ConvertError::transport(&url, e))?;
        debug!(kind = %kind, status, "publish response");
        Ok(PublishOutcome {
            status,
            payload: parse_payload(&body),
        })
    }
}

/// Parses a response body as JSON, falling back to a JSON string.
fn parse_payload(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_owned()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Text(String),
}

/// Accepts `true`, `false`, `"true"` and `"false"`.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => b,
        BoolOrString::Text(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validates_accepts_string_and_bool() {
        let outcome: ValidationOutcome =
            serde_json::from_value(json!({"validates": "true", "errors": [], "warnings": []}))
                .expect("parses");
        assert!(outcome.validates);

        let outcome: ValidationOutcome =
            serde_json::from_value(json!({"validates": false})).expect("parses");
        assert!(!outcome.validates);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn diagnostics_keep_unknown_keys() {
        let outcome: ValidationOutcome = serde_json::from_value(json!({
            "validates": "false",
            "errors": [{"message": "missing @id", "location": "/properties/x", "errorType": "schema"}],
            "warnings": []
        }))
        .expect("parses");
        let error = &outcome.errors[0];
        assert_eq!(error.to_string(), "/properties/x: missing @id");
        assert_eq!(error.extra.get("errorType"), Some(&json!("schema")));
        assert_eq!(
            serde_json::to_value(error).expect("serializes"),
            json!({"message": "missing @id", "location": "/properties/x", "errorType": "schema"})
        );
    }

    #[test]
    fn only_201_counts_as_created() {
        let created = PublishOutcome { status: 201, payload: Value::Null };
        let ok = PublishOutcome { status: 200, payload: Value::Null };
        assert!(created.is_created());
        assert!(!ok.is_created());
    }

    #[test]
    fn non_json_payload_is_kept_as_text() {
        assert_eq!(parse_payload("Bad Gateway"), json!("Bad Gateway"));
        assert_eq!(parse_payload(""), Value::Null);
        assert_eq!(parse_payload(r#"{"a":1}"#), json!({"a": 1}));
    }
}
