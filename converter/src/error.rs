//! Error type shared by the conversion engine and its collaborators.
//!
//! Only failures that abort a run are errors. Unresolved terms, empty
//! controlled fields, validator rejections and publish rejections are
//! ordinary outcomes and never surface here.

use std::path::PathBuf;

use cedar_template::BlueprintError;

/// Fatal conversion failure.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// A remote service answered with a non-success status.
    #[error("{endpoint} responded with status {status}")]
    UpstreamUnavailable {
        /// Endpoint URL that was called.
        endpoint: String,
        /// HTTP status code received.
        status: u16,
    },
    /// A remote service could not be reached or its body could not be read.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        /// Endpoint URL that was called.
        endpoint: String,
        /// Underlying HTTP client error.
        source: reqwest::Error,
    },
    /// The source template reference does not resolve to any content.
    #[error("source template not found: {reference}")]
    NotFound {
        /// Human-readable form of the reference.
        reference: String,
    },
    /// Entity construction failed.
    #[error(transparent)]
    Blueprint(#[from] BlueprintError),
    /// A JSON payload did not have the expected shape.
    #[error("malformed {what}: {source}")]
    Format {
        /// What was being parsed.
        what: &'static str,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// A base64 template payload could not be decoded.
    #[error("failed to decode template payload from {reference}: {source}")]
    Decode {
        /// Human-readable form of the reference.
        reference: String,
        /// Underlying decode failure.
        source: base64::DecodeError,
    },
    /// A local file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for [`crate::config::Config`].
    #[error("invalid configuration file {}: {source}", path.display())]
    Config {
        /// Configuration file path.
        path: PathBuf,
        /// Underlying parse failure.
        source: toml::de::Error,
    },
}

impl ConvertError {
    pub(crate) fn transport(endpoint: &str, source: reqwest::Error) -> Self {
        ConvertError::Transport {
            endpoint: endpoint.to_owned(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }
}
