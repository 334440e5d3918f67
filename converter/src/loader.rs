//! Source template retrieval.
//!
//! A template is either a local file or a file in a GitHub repository,
//! fetched through the contents API whose `content` field is base64 with
//! embedded line breaks.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::ConvertError;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CLIENT_NAME: &str = concat!("bao-converter/", env!("CARGO_PKG_VERSION"));

/// Where a source template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateReference {
    /// A file on the local filesystem.
    Local(PathBuf),
    /// A file in a GitHub repository.
    Remote {
        /// Repository owner.
        user: String,
        /// Repository name.
        repo: String,
        /// Path inside the repository.
        path: String,
    },
}

impl TemplateReference {
    /// The repository location named by `config`.
    #[must_use]
    pub fn remote(config: &SourceConfig) -> Self {
        TemplateReference::Remote {
            user: config.github_user.clone(),
            repo: config.github_repo.clone(),
            path: config.github_path.clone(),
        }
    }
}

impl fmt::Display for TemplateReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateReference::Local(path) => write!(f, "{}", path.display()),
            TemplateReference::Remote { user, repo, path } => write!(
                f,
                "https://github.com/{user}/{repo}/blob/master/{}",
                path.trim_start_matches('/')
            ),
        }
    }
}

/// Fetches raw source template bytes.
pub trait TemplateLoader {
    /// Returns the bytes of the template named by `reference`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::NotFound`] if nothing exists at `reference`,
    /// or the transport, status or decode error of the fetch.
    fn load(&self, reference: &TemplateReference) -> Result<Vec<u8>, ConvertError>;
}

/// Reads a local template file.
///
/// # Errors
///
/// Returns [`ConvertError::NotFound`] if the file does not exist and
/// [`ConvertError::Io`] for any other read failure.
pub fn read_local(path: &Path) -> Result<Vec<u8>, ConvertError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConvertError::NotFound {
            reference: path.display().to_string(),
        },
        _ => ConvertError::io(path, e),
    })
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Loader for local files and GitHub-hosted templates.
pub struct GitHubLoader {
    client: Client,
    api_url: String,
}

impl GitHubLoader {
    /// Creates a loader from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &SourceConfig) -> Result<Self, ConvertError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConvertError::transport(&config.github_api_url, e))?;
        Ok(Self {
            client,
            api_url: config.github_api_url.trim_end_matches('/').to_owned(),
        })
    }

    fn fetch(&self, user: &str, repo: &str, path: &str) -> Result<Vec<u8>, ConvertError> {
        let url = format!(
            "{}/repos/{user}/{repo}/contents/{}",
            self.api_url,
            path.trim_start_matches('/')
        );
        info!(url = %url, "downloading source template");
        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, CLIENT_NAME)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(|e| ConvertError::transport(&url, e))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(ConvertError::NotFound { reference: url }),
            status => {
                return Err(ConvertError::UpstreamUnavailable {
                    endpoint: url,
                    status: status.as_u16(),
                })
            }
        }

        let body = response.text().map_err(|e| ConvertError::transport(&url, e))?;
        let contents: ContentsResponse = serde_json::from_str(&body)
            .map_err(|source| ConvertError::Format { what: "repository contents", source })?;
        if let Some(encoding) = contents.encoding.as_deref() {
            debug!(encoding, "contents payload encoding");
        }
        decode_contents(&contents.content, &url)
    }
}

impl TemplateLoader for GitHubLoader {
    fn load(&self, reference: &TemplateReference) -> Result<Vec<u8>, ConvertError> {
        match reference {
            TemplateReference::Local(path) => read_local(path),
            TemplateReference::Remote { user, repo, path } => self.fetch(user, repo, path),
        }
    }
}

/// Decodes a base64 payload, ignoring the line breaks GitHub inserts.
///
/// # Errors
///
/// Returns [`ConvertError::Decode`] if the payload is not valid base64.
pub fn decode_contents(payload: &str, reference: &str) -> Result<Vec<u8>, ConvertError> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|source| ConvertError::Decode {
            reference: reference.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contents_payload_with_line_breaks_decodes() {
        let bytes = decode_contents("eyJyb290Ijog\ne30=\n", "test").expect("decodes");
        assert_eq!(bytes, br#"{"root": {}"#.to_vec());
    }

    #[test]
    fn invalid_payload_is_a_decode_error() {
        assert!(matches!(
            decode_contents("!!!", "test"),
            Err(ConvertError::Decode { .. })
        ));
    }

    #[test]
    fn missing_local_file_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_local(&dir.path().join("absent.json")).expect_err("missing");
        assert!(matches!(err, ConvertError::NotFound { .. }));
    }

    #[test]
    fn local_file_is_read_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema.json");
        std::fs::write(&path, b"{}").expect("write");
        let loader = GitHubLoader::new(&SourceConfig::default()).expect("client");
        assert_eq!(
            loader.load(&TemplateReference::Local(path)).expect("reads"),
            b"{}".to_vec()
        );
    }

    #[test]
    fn remote_reference_displays_as_browsable_url() {
        let reference = TemplateReference::remote(&SourceConfig::default());
        assert_eq!(reference.to_string(), SourceConfig::default().display_url());
    }
}
