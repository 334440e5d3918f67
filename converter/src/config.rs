//! Run configuration.
//!
//! An explicit value threaded into collaborator constructors. Every key has
//! a default, so an absent or partial TOML file is valid.
//!
//! ```toml
//! [bioportal]
//! api_key = "..."
//!
//! [cedar]
//! api_key = "..."
//! templates_endpoint = "/templates?folder_id=..."
//!
//! [output]
//! destination = "cedar-template.json"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConvertError;

/// Complete run configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ontology terminology service.
    pub bioportal: BioPortalConfig,
    /// Destination template repository and validator.
    pub cedar: CedarConfig,
    /// Remote source template location.
    pub source: SourceConfig,
    /// Local output locations.
    pub output: OutputConfig,
}

impl Config {
    /// Loads a TOML configuration file, or the defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Io`] if the file cannot be read and
    /// [`ConvertError::Config`] if it is not valid configuration.
    pub fn load(path: Option<&Path>) -> Result<Self, ConvertError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        Self::from_toml(&text).map_err(|source| ConvertError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if `text` is not valid configuration.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// BioPortal REST settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BioPortalConfig {
    /// Base REST URL.
    pub base_url: String,
    /// Ontology catalog endpoint, relative to `base_url`.
    pub ontologies_endpoint: String,
    /// Term search endpoint, relative to `base_url`.
    pub search_endpoint: String,
    /// API key.
    pub api_key: String,
}

impl Default for BioPortalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.bioontology.org".to_owned(),
            ontologies_endpoint: "/ontologies".to_owned(),
            search_endpoint: "/search".to_owned(),
            api_key: String::new(),
        }
    }
}

/// CEDAR REST settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CedarConfig {
    /// Base REST URL.
    pub base_url: String,
    /// Validator endpoint, relative to `base_url`.
    pub validator_endpoint: String,
    /// Template creation endpoint, relative to `base_url`.
    pub templates_endpoint: String,
    /// Template-element creation endpoint, relative to `base_url`.
    pub template_elements_endpoint: String,
    /// API key.
    pub api_key: String,
}

impl Default for CedarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://resource.metadatacenter.org".to_owned(),
            validator_endpoint: "/command/validate?resource_type=template".to_owned(),
            templates_endpoint: "/templates".to_owned(),
            template_elements_endpoint: "/template-elements".to_owned(),
            api_key: String::new(),
        }
    }
}

/// GitHub location of the latest source template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// GitHub REST API base URL.
    pub github_api_url: String,
    /// Repository owner.
    pub github_user: String,
    /// Repository name.
    pub github_repo: String,
    /// Path of the template inside the repository.
    pub github_path: String,
}

impl SourceConfig {
    /// Browsable location of the template, for banners and logs.
    #[must_use]
    pub fn display_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/blob/master/{}",
            self.github_user,
            self.github_repo,
            self.github_path.trim_start_matches('/')
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_owned(),
            github_user: "cdd".to_owned(),
            github_repo: "bioassay-template".to_owned(),
            github_path: "/data/template/schema.json".to_owned(),
        }
    }
}

/// Local output locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default destination document path.
    pub destination: PathBuf,
    /// Default log file path.
    pub log_file: PathBuf,
    /// Directory of `{kind}.json` blueprints replacing the embedded ones.
    pub blueprint_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("bao-cedar-template.json"),
            log_file: PathBuf::from("logs/bao-to-cedar.log"),
            blueprint_dir: None,
        }
    }
}
