//! `bao-cedar-convert`: converts the BioAssay Ontology source template into
//! a CEDAR template, validates it, and optionally publishes it.
//!
//! **Outputs:**
//! - `<destination>`: the CEDAR template as pretty-printed JSON-LD
//! - `<log>`: the run log
//!
//! **Usage:**
//! ```
//! bao-cedar-convert [-s <source>] [-d <destination>] [-l <log>] [-p] [-c <config.toml>]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use bao_converter::ontology::bioportal::BioPortalClient;
use bao_converter::{
    run, CedarClient, Collaborators, Config, GitHubLoader, RandomIdentities, Reporter, RunOptions,
    TemplateReference,
};
use cedar_template::BlueprintSet;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Convert the BAO source template to a CEDAR template.
#[derive(Parser)]
#[command(
    name = "bao-cedar-convert",
    about = "Convert the BioAssay Ontology template to a CEDAR template"
)]
struct Args {
    /// Source template file (default: latest version from the configured GitHub repository).
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Destination template file.
    #[arg(short, long)]
    destination: Option<PathBuf>,

    /// Log file.
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Publish the template and its elements to CEDAR if it validates.
    #[arg(short, long = "post-to-cedar")]
    post_to_cedar: bool,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// BioPortal API key (overrides the configuration file).
    #[arg(long, env = "BIOPORTAL_API_KEY", hide_env_values = true)]
    bioportal_api_key: Option<String>,

    /// CEDAR API key (overrides the configuration file).
    #[arg(long, env = "CEDAR_API_KEY", hide_env_values = true)]
    cedar_api_key: Option<String>,
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(key) = args.bioportal_api_key {
        config.bioportal.api_key = key;
    }
    if let Some(key) = args.cedar_api_key {
        config.cedar.api_key = key;
    }

    let log_file = args.log.unwrap_or_else(|| config.output.log_file.clone());
    init_logging(&log_file)?;
    println!("Logging output to {}", log_file.display());

    let blueprints = match &config.output.blueprint_dir {
        Some(dir) => BlueprintSet::from_dir(dir)
            .with_context(|| format!("Failed to load blueprints from {}", dir.display()))?,
        None => BlueprintSet::embedded(),
    };
    let lookup = BioPortalClient::new(&config.bioportal).context("Failed to create BioPortal client")?;
    let repository = CedarClient::new(&config.cedar).context("Failed to create CEDAR client")?;
    let loader = GitHubLoader::new(&config.source).context("Failed to create GitHub client")?;

    let options = RunOptions {
        source: match args.source {
            Some(path) => TemplateReference::Local(path),
            None => TemplateReference::remote(&config.source),
        },
        destination: args
            .destination
            .unwrap_or_else(|| config.output.destination.clone()),
        publish: args.post_to_cedar,
    };

    let services = Collaborators {
        loader: &loader,
        lookup: &lookup,
        repository: &repository,
        blueprints: &blueprints,
    };
    let mut reporter = Reporter::stdout();
    let summary = run(services, &options, Box::new(RandomIdentities), &mut reporter)
        .map_err(|e| {
            tracing::error!(error = %e, "conversion aborted");
            e
        })
        .context("Conversion failed")?;

    let code = summary.outcome.status_code();
    println!("Status: {}", code.as_str());
    Ok(if summary.outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Sends `tracing` output to `path`, creating its directory.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created or a global
/// subscriber is already installed.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .map_err(|e| anyhow!("Failed to initialise logging: {e}"))
}
