//! One end-to-end conversion run.
//!
//! Load → parse → assemble → serialize → write → validate → publish.
//! The document is fully written before the validator is called, and
//! nothing is published unless it validates. Elements are published one at
//! a time after the template, in render order; a rejected element does not
//! stop the rest.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use cedar_template::serializer::jsonld::{to_json_ld_string, to_publish_json};
use cedar_template::{BlueprintSet, Container};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::engine::{ConversionStats, Converter, IdentitySource};
use crate::error::ConvertError;
use crate::loader::{TemplateLoader, TemplateReference};
use crate::ontology::OntologyLookup;
use crate::report::{ReportEntry, Reporter};
use crate::repository::{Diagnostic, PublishOutcome, ResourceKind, TemplateRepository};
use crate::source::SourceDocument;

/// Machine-readable status code of a run outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// Validated; publishing was not requested.
    Validated,
    /// Template and every element created.
    Published,
    /// Template or at least one element rejected.
    PublishFailed,
    /// Validator rejected the document.
    ValidationFailed,
}

impl StatusCode {
    /// Returns the code as written to the log.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Validated => "VALIDATED",
            StatusCode::Published => "PUBLISHED",
            StatusCode::PublishFailed => "PUBLISH_FAILED",
            StatusCode::ValidationFailed => "VALIDATION_FAILED",
        }
    }
}

/// Publish result of one extracted element.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementPublish {
    /// Property key of the element in the template.
    pub name: String,
    /// Repository answer.
    pub outcome: PublishOutcome,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The document validated and publishing was not requested.
    Validated,
    /// The template was created; each element was attempted.
    Published {
        /// Per-element results, in render order.
        elements: Vec<ElementPublish>,
    },
    /// The template itself was rejected; no element was attempted.
    PublishFailed {
        /// HTTP status code.
        status: u16,
        /// Response body.
        payload: Value,
    },
    /// The validator rejected the document; nothing was published.
    ValidationFailed {
        /// Validator errors.
        errors: Vec<Diagnostic>,
        /// Validator warnings.
        warnings: Vec<Diagnostic>,
    },
}

impl RunOutcome {
    /// Status code of this outcome.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            RunOutcome::Validated => StatusCode::Validated,
            RunOutcome::Published { elements } if elements.iter().all(|e| e.outcome.is_created()) => {
                StatusCode::Published
            }
            RunOutcome::Published { .. } | RunOutcome::PublishFailed { .. } => {
                StatusCode::PublishFailed
            }
            RunOutcome::ValidationFailed { .. } => StatusCode::ValidationFailed,
        }
    }

    /// True for `VALIDATED` and `PUBLISHED`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(
            self.status_code(),
            StatusCode::Validated | StatusCode::Published
        )
    }
}

/// What to convert and where to put it.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source template location.
    pub source: TemplateReference,
    /// Destination document path.
    pub destination: PathBuf,
    /// Publish after a successful validation.
    pub publish: bool,
}

/// External services a run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Source template loader.
    pub loader: &'a dyn TemplateLoader,
    /// Ontology terminology service.
    pub lookup: &'a dyn OntologyLookup,
    /// Validator and publisher.
    pub repository: &'a dyn TemplateRepository,
    /// Entity blueprints.
    pub blueprints: &'a BlueprintSet,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Terminal state.
    pub outcome: RunOutcome,
    /// Wall time of the whole run.
    pub elapsed: Duration,
    /// Conversion counters.
    pub stats: ConversionStats,
}

impl RunSummary {
    /// Closing line for the operator.
    #[must_use]
    pub fn closing_message(&self) -> String {
        let secs = self.elapsed.as_secs_f64();
        match self.outcome.status_code() {
            StatusCode::Published => {
                format!("Completed template conversion, validation and upload in {secs:.2} seconds.")
            }
            _ => format!("Completed template conversion and validation in {secs:.2} seconds."),
        }
    }
}

/// Runs one conversion.
///
/// # Errors
///
/// Returns a [`ConvertError`] for every fatal failure: an unavailable lookup
/// service or validator, a missing source, a malformed source document, a
/// missing blueprint, or an unwritable destination. Validator and publish
/// rejections are returned as [`RunOutcome`] variants instead.
pub fn run(
    services: Collaborators<'_>,
    options: &RunOptions,
    identities: Box<dyn IdentitySource + '_>,
    reporter: &mut Reporter,
) -> Result<RunSummary, ConvertError> {
    let started = Instant::now();
    reporter.info("Generating CEDAR template...");
    reporter.info(format!("Source template: {}", options.source));
    reporter.info(format!("Destination template: {}", options.destination.display()));

    let mut converter = Converter::new(services.blueprints, services.lookup, identities)?;
    info!(ontologies = converter.catalog().len(), "ontology catalog loaded");

    if matches!(options.source, TemplateReference::Remote { .. }) {
        reporter.info("Downloading source template from GitHub...");
    }
    let bytes = services.loader.load(&options.source)?;
    let document = SourceDocument::from_slice(&bytes)
        .map_err(|source| ConvertError::Format { what: "source template", source })?;

    let template = converter.assemble(&document)?;
    let stats = converter.stats();
    let serialized = to_json_ld_string(&template)
        .map_err(|source| ConvertError::Format { what: "destination template", source })?;
    write_atomic(&options.destination, &serialized)?;
    reporter.info("Completed generating the new template.");

    reporter.info("Running the template through the CEDAR validator...");
    let verdict = services.repository.validate(&serialized)?;
    let outcome = if verdict.validates {
        reporter.info("New template validated successfully.");
        if options.publish {
            publish_all(services.repository, &template, reporter)?
        } else {
            RunOutcome::Validated
        }
    } else {
        report_rejection(&verdict.errors, &verdict.warnings, reporter);
        RunOutcome::ValidationFailed {
            errors: verdict.errors,
            warnings: verdict.warnings,
        }
    };

    let summary = RunSummary {
        outcome,
        elapsed: started.elapsed(),
        stats,
    };
    let code = summary.outcome.status_code();
    info!(status = code.as_str(), elapsed_ms = summary.elapsed.as_millis(), "run finished");
    reporter.info(summary.closing_message());
    Ok(summary)
}

fn publish_all(
    repository: &dyn TemplateRepository,
    template: &Container,
    reporter: &mut Reporter,
) -> Result<RunOutcome, ConvertError> {
    reporter.info("Uploading new template to CEDAR...");
    let document = to_publish_json(template)
        .map_err(|source| ConvertError::Format { what: "publish projection", source })?;
    let answer = repository.publish(&document, ResourceKind::Template)?;
    if !answer.is_created() {
        reporter.push(rejection_entry("New template failed CEDAR upload", &answer));
        return Ok(RunOutcome::PublishFailed {
            status: answer.status,
            payload: answer.payload,
        });
    }
    reporter.info("New template successfully uploaded to CEDAR.");

    reporter.info("Uploading new template elements to CEDAR...");
    let mut elements = Vec::new();
    for (name, element) in template.elements() {
        let document = to_publish_json(element)
            .map_err(|source| ConvertError::Format { what: "publish projection", source })?;
        let answer = repository.publish(&document, ResourceKind::Element)?;
        if answer.is_created() {
            reporter.info(format!("Element '{name}' successfully uploaded to CEDAR."));
        } else {
            warn!(element = name, status = answer.status, "element rejected");
            reporter.push(rejection_entry(
                &format!("Element '{name}' failed CEDAR upload"),
                &answer,
            ));
        }
        elements.push(ElementPublish {
            name: name.to_owned(),
            outcome: answer,
        });
    }
    Ok(RunOutcome::Published { elements })
}

/// Pretty-printed JSON of `value`, one detail line per output line.
fn json_lines<T: Serialize + ?Sized>(value: &T) -> Vec<String> {
    match serde_json::to_string_pretty(value) {
        Ok(text) => text.lines().map(str::to_owned).collect(),
        Err(e) => vec![format!("<unprintable payload: {e}>")],
    }
}

fn rejection_entry(message: &str, answer: &PublishOutcome) -> ReportEntry {
    ReportEntry::error_with_details(
        format!("{message} (response code {}).", answer.status),
        json_lines(&answer.payload),
    )
}

fn report_rejection(errors: &[Diagnostic], warnings: &[Diagnostic], reporter: &mut Reporter) {
    reporter.push(ReportEntry::error_with_details(
        format!(
            "New template failed validation with {} error(s) and {} warning(s).",
            errors.len(),
            warnings.len()
        ),
        json_lines(errors),
    ));
    if !warnings.is_empty() {
        reporter.push(ReportEntry::warn("Validator warnings:").with_details(json_lines(warnings)));
    }
}

/// Writes `contents` to `path` through a sibling temporary file.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] if the directory cannot be created or the
/// file cannot be written or renamed into place.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), ConvertError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(|e| ConvertError::io(&dir, e))?;
    let mut staged = tempfile::NamedTempFile::new_in(&dir).map_err(|e| ConvertError::io(&dir, e))?;
    staged
        .write_all(contents.as_bytes())
        .map_err(|e| ConvertError::io(staged.path(), e))?;
    staged
        .persist(path)
        .map_err(|e| ConvertError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answer(status: u16) -> PublishOutcome {
        PublishOutcome { status, payload: json!({}) }
    }

    #[test]
    fn status_codes() {
        assert_eq!(RunOutcome::Validated.status_code().as_str(), "VALIDATED");
        let all_created = RunOutcome::Published {
            elements: vec![ElementPublish { name: "a".to_owned(), outcome: answer(201) }],
        };
        assert_eq!(all_created.status_code(), StatusCode::Published);
        assert!(all_created.is_success());

        let one_rejected = RunOutcome::Published {
            elements: vec![
                ElementPublish { name: "a".to_owned(), outcome: answer(201) },
                ElementPublish { name: "b".to_owned(), outcome: answer(400) },
            ],
        };
        assert_eq!(one_rejected.status_code().as_str(), "PUBLISH_FAILED");
        assert!(!one_rejected.is_success());

        let rejected = RunOutcome::ValidationFailed { errors: vec![], warnings: vec![] };
        assert_eq!(rejected.status_code().as_str(), "VALIDATION_FAILED");
    }

    #[test]
    fn validation_rejection_prints_whole_diagnostics() {
        let errors: Vec<Diagnostic> = serde_json::from_value(json!([
            {"message": "bad", "location": "/x", "additionalInfo": {"keyword": "required"}}
        ]))
        .expect("diagnostics");
        let mut reporter = Reporter::quiet();
        report_rejection(&errors, &[], &mut reporter);

        let entries = &reporter.report().entries;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].details.iter().any(|line| line.contains(r#""keyword": "required""#)));
        assert!(entries[0].details.iter().any(|line| line.contains(r#""location": "/x""#)));
    }

    #[test]
    fn atomic_write_creates_parents_and_replaces() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out/nested/template.json");
        write_atomic(&path, "first").expect("writes");
        write_atomic(&path, "second").expect("overwrites");
        assert_eq!(std::fs::read_to_string(&path).expect("reads"), "second");
        let leftovers = std::fs::read_dir(path.parent().expect("parent"))
            .expect("lists")
            .count();
        assert_eq!(leftovers, 1);
    }
}
