//! BioAssay Ontology template to CEDAR template conversion.
//!
//! The `bao-converter` crate turns a BAO source template (a tree of groups
//! and field assignments) into one CEDAR template whose sub-groups become
//! template elements and whose controlled values are constrained to
//! ontology classes and branches resolved through a terminology service.
//!
//! # Pipeline
//!
//! - [`source`] parses the source document.
//! - [`resolver`] turns one value spec into class, branch or action
//!   constraints, memoised by [`ontology::cache::TermCache`].
//! - [`classifier`] decides each field's kind and schema shape.
//! - [`assembler`] splices fields and elements into the template.
//! - [`driver`] runs the whole load → validate → publish sequence.
//!
//! Every remote service sits behind a trait ([`ontology::OntologyLookup`],
//! [`loader::TemplateLoader`], [`repository::TemplateRepository`]) with a
//! blocking HTTP implementation alongside.
//!
//! # Example
//!
//! ```
//! use bao_converter::engine::{Converter, SequentialIdentities};
//! use bao_converter::ontology::{OntologyCatalog, OntologyLookup, TermRecord};
//! use bao_converter::{ConvertError, SourceDocument};
//! use cedar_template::BlueprintSet;
//!
//! struct Offline;
//!
//! impl OntologyLookup for Offline {
//!     fn catalog(&self) -> Result<OntologyCatalog, ConvertError> {
//!         Ok(OntologyCatalog::new())
//!     }
//!     fn find_term(&self, _: &str) -> Result<Option<TermRecord>, ConvertError> {
//!         Ok(None)
//!     }
//! }
//!
//! let doc = SourceDocument::from_slice(
//!     br#"{"root": {"name": "Assay", "assignments": [{"name": "title", "suggestions": "string"}]}}"#,
//! )
//! .expect("valid source");
//! let blueprints = BlueprintSet::embedded();
//! let mut converter = Converter::new(
//!     &blueprints,
//!     &Offline,
//!     Box::new(SequentialIdentities::new("2024-01-01T00:00:00+00:00")),
//! )
//! .expect("catalog");
//! let template = converter.assemble(&doc).expect("assembles");
//! assert_eq!(template.ui.order, ["title"]);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod assembler;
pub mod classifier;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod loader;
pub mod ontology;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod source;

pub use config::Config;
pub use driver::{run, Collaborators, RunOptions, RunOutcome, RunSummary, StatusCode};
pub use engine::{ConversionStats, Converter, IdentitySource, RandomIdentities, SequentialIdentities};
pub use error::ConvertError;
pub use loader::{GitHubLoader, TemplateLoader, TemplateReference};
pub use report::Reporter;
pub use repository::{CedarClient, TemplateRepository};
pub use source::SourceDocument;
