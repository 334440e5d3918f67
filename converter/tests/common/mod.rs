//! Call-recording stand-ins for the remote services.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use bao_converter::loader::{TemplateLoader, TemplateReference};
use bao_converter::ontology::{OntologyCatalog, OntologyLookup, TermRecord};
use bao_converter::repository::{
    PublishOutcome, ResourceKind, TemplateRepository, ValidationOutcome,
};
use bao_converter::{ConvertError, SourceDocument};
use serde_json::{json, Value};

pub const ASSAY: &[u8] = include_bytes!("../fixtures/assay.json");

pub const BIOCHEMICAL: &str = "http://www.bioassayontology.org/bao#BAO_0000217";
pub const CELL_BASED: &str = "http://www.bioassayontology.org/bao#BAO_0000219";
pub const HOMEBREW: &str = "http://www.bioassayontology.org/bao#BAO_9999999";
pub const GONE: &str = "http://www.bioassayontology.org/bao#BAO_8888888";
pub const HUMAN: &str = "http://purl.obolibrary.org/obo/NCBITaxon_9606";

pub const TIMESTAMP: &str = "2024-01-01T00:00:00+00:00";

pub fn assay() -> SourceDocument {
    SourceDocument::from_slice(ASSAY).expect("fixture parses")
}

/// Terminology service knowing three terms; records every search.
pub struct CountingLookup {
    terms: HashMap<String, TermRecord>,
    pub searches: RefCell<Vec<String>>,
    pub unavailable: bool,
}

impl CountingLookup {
    pub fn new() -> Self {
        let record = |label: &str, acronym: &str| TermRecord {
            pref_label: label.to_owned(),
            ontology_link: format!("https://data.bioontology.org/ontologies/{acronym}"),
        };
        let terms = HashMap::from([
            (BIOCHEMICAL.to_owned(), record("biochemical format", "BAO")),
            (CELL_BASED.to_owned(), record("cell-based format", "BAO")),
            (HUMAN.to_owned(), record("Homo sapiens", "NCBITAXON")),
        ]);
        Self {
            terms,
            searches: RefCell::new(Vec::new()),
            unavailable: false,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new()
        }
    }

    pub fn search_count(&self, uri: &str) -> usize {
        self.searches.borrow().iter().filter(|s| *s == uri).count()
    }
}

impl OntologyLookup for CountingLookup {
    fn catalog(&self) -> Result<OntologyCatalog, ConvertError> {
        if self.unavailable {
            return Err(ConvertError::UpstreamUnavailable {
                endpoint: "https://data.bioontology.org/ontologies".to_owned(),
                status: 503,
            });
        }
        Ok([
            ("BAO", "BioAssay Ontology"),
            ("NCBITAXON", "National Center for Biotechnology Information Organismal Classification"),
        ]
        .into_iter()
        .collect())
    }

    fn find_term(&self, term_id: &str) -> Result<Option<TermRecord>, ConvertError> {
        self.searches.borrow_mut().push(term_id.to_owned());
        Ok(self.terms.get(term_id).cloned())
    }
}

/// Loader serving a fixed document for every reference.
pub struct FixedLoader(pub &'static [u8]);

impl TemplateLoader for FixedLoader {
    fn load(&self, _reference: &TemplateReference) -> Result<Vec<u8>, ConvertError> {
        Ok(self.0.to_vec())
    }
}

/// Repository with a scripted verdict and scripted publish statuses.
pub struct ScriptedRepository {
    pub validates: bool,
    pub template_status: u16,
    /// Status per element name; unlisted elements get 201.
    pub element_status: HashMap<String, u16>,
    pub validated: RefCell<Vec<Value>>,
    pub published: RefCell<Vec<(ResourceKind, Value)>>,
}

impl ScriptedRepository {
    pub fn accepting() -> Self {
        Self {
            validates: true,
            template_status: 201,
            element_status: HashMap::new(),
            validated: RefCell::new(Vec::new()),
            published: RefCell::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            validates: false,
            ..Self::accepting()
        }
    }

    pub fn published_names(&self) -> Vec<(ResourceKind, String)> {
        self.published
            .borrow()
            .iter()
            .map(|(kind, doc)| (*kind, doc["schema:name"].as_str().unwrap_or_default().to_owned()))
            .collect()
    }
}

impl TemplateRepository for ScriptedRepository {
    fn validate(&self, document: &str) -> Result<ValidationOutcome, ConvertError> {
        self.validated
            .borrow_mut()
            .push(serde_json::from_str(document).expect("validated document is JSON"));
        if self.validates {
            return Ok(serde_json::from_value(json!({"validates": "true", "errors": [], "warnings": []}))
                .expect("verdict"));
        }
        Ok(serde_json::from_value(json!({
            "validates": "false",
            "errors": [{
                "message": "instance type does not match",
                "location": "/properties/assay format",
                "additionalInfo": {"keyword": "required"}
            }],
            "warnings": [{"message": "deprecated keyword", "location": "/_ui"}]
        }))
        .expect("verdict"))
    }

    fn publish(&self, document: &str, kind: ResourceKind) -> Result<PublishOutcome, ConvertError> {
        let doc: Value = serde_json::from_str(document).expect("published document is JSON");
        let status = match kind {
            ResourceKind::Template => self.template_status,
            ResourceKind::Element => {
                let name = doc["schema:name"].as_str().unwrap_or_default();
                self.element_status.get(name).copied().unwrap_or(201)
            }
        };
        self.published.borrow_mut().push((kind, doc));
        let payload = if status == 201 {
            json!({"@id": "https://repo.metadatacenter.org/created"})
        } else {
            json!({"errorKey": "invalidInput", "message": "rejected"})
        };
        Ok(PublishOutcome { status, payload })
    }
}
