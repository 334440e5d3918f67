//! Ontology terminology collaborator.
//!
//! The converter needs two things from a terminology service: the catalog of
//! known ontologies (acronym → display name) and an exact-match search for a
//! term IRI. [`OntologyLookup`] is the seam; [`bioportal::BioPortalClient`]
//! is the production implementation and [`cache::TermCache`] memoises
//! lookups for the lifetime of one run.

pub mod bioportal;
pub mod cache;

use std::collections::BTreeMap;

use crate::error::ConvertError;

/// Raw best match returned by a term search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    /// Preferred label of the term.
    pub pref_label: String,
    /// Link to the owning ontology, e.g. `https://data.bioontology.org/ontologies/BAO`.
    pub ontology_link: String,
}

impl TermRecord {
    /// The owning ontology acronym: the last `/`-separated segment of the
    /// ontology link.
    #[must_use]
    pub fn acronym(&self) -> &str {
        acronym_from_id(&self.ontology_link)
    }
}

/// Returns the last `/`-separated segment of an ontology IRI.
#[must_use]
pub fn acronym_from_id(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

/// A term resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyTerm {
    /// Term IRI.
    pub uri: String,
    /// Preferred label.
    pub pref_label: String,
    /// Owning ontology acronym.
    pub acronym: String,
    /// Owning ontology display name.
    pub ontology_name: String,
}

impl OntologyTerm {
    /// `"{ontology name} ({acronym})"`.
    #[must_use]
    pub fn source(&self) -> String {
        format!("{} ({})", self.ontology_name, self.acronym)
    }
}

/// Known ontologies keyed by acronym.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OntologyCatalog {
    names: BTreeMap<String, String>,
}

impl OntologyCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an ontology.
    pub fn insert(&mut self, acronym: impl Into<String>, name: impl Into<String>) {
        self.names.insert(acronym.into(), name.into());
    }

    /// Display name of `acronym`, if known.
    #[must_use]
    pub fn name_of(&self, acronym: &str) -> Option<&str> {
        self.names.get(acronym).map(String::as_str)
    }

    /// Number of known ontologies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if no ontology is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Combines a search record with the catalog into a resolved term.
    ///
    /// An acronym missing from the catalog falls back to the acronym itself
    /// as display name.
    #[must_use]
    pub fn resolve(&self, uri: &str, record: &TermRecord) -> OntologyTerm {
        let acronym = record.acronym().to_owned();
        let ontology_name = self.name_of(&acronym).unwrap_or(&acronym).to_owned();
        OntologyTerm {
            uri: uri.to_owned(),
            pref_label: record.pref_label.clone(),
            acronym,
            ontology_name,
        }
    }
}

impl<A: Into<String>, N: Into<String>> FromIterator<(A, N)> for OntologyCatalog {
    fn from_iter<I: IntoIterator<Item = (A, N)>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for (acronym, name) in iter {
            catalog.insert(acronym, name);
        }
        catalog
    }
}

/// Terminology service used to enrich controlled values.
pub trait OntologyLookup {
    /// Fetches the catalog of known ontologies.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UpstreamUnavailable`] or
    /// [`ConvertError::Transport`] when the service cannot be queried.
    fn catalog(&self) -> Result<OntologyCatalog, ConvertError>;

    /// Exact-match search for a term IRI. `Ok(None)` means no match.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::UpstreamUnavailable`] or
    /// [`ConvertError::Transport`] when the service cannot be queried.
    fn find_term(&self, term_id: &str) -> Result<Option<TermRecord>, ConvertError>;
}
