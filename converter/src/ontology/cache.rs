//! Per-run memo of ontology term lookups.
//!
//! Every distinct term IRI is looked up at most once per run. A lookup that
//! finds nothing is cached as a not-found sentinel so it is not repeated.
//! Transport and upstream failures are not cached; they abort the run.

use std::collections::HashMap;

use tracing::debug;

use super::{OntologyCatalog, OntologyLookup, OntologyTerm};
use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CachedTerm {
    Found(OntologyTerm),
    NotFound,
}

/// Lookup counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls made to the lookup service.
    pub lookups: usize,
    /// Requests answered from the cache.
    pub hits: usize,
    /// Lookups that found no term.
    pub not_found: usize,
}

/// Term cache keyed by term IRI.
#[derive(Debug, Default)]
pub struct TermCache {
    terms: HashMap<String, CachedTerm>,
    stats: CacheStats,
}

impl TermCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the resolved term for `uri`, querying `lookup` on first use.
    ///
    /// `Ok(None)` means the term is unknown to the service.
    ///
    /// # Errors
    ///
    /// Propagates the lookup service error on a cache miss.
    pub fn resolve(
        &mut self,
        uri: &str,
        catalog: &OntologyCatalog,
        lookup: &dyn OntologyLookup,
    ) -> Result<Option<&OntologyTerm>, ConvertError> {
        if self.terms.contains_key(uri) {
            self.stats.hits += 1;
            debug!(uri, "term cache hit");
        } else {
            self.stats.lookups += 1;
            let entry = match lookup.find_term(uri)? {
                Some(record) => CachedTerm::Found(catalog.resolve(uri, &record)),
                None => {
                    self.stats.not_found += 1;
                    debug!(uri, "term not found");
                    CachedTerm::NotFound
                }
            };
            self.terms.insert(uri.to_owned(), entry);
        }

        Ok(match self.terms.get(uri) {
            Some(CachedTerm::Found(term)) => Some(term),
            Some(CachedTerm::NotFound) | None => None,
        })
    }

    /// Number of distinct IRIs cached (found or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns true if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Lookup counters so far.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
