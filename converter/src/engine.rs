//! Conversion context shared by the field classifier and template assembler.
//!
//! A [`Converter`] owns everything that lives for exactly one conversion:
//! the ontology catalog, the term cache, and the identity source. It borrows
//! the blueprints and the lookup service.

use cedar_template::{timestamp_now, BlueprintSet, IdentitySeed};
use uuid::Uuid;

use crate::error::ConvertError;
use crate::ontology::cache::{CacheStats, TermCache};
use crate::ontology::{OntologyCatalog, OntologyLookup};

/// Supplies entity identities and timestamps.
pub trait IdentitySource {
    /// A seed never returned before in this run.
    fn next_seed(&mut self) -> IdentitySeed;

    /// Timestamp for `pav:lastUpdatedOn`.
    fn timestamp(&mut self) -> String;
}

/// Random v4 identities and wall-clock timestamps.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentities;

impl IdentitySource for RandomIdentities {
    fn next_seed(&mut self) -> IdentitySeed {
        IdentitySeed::generate()
    }

    fn timestamp(&mut self) -> String {
        timestamp_now()
    }
}

/// Counter-based identities and a fixed timestamp, for reproducible output.
#[derive(Debug, Clone)]
pub struct SequentialIdentities {
    next: u128,
    timestamp: String,
}

impl SequentialIdentities {
    /// Starts counting at 1, stamping every entity with `timestamp`.
    #[must_use]
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            next: 1,
            timestamp: timestamp.into(),
        }
    }
}

impl IdentitySource for SequentialIdentities {
    fn next_seed(&mut self) -> IdentitySeed {
        let guid = Uuid::from_u128(self.next);
        self.next += 1;
        IdentitySeed {
            guid,
            created_on: self.timestamp.clone(),
        }
    }

    fn timestamp(&mut self) -> String {
        self.timestamp.clone()
    }
}

/// Counters reported after a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionStats {
    /// Fields built.
    pub fields: usize,
    /// Elements built.
    pub elements: usize,
    /// Controlled fields demoted to free text.
    pub demoted: usize,
    /// Term cache counters.
    pub terms: CacheStats,
}

/// State of one conversion run.
pub struct Converter<'a> {
    pub(crate) blueprints: &'a BlueprintSet,
    pub(crate) lookup: &'a dyn OntologyLookup,
    pub(crate) catalog: OntologyCatalog,
    pub(crate) terms: TermCache,
    pub(crate) identities: Box<dyn IdentitySource + 'a>,
    pub(crate) stats: ConversionStats,
}

impl<'a> Converter<'a> {
    /// Creates a converter, fetching the ontology catalog once.
    ///
    /// # Errors
    ///
    /// Returns the lookup-service error if the catalog cannot be fetched.
    pub fn new(
        blueprints: &'a BlueprintSet,
        lookup: &'a dyn OntologyLookup,
        identities: Box<dyn IdentitySource + 'a>,
    ) -> Result<Self, ConvertError> {
        let catalog = lookup.catalog()?;
        Ok(Self::with_catalog(blueprints, lookup, catalog, identities))
    }

    /// Creates a converter with an already fetched catalog.
    #[must_use]
    pub fn with_catalog(
        blueprints: &'a BlueprintSet,
        lookup: &'a dyn OntologyLookup,
        catalog: OntologyCatalog,
        identities: Box<dyn IdentitySource + 'a>,
    ) -> Self {
        Self {
            blueprints,
            lookup,
            catalog,
            terms: TermCache::new(),
            identities,
            stats: ConversionStats::default(),
        }
    }

    /// The ontology catalog in use.
    #[must_use]
    pub fn catalog(&self) -> &OntologyCatalog {
        &self.catalog
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> ConversionStats {
        ConversionStats {
            terms: self.terms.stats(),
            ..self.stats
        }
    }
}
