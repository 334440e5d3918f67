//! Value resolution: one source value spec to destination constraints.
//!
//! A spec whose tag is not usable resolves to nothing without touching the
//! lookup service. Otherwise the term is resolved through the
//! [`TermCache`] and turned into constraint fragments:
//!
//! | tag | term resolved | term unresolved |
//! |---|---|---|
//! | `item` | class | class labelled with the literal name, source "Unknown Ontology" |
//! | `wholebranch` | branch + class | nothing |
//! | `container` | branch | nothing |
//! | `exclude` | delete action | nothing |
//! | `excludebranch` | not looked up | not looked up |

use cedar_template::model::{iris, ClassType, ConstraintAction};
use cedar_template::{ActionConstraint, BranchConstraint, ClassConstraint};
use tracing::debug;

use crate::error::ConvertError;
use crate::ontology::cache::TermCache;
use crate::ontology::{OntologyCatalog, OntologyLookup, OntologyTerm};
use crate::source::{SourceValueSpec, ValueAction};

/// Branch depth meaning "descend without limit".
pub const UNLIMITED_DEPTH: u32 = 0;

/// One destination constraint produced from a value spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueFragment {
    /// Exactly this term.
    Class(ClassConstraint),
    /// Everything under this term.
    Branch(BranchConstraint),
    /// Remove this term.
    Action(ActionConstraint),
}

/// Constraint lists collected from every value spec of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Branch constraints in source order.
    pub branches: Vec<BranchConstraint>,
    /// Class constraints in source order.
    pub classes: Vec<ClassConstraint>,
    /// Action constraints in source order.
    pub actions: Vec<ActionConstraint>,
}

impl Partition {
    /// Routes a fragment to its list.
    pub fn push(&mut self, fragment: ValueFragment) {
        match fragment {
            ValueFragment::Class(class) => self.classes.push(class),
            ValueFragment::Branch(branch) => self.branches.push(branch),
            ValueFragment::Action(action) => self.actions.push(action),
        }
    }

    /// True when no branch and no class survived resolution.
    #[must_use]
    pub fn is_empty_selection(&self) -> bool {
        self.branches.is_empty() && self.classes.is_empty()
    }
}

impl Extend<ValueFragment> for Partition {
    fn extend<I: IntoIterator<Item = ValueFragment>>(&mut self, iter: I) {
        for fragment in iter {
            self.push(fragment);
        }
    }
}

/// Resolves one value spec into zero, one or two fragments.
///
/// Under `wholebranch` a resolved term yields a branch followed by a class;
/// callers must keep every returned fragment.
///
/// # Errors
///
/// Propagates lookup-service failures; an unknown term is not an error.
pub fn resolve_value(
    spec: &SourceValueSpec,
    catalog: &OntologyCatalog,
    terms: &mut TermCache,
    lookup: &dyn OntologyLookup,
) -> Result<Vec<ValueFragment>, ConvertError> {
    if !spec.action.is_usable() {
        debug!(uri = %spec.uri, action = spec.action.as_str(), "value not usable");
        return Ok(Vec::new());
    }

    let fragments = match terms.resolve(&spec.uri, catalog, lookup)? {
        Some(term) => resolved_fragments(spec.action, term),
        None if spec.action == ValueAction::Item => vec![ValueFragment::Class(unknown_class(spec))],
        None => {
            debug!(uri = %spec.uri, action = spec.action.as_str(), "unresolved value dropped");
            Vec::new()
        }
    };
    Ok(fragments)
}

fn resolved_fragments(action: ValueAction, term: &OntologyTerm) -> Vec<ValueFragment> {
    let source = term.source();
    let mut fragments = Vec::with_capacity(2);
    if action.yields_action() {
        fragments.push(ValueFragment::Action(ActionConstraint {
            term_uri: term.uri.clone(),
            source: source.clone(),
            action: ConstraintAction::Delete,
        }));
    }
    if action.yields_branch() {
        fragments.push(ValueFragment::Branch(BranchConstraint {
            uri: term.uri.clone(),
            source: source.clone(),
            acronym: term.acronym.clone(),
            name: term.pref_label.clone(),
            max_depth: UNLIMITED_DEPTH,
        }));
    }
    if action.yields_class() {
        fragments.push(ValueFragment::Class(ClassConstraint {
            uri: term.uri.clone(),
            source,
            pref_label: term.pref_label.clone(),
            label: term.pref_label.clone(),
            class_type: ClassType::OntologyClass,
        }));
    }
    fragments
}

fn unknown_class(spec: &SourceValueSpec) -> ClassConstraint {
    let label = spec.name.clone().unwrap_or_else(|| spec.uri.clone());
    debug!(uri = %spec.uri, label = %label, "unresolved item kept with literal label");
    ClassConstraint {
        uri: spec.uri.clone(),
        source: iris::UNKNOWN_ONTOLOGY.to_owned(),
        pref_label: label.clone(),
        label,
        class_type: ClassType::OntologyClass,
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::ontology::TermRecord;

    const KNOWN: &str = "http://www.bioassayontology.org/bao#BAO_0000015";

    struct Stub {
        calls: Cell<usize>,
    }

    impl OntologyLookup for Stub {
        fn catalog(&self) -> Result<OntologyCatalog, ConvertError> {
            Ok([("BAO", "BioAssay Ontology")].into_iter().collect())
        }

        fn find_term(&self, term_id: &str) -> Result<Option<TermRecord>, ConvertError> {
            self.calls.set(self.calls.get() + 1);
            Ok((term_id == KNOWN).then(|| TermRecord {
                pref_label: "bioassay".to_owned(),
                ontology_link: "https://data.bioontology.org/ontologies/BAO".to_owned(),
            }))
        }
    }

    fn resolve(spec: &SourceValueSpec, stub: &Stub, terms: &mut TermCache) -> Vec<ValueFragment> {
        let catalog = stub.catalog().expect("catalog");
        resolve_value(spec, &catalog, terms, stub).expect("resolves")
    }

    #[test]
    fn excludebranch_never_reaches_the_service() {
        let stub = Stub { calls: Cell::new(0) };
        let spec = SourceValueSpec::tagged(KNOWN, ValueAction::ExcludeBranch, None);
        assert!(resolve(&spec, &stub, &mut TermCache::new()).is_empty());
        assert_eq!(stub.calls.get(), 0);
    }

    #[test]
    fn wholebranch_yields_branch_and_class() {
        let stub = Stub { calls: Cell::new(0) };
        let spec = SourceValueSpec::tagged(KNOWN, ValueAction::WholeBranch, None);
        let fragments = resolve(&spec, &stub, &mut TermCache::new());
        assert_eq!(fragments.len(), 2);
        match (&fragments[0], &fragments[1]) {
            (ValueFragment::Branch(branch), ValueFragment::Class(class)) => {
                assert_eq!(branch.uri, KNOWN);
                assert_eq!(class.uri, KNOWN);
                assert_eq!(branch.acronym, "BAO");
                assert_eq!(branch.max_depth, 0);
                assert_eq!(class.source, "BioAssay Ontology (BAO)");
                assert_eq!(class.label, "bioassay");
            }
            other => panic!("unexpected fragments {other:?}"),
        }
    }

    #[test]
    fn container_yields_branch_only() {
        let stub = Stub { calls: Cell::new(0) };
        let spec = SourceValueSpec::tagged(KNOWN, ValueAction::Container, None);
        let fragments = resolve(&spec, &stub, &mut TermCache::new());
        assert!(matches!(fragments.as_slice(), [ValueFragment::Branch(_)]));
    }

    #[test]
    fn exclude_yields_delete_action() {
        let stub = Stub { calls: Cell::new(0) };
        let spec = SourceValueSpec::tagged(KNOWN, ValueAction::Exclude, None);
        let fragments = resolve(&spec, &stub, &mut TermCache::new());
        match fragments.as_slice() {
            [ValueFragment::Action(action)] => {
                assert_eq!(action.action, ConstraintAction::Delete);
                assert_eq!(action.term_uri, KNOWN);
                assert_eq!(action.source, "BioAssay Ontology (BAO)");
            }
            other => panic!("unexpected fragments {other:?}"),
        }
    }

    #[test]
    fn unresolved_item_falls_back_to_literal_name() {
        let stub = Stub { calls: Cell::new(0) };
        let spec = SourceValueSpec::tagged("http://x/unknown", ValueAction::Item, Some("widget"));
        match resolve(&spec, &stub, &mut TermCache::new()).as_slice() {
            [ValueFragment::Class(class)] => {
                assert_eq!(class.label, "widget");
                assert_eq!(class.pref_label, "widget");
                assert_eq!(class.source, iris::UNKNOWN_ONTOLOGY);
            }
            other => panic!("unexpected fragments {other:?}"),
        }
    }

    #[test]
    fn other_unresolved_tags_are_dropped() {
        let stub = Stub { calls: Cell::new(0) };
        let mut terms = TermCache::new();
        for action in [ValueAction::WholeBranch, ValueAction::Container, ValueAction::Exclude] {
            let spec = SourceValueSpec::tagged("http://x/unknown", action, Some("n"));
            assert!(resolve(&spec, &stub, &mut terms).is_empty());
        }
        assert_eq!(stub.calls.get(), 1);
    }

    #[test]
    fn partition_routes_fragments() {
        let stub = Stub { calls: Cell::new(0) };
        let mut terms = TermCache::new();
        let mut partition = Partition::default();
        for action in [ValueAction::WholeBranch, ValueAction::Exclude, ValueAction::Item] {
            let spec = SourceValueSpec::tagged(KNOWN, action, None);
            partition.extend(resolve(&spec, &stub, &mut terms));
        }
        assert_eq!(partition.branches.len(), 1);
        assert_eq!(partition.classes.len(), 2);
        assert_eq!(partition.actions.len(), 1);
        assert!(!partition.is_empty_selection());
    }
}
