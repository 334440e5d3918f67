//! BioAssay Ontology (BAO) source template model.
//!
//! A source document is a root [`SourceGroup`] of field assignments and
//! nested sub-groups. All types are read-only inputs for one conversion.
//!
//! Two revisions of the value-spec format exist in the wild: the earlier one
//! marks values with boolean `wholeBranch` / `exclude` flags, the later one
//! with a five-way `spec` tag. Both are normalised into [`ValueAction`] at
//! parse time and the revision is recorded in [`SourceValueSpec::model`].

use serde::{Deserialize, Deserializer};

/// A whole source template document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceDocument {
    /// Root group.
    pub root: SourceGroup,
}

impl SourceDocument {
    /// Parses a source document from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the bytes are not a source template.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// A nested grouping of field assignments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceGroup {
    /// Group name.
    pub name: String,
    /// Group description.
    #[serde(rename = "descr", default)]
    pub description: String,
    /// Identifying IRI of the group.
    #[serde(rename = "groupURI", default)]
    pub group_uri: String,
    /// Child field assignments, in source order.
    #[serde(default, deserialize_with = "one_or_many")]
    pub assignments: Vec<SourceField>,
    /// Child groups, in source order.
    #[serde(rename = "subGroups", default, deserialize_with = "one_or_many")]
    pub sub_groups: Vec<SourceGroup>,
}

/// A field assignment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceField {
    /// Field name.
    pub name: String,
    /// Field description.
    #[serde(rename = "descr", default)]
    pub description: String,
    /// Identifying IRI of the property.
    #[serde(rename = "propURI", default)]
    pub prop_uri: String,
    /// Whether a value is required.
    #[serde(default)]
    pub mandatory: bool,
    /// Suggestion-kind hint, used when the field has no values.
    #[serde(default)]
    pub suggestions: Option<SuggestionHint>,
    /// Controlled values, in source order.
    #[serde(default, deserialize_with = "one_or_many")]
    pub values: Vec<SourceValueSpec>,
}

/// Suggestion-kind hint of a source field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionHint {
    /// Full ontology-backed suggestions.
    Full,
    /// No suggestions.
    Disabled,
    /// Suggestions drawn from another field.
    Field,
    /// Free IRI.
    Url,
    /// Identifier.
    Id,
    /// Free text.
    String,
    /// Decimal number.
    Number,
    /// Whole number.
    Integer,
    /// Calendar date.
    Date,
    /// Any hint this converter does not know about.
    #[serde(other)]
    Other,
}

/// Canonical action tag of a value spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueAction {
    /// Accept exactly this term.
    Item,
    /// Remove this term from an accepted branch.
    Exclude,
    /// Accept this term and everything under it.
    #[serde(rename = "wholebranch")]
    WholeBranch,
    /// Remove this term and everything under it.
    #[serde(rename = "excludebranch")]
    ExcludeBranch,
    /// Accept everything under this term (the term itself is a grouping node).
    Container,
}

impl ValueAction {
    /// Whether a value with this tag can produce a destination constraint.
    ///
    /// Only these tags ever reach the ontology lookup service.
    #[must_use]
    pub fn is_usable(self) -> bool {
        matches!(
            self,
            ValueAction::Item | ValueAction::Exclude | ValueAction::WholeBranch | ValueAction::Container
        )
    }

    /// Whether a resolved term yields a class constraint.
    #[must_use]
    pub fn yields_class(self) -> bool {
        matches!(self, ValueAction::Item | ValueAction::WholeBranch)
    }

    /// Whether a resolved term yields a branch constraint.
    #[must_use]
    pub fn yields_branch(self) -> bool {
        matches!(self, ValueAction::WholeBranch | ValueAction::Container)
    }

    /// Whether a resolved term yields a delete action.
    #[must_use]
    pub fn yields_action(self) -> bool {
        self == ValueAction::Exclude
    }

    /// Returns the tag as written in source documents.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ValueAction::Item => "item",
            ValueAction::Exclude => "exclude",
            ValueAction::WholeBranch => "wholebranch",
            ValueAction::ExcludeBranch => "excludebranch",
            ValueAction::Container => "container",
        }
    }
}

/// Which revision of the value-spec format a value was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecModel {
    /// Boolean `wholeBranch` / `exclude` flags.
    LegacyFlags,
    /// Five-way `spec` tag.
    ActionTag,
}

/// One controlled value attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawValueSpec")]
pub struct SourceValueSpec {
    /// Term IRI.
    pub uri: String,
    /// Canonical action tag.
    pub action: ValueAction,
    /// Literal label, used when the term cannot be resolved.
    pub name: Option<String>,
    /// Format revision the value was written in.
    pub model: SpecModel,
}

impl SourceValueSpec {
    /// A value spec written with the five-way tag.
    #[must_use]
    pub fn tagged(uri: impl Into<String>, action: ValueAction, name: Option<&str>) -> Self {
        Self {
            uri: uri.into(),
            action,
            name: name.map(str::to_owned),
            model: SpecModel::ActionTag,
        }
    }
}

/// A boolean flag that older documents sometimes wrote as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Text(s) => s.eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawValueSpec {
    uri: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    spec: Option<ValueAction>,
    #[serde(rename = "wholeBranch", default)]
    whole_branch: Option<Flag>,
    #[serde(default)]
    exclude: Option<Flag>,
}

impl From<RawValueSpec> for SourceValueSpec {
    fn from(raw: RawValueSpec) -> Self {
        let name = raw.name.filter(|n| !n.trim().is_empty());
        if let Some(action) = raw.spec {
            return Self {
                uri: raw.uri,
                action,
                name,
                model: SpecModel::ActionTag,
            };
        }
        let whole_branch = raw.whole_branch.as_ref().is_some_and(Flag::is_set);
        let exclude = raw.exclude.as_ref().is_some_and(Flag::is_set);
        let action = match (exclude, whole_branch) {
            (true, true) => ValueAction::ExcludeBranch,
            (true, false) => ValueAction::Exclude,
            (false, true) => ValueAction::WholeBranch,
            (false, false) => ValueAction::Item,
        };
        Self {
            uri: raw.uri,
            action,
            name,
            model: SpecModel::LegacyFlags,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Accepts a single object, an array of objects, or `null`.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value(v: serde_json::Value) -> SourceValueSpec {
        serde_json::from_value(v).expect("value spec parses")
    }

    #[test]
    fn tagged_values_keep_their_tag() {
        let spec = value(json!({"uri": "http://x/1", "name": "one", "spec": "wholebranch"}));
        assert_eq!(spec.action, ValueAction::WholeBranch);
        assert_eq!(spec.model, SpecModel::ActionTag);
        assert_eq!(spec.name.as_deref(), Some("one"));
    }

    #[test]
    fn legacy_flags_are_normalised() {
        assert_eq!(value(json!({"uri": "u"})).action, ValueAction::Item);
        assert_eq!(
            value(json!({"uri": "u", "wholeBranch": "true"})).action,
            ValueAction::WholeBranch
        );
        assert_eq!(
            value(json!({"uri": "u", "exclude": true})).action,
            ValueAction::Exclude
        );
        assert_eq!(
            value(json!({"uri": "u", "exclude": true, "wholeBranch": true})).action,
            ValueAction::ExcludeBranch
        );
        assert_eq!(value(json!({"uri": "u", "exclude": false})).model, SpecModel::LegacyFlags);
    }

    #[test]
    fn usable_tags() {
        assert!(ValueAction::Item.is_usable());
        assert!(ValueAction::Exclude.is_usable());
        assert!(ValueAction::WholeBranch.is_usable());
        assert!(ValueAction::Container.is_usable());
        assert!(!ValueAction::ExcludeBranch.is_usable());
    }

    #[test]
    fn single_assignment_is_normalised_to_a_list() {
        let doc: SourceDocument = serde_json::from_value(json!({
            "root": {
                "name": "root",
                "groupURI": "http://x/root",
                "assignments": {"name": "only", "propURI": "http://x/p"},
                "subGroups": null
            }
        }))
        .expect("document parses");
        assert_eq!(doc.root.assignments.len(), 1);
        assert!(doc.root.sub_groups.is_empty());
        assert!(doc.root.assignments[0].values.is_empty());
        assert!(!doc.root.assignments[0].mandatory);
    }

    #[test]
    fn unknown_suggestion_hint_is_tolerated() {
        let field: SourceField = serde_json::from_value(json!({
            "name": "f",
            "suggestions": "somethingnew"
        }))
        .expect("field parses");
        assert_eq!(field.suggestions, Some(SuggestionHint::Other));
    }
}
