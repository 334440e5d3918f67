//! Core CEDAR template model types.
//!
//! These types represent the destination metadata-template vocabulary as
//! typed Rust records. A [`Container`] is either a template or a template
//! element; both hold a property map of [`Member`]s whose render order is
//! carried by [`ContainerUi::order`]. A [`Field`] is a leaf property.
//!
//! Parts of a document that come verbatim from a blueprint and are never
//! inspected by the converter (JSON-LD `@context` prefixes, the schema of the
//! structural `@id`/`pav:*` properties) are kept as [`serde_json::Value`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard IRI and vocabulary constants used across the model.
pub mod iris {
    /// `@type` of a CEDAR template.
    pub const TEMPLATE_TYPE: &str = "https://schema.metadatacenter.org/core/Template";
    /// `@type` of a CEDAR template element.
    pub const ELEMENT_TYPE: &str = "https://schema.metadatacenter.org/core/TemplateElement";
    /// `@type` of a CEDAR template field.
    pub const FIELD_TYPE: &str = "https://schema.metadatacenter.org/core/TemplateField";
    /// JSON Schema draft used by every CEDAR artifact.
    pub const JSON_SCHEMA_DRAFT: &str = "http://json-schema.org/draft-04/schema#";
    /// Source marker used for class constraints whose term could not be resolved.
    pub const UNKNOWN_ONTOLOGY: &str = "Unknown Ontology";
}

/// How a field collects its value in the CEDAR editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Free text, also used for ontology-constrained (controlled) fields.
    Textfield,
    /// Numeric literal.
    Numeric,
    /// Date/time literal.
    Temporal,
    /// Hyperlink (IRI) value.
    Link,
}

/// Destination field kind as decided by the field classifier.
///
/// CEDAR has no single tag for this; [`Field::kind`] derives it from the
/// input type and the value-constraint block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Ontology-constrained value (branches and/or classes).
    Controlled,
    /// Free text literal.
    Text,
    /// Decimal number.
    Numeric,
    /// Number with zero decimal places.
    Integer,
    /// Calendar date with day granularity.
    Date,
    /// IRI reference.
    Uri,
}

impl FieldKind {
    /// Returns the lowercase tag used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Controlled => "controlled",
            FieldKind::Text => "text",
            FieldKind::Numeric => "numeric",
            FieldKind::Integer => "integer",
            FieldKind::Date => "date",
            FieldKind::Uri => "uri",
        }
    }
}

/// Temporal granularity shown by the editor for temporal fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalGranularity {
    /// Year, month and day.
    Day,
}

/// XSD temporal datatype of a temporal field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemporalType {
    /// `xsd:date`.
    #[serde(rename = "xsd:date")]
    Date,
}

/// XSD numeric datatype of a numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberType {
    /// `xsd:decimal`.
    #[serde(rename = "xsd:decimal")]
    Decimal,
}

/// `type` marker carried by every class constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassType {
    /// An ontology class.
    OntologyClass,
}

/// Action applied by an action constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintAction {
    /// Remove a term that a branch constraint would otherwise include.
    Delete,
}

/// "Exactly this term" value constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassConstraint {
    /// Term IRI.
    pub uri: String,
    /// `"{ontology name} ({acronym})"`, or [`iris::UNKNOWN_ONTOLOGY`].
    pub source: String,
    /// Preferred label of the term.
    pub pref_label: String,
    /// Display label (same as the preferred label).
    pub label: String,
    /// Always [`ClassType::OntologyClass`].
    #[serde(rename = "type")]
    pub class_type: ClassType,
}

/// "Everything under this term" value constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchConstraint {
    /// Term IRI of the branch root.
    pub uri: String,
    /// `"{ontology name} ({acronym})"`.
    pub source: String,
    /// Owning ontology acronym.
    pub acronym: String,
    /// Preferred label of the branch root.
    pub name: String,
    /// Descent limit; `0` means unlimited.
    pub max_depth: u32,
}

/// "Remove this previously included term" value constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionConstraint {
    /// Term IRI the action applies to.
    pub term_uri: String,
    /// `"{ontology name} ({acronym})"`.
    pub source: String,
    /// Always [`ConstraintAction::Delete`].
    pub action: ConstraintAction,
}

/// The `_valueConstraints` block of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueConstraints {
    /// Whether a value must be supplied.
    #[serde(default)]
    pub required_value: bool,
    /// Whole ontologies accepted as values (always empty when present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ontologies: Option<Vec<Value>>,
    /// Value sets accepted as values (always empty when present).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_sets: Option<Vec<Value>>,
    /// Individually accepted terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<ClassConstraint>>,
    /// Accepted ontology branches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branches: Option<Vec<BranchConstraint>>,
    /// Terms removed from the accepted set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionConstraint>>,
    /// Numeric datatype for numeric fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_type: Option<NumberType>,
    /// Fixed number of decimal places for numeric fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_place: Option<u32>,
    /// Temporal datatype for temporal fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_type: Option<TemporalType>,
}

impl ValueConstraints {
    /// Returns true when the block carries ontology constraint lists.
    #[must_use]
    pub fn is_controlled(&self) -> bool {
        self.classes.is_some() || self.branches.is_some()
    }

    /// Number of branch constraints.
    #[must_use]
    pub fn branch_count(&self) -> usize {
        self.branches.as_ref().map_or(0, Vec::len)
    }

    /// Number of class constraints.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.as_ref().map_or(0, Vec::len)
    }

    /// Number of action constraints.
    #[must_use]
    pub fn action_count(&self) -> usize {
        self.actions.as_ref().map_or(0, Vec::len)
    }
}

/// JSON Schema accepting a single IRI string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UriSchema {
    /// Always `"string"`.
    #[serde(rename = "type")]
    pub json_type: String,
    /// Always `"uri"`.
    pub format: String,
}

impl UriSchema {
    /// `{"type": "string", "format": "uri"}`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            json_type: "string".to_owned(),
            format: "uri".to_owned(),
        }
    }
}

impl Default for UriSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// JSON Schema accepting a non-empty array of unique IRI strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UriListSchema {
    /// Always `"array"`.
    #[serde(rename = "type")]
    pub json_type: String,
    /// Always `1`.
    pub min_items: u32,
    /// Item schema.
    pub items: UriSchema,
    /// Always `true`.
    pub unique_items: bool,
}

impl UriListSchema {
    /// A non-empty, unique array of IRIs.
    #[must_use]
    pub fn new() -> Self {
        Self {
            json_type: "array".to_owned(),
            min_items: 1,
            items: UriSchema::new(),
            unique_items: true,
        }
    }
}

impl Default for UriListSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema of an IRI-valued property (`@id` or `@type` of a field instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdSchema {
    /// Exactly one IRI.
    Uri(UriSchema),
    /// One IRI or a non-empty unique array of IRIs.
    UriOrList {
        /// The two accepted shapes.
        #[serde(rename = "oneOf")]
        one_of: (UriSchema, UriListSchema),
    },
}

impl IdSchema {
    /// Accepts a single IRI or a non-empty unique array of IRIs.
    #[must_use]
    pub fn uri_or_list() -> Self {
        IdSchema::UriOrList {
            one_of: (UriSchema::new(), UriListSchema::new()),
        }
    }
}

/// Schema of a literal-valued property (`@value`, `rdfs:label`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralSchema {
    /// Accepted JSON types, e.g. `["string", "null"]`.
    #[serde(rename = "type")]
    pub json_types: Vec<String>,
}

impl LiteralSchema {
    /// `{"type": ["string", "null"]}`.
    #[must_use]
    pub fn nullable_string() -> Self {
        Self {
            json_types: vec!["string".to_owned(), "null".to_owned()],
        }
    }
}

/// The `properties` block of a field (shape of one field instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProperties {
    /// Schema of the instance `@type`.
    #[serde(rename = "@type")]
    pub type_: IdSchema,
    /// Literal value; absent for IRI-valued fields.
    #[serde(rename = "@value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LiteralSchema>,
    /// IRI value; absent for literal-valued fields.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<IdSchema>,
    /// Human-readable label of an IRI value.
    #[serde(rename = "rdfs:label", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<LiteralSchema>,
}

/// The `_ui` block of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUi {
    /// Editor input type.
    pub input_type: InputType,
    /// Granularity of temporal fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_granularity: Option<TemporalGranularity>,
}

/// Identity-independent audit metadata shared by every artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Creation timestamp.
    #[serde(rename = "pav:createdOn", default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    /// Creator IRI.
    #[serde(rename = "pav:createdBy", default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Last modification timestamp.
    #[serde(rename = "pav:lastUpdatedOn", default, skip_serializing_if = "Option::is_none")]
    pub last_updated_on: Option<String>,
    /// Last modifier IRI.
    #[serde(rename = "oslc:modifiedBy", default, skip_serializing_if = "Option::is_none")]
    pub modified_by: Option<String>,
}

/// A CEDAR template field (leaf property).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// JSON Schema draft.
    #[serde(rename = "$schema")]
    pub json_schema: String,
    /// Artifact IRI; stripped before publishing.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Always [`iris::FIELD_TYPE`].
    #[serde(rename = "@type")]
    pub type_: String,
    /// JSON-LD context of the artifact.
    #[serde(rename = "@context")]
    pub context: Value,
    /// JSON Schema type (`"object"`).
    #[serde(rename = "type")]
    pub json_type: String,
    /// JSON Schema title.
    #[serde(rename = "title")]
    pub json_title: String,
    /// JSON Schema description.
    #[serde(rename = "description")]
    pub json_description: String,
    /// Editor hints.
    #[serde(rename = "_ui")]
    pub ui: FieldUi,
    /// Value constraints.
    #[serde(rename = "_valueConstraints")]
    pub value_constraints: ValueConstraints,
    /// Shape of a field instance.
    pub properties: FieldProperties,
    /// Instance properties that must be present.
    #[serde(default)]
    pub required: Vec<String>,
    /// Field name.
    #[serde(rename = "schema:name")]
    pub name: String,
    /// Field description.
    #[serde(rename = "schema:description")]
    pub description: String,
    /// Audit metadata.
    #[serde(flatten)]
    pub provenance: Provenance,
    /// CEDAR model version.
    #[serde(rename = "schema:schemaVersion")]
    pub schema_version: String,
    /// Whether instances may carry extra properties.
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

impl Field {
    /// Derives the field kind from the input type and value constraints.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self.ui.input_type {
            InputType::Link => FieldKind::Uri,
            InputType::Temporal => FieldKind::Date,
            InputType::Numeric if self.value_constraints.decimal_place == Some(0) => {
                FieldKind::Integer
            }
            InputType::Numeric => FieldKind::Numeric,
            InputType::Textfield if self.value_constraints.is_controlled() => {
                FieldKind::Controlled
            }
            InputType::Textfield => FieldKind::Text,
        }
    }
}

/// Whether a container is a template or a template element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Top-level template.
    Template,
    /// Reusable template element.
    Element,
}

/// The `_ui` block of a template or element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerUi {
    /// Render order of the members; matches the member keys exactly.
    pub order: Vec<String>,
    /// Display label per member.
    #[serde(default)]
    pub property_labels: BTreeMap<String, String>,
    /// Display description per member.
    #[serde(default)]
    pub property_descriptions: BTreeMap<String, String>,
    /// Page breaks (templates only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<Vec<Value>>,
}

/// One entry of the `@context` property schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextTerm {
    /// Maps a member name to the IRI of the property it came from.
    Enumerated(EnumeratedTerm),
    /// Blueprint-supplied prefix or term schema.
    Schema(Value),
}

/// `{"enum": [iri]}` context entry for one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumeratedTerm {
    /// The accepted IRIs (always exactly one).
    #[serde(rename = "enum")]
    pub values: Vec<String>,
}

/// Schema of the instance-level `@context` property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextProperty {
    /// JSON Schema type (`"object"`).
    #[serde(rename = "type")]
    pub json_type: String,
    /// Context entries keyed by term.
    pub properties: BTreeMap<String, ContextTerm>,
    /// Terms that every instance context must define.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Whether instances may define extra terms.
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// A member of a container property map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Member {
    /// Leaf field.
    Field(Box<Field>),
    /// Nested template element.
    Element(Box<Container>),
    /// Blueprint-supplied structural property (`@id`, `schema:name`, ...).
    Schema(Value),
}

impl Member {
    /// The member's `schema:name`, or `None` for structural properties.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Member::Field(field) => Some(&field.name),
            Member::Element(element) => Some(&element.name),
            Member::Schema(_) => None,
        }
    }

    /// The member's `schema:description`, or `None` for structural properties.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Member::Field(field) => Some(&field.description),
            Member::Element(element) => Some(&element.description),
            Member::Schema(_) => None,
        }
    }
}

/// The `properties` block of a template or element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerProperties {
    /// Schema of the instance `@context`.
    #[serde(rename = "@context")]
    pub context: ContextProperty,
    /// Structural properties and spliced members, keyed by name.
    #[serde(flatten)]
    pub entries: BTreeMap<String, Member>,
}

/// A CEDAR template or template element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// JSON Schema draft.
    #[serde(rename = "$schema")]
    pub json_schema: String,
    /// Artifact IRI; stripped before publishing.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// [`iris::TEMPLATE_TYPE`] or [`iris::ELEMENT_TYPE`].
    #[serde(rename = "@type")]
    pub type_: String,
    /// JSON-LD context of the artifact.
    #[serde(rename = "@context")]
    pub context: Value,
    /// JSON Schema type (`"object"`).
    #[serde(rename = "type")]
    pub json_type: String,
    /// JSON Schema title.
    #[serde(rename = "title")]
    pub json_title: String,
    /// JSON Schema description.
    #[serde(rename = "description")]
    pub json_description: String,
    /// Editor hints, including the render order.
    #[serde(rename = "_ui")]
    pub ui: ContainerUi,
    /// Member property map.
    pub properties: ContainerProperties,
    /// Properties every instance must carry.
    #[serde(default)]
    pub required: Vec<String>,
    /// Container name.
    #[serde(rename = "schema:name")]
    pub name: String,
    /// Container description.
    #[serde(rename = "schema:description")]
    pub description: String,
    /// Audit metadata.
    #[serde(flatten)]
    pub provenance: Provenance,
    /// CEDAR model version.
    #[serde(rename = "schema:schemaVersion")]
    pub schema_version: String,
    /// Whether instances may carry extra properties.
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Property key of [`ContainerProperties::context`]; never given to a member.
const CONTEXT_KEY: &str = "@context";

impl Container {
    /// Template or element, judged by `@type`.
    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        if self.type_ == iris::ELEMENT_TYPE {
            ContainerKind::Element
        } else {
            ContainerKind::Template
        }
    }

    /// Adds a field or element to this container.
    ///
    /// The member is stored under its `schema:name`; if that key is already
    /// taken a numeric suffix (`" 2"`, `" 3"`, ...) is appended so the key,
    /// the render order and the required lists stay in one-to-one
    /// correspondence. `origin_iri` is registered as the member's enumerated
    /// `@context` entry. Returns the key the member was stored under.
    pub fn splice(&mut self, member: Member, origin_iri: &str) -> String {
        let label = member.name().unwrap_or_default().to_owned();
        let description = member.description().unwrap_or_default().to_owned();
        let key = self.free_key(&label);

        self.properties.entries.insert(key.clone(), member);
        self.ui.order.push(key.clone());
        self.ui.property_labels.insert(key.clone(), label);
        self.ui.property_descriptions.insert(key.clone(), description);

        let context = &mut self.properties.context;
        context.properties.insert(
            key.clone(),
            ContextTerm::Enumerated(EnumeratedTerm {
                values: vec![origin_iri.to_owned()],
            }),
        );
        context.required.get_or_insert_with(Vec::new).push(key.clone());
        self.required.push(key.clone());
        key
    }

    fn free_key(&self, name: &str) -> String {
        let taken = |key: &str| {
            key == CONTEXT_KEY
                || self.properties.entries.contains_key(key)
                || self.properties.context.properties.contains_key(key)
        };
        if !taken(name) {
            return name.to_owned();
        }
        let mut n = 2usize;
        loop {
            let candidate = format!("{name} {n}");
            if !taken(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Sets `pav:lastUpdatedOn`.
    pub fn touch(&mut self, timestamp: &str) {
        self.provenance.last_updated_on = Some(timestamp.to_owned());
    }

    /// Spliced members in render order, paired with their keys.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.ui.order.iter().filter_map(|key| {
            self.properties
                .entries
                .get(key)
                .map(|member| (key.as_str(), member))
        })
    }

    /// Nested elements in render order, paired with their keys.
    pub fn elements(&self) -> impl Iterator<Item = (&str, &Container)> {
        self.members().filter_map(|(key, member)| match member {
            Member::Element(element) => Some((key, element.as_ref())),
            _ => None,
        })
    }

    /// Looks up a spliced field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Field> {
        match self.properties.entries.get(key) {
            Some(Member::Field(field)) => Some(field),
            _ => None,
        }
    }

    /// Looks up a spliced element by key.
    #[must_use]
    pub fn element(&self, key: &str) -> Option<&Container> {
        match self.properties.entries.get(key) {
            Some(Member::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Number of spliced fields and elements.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.ui.order.len()
    }
}
