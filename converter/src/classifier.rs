//! Field classification: one source field to one destination field.
//!
//! A field with any values is controlled, whatever its suggestion hint says.
//! Otherwise the hint decides: `string` → text, `number` → numeric,
//! `integer` → integer, `date` → date, anything else (or no hint) → URI.
//!
//! A controlled field whose values produce neither a branch nor a class is
//! rebuilt as free text from the same blank field, so the result does not
//! depend on which values failed or in what order.

use cedar_template::model::{
    FieldKind, IdSchema, InputType, LiteralSchema, NumberType, TemporalGranularity, TemporalType,
    UriSchema,
};
use cedar_template::Field;
use tracing::{debug, info};

use crate::engine::Converter;
use crate::error::ConvertError;
use crate::resolver::{resolve_value, Partition};
use crate::source::{SourceField, SuggestionHint};

/// Decides the destination kind of a source field before value resolution.
#[must_use]
pub fn planned_kind(field: &SourceField) -> FieldKind {
    if !field.values.is_empty() {
        return FieldKind::Controlled;
    }
    match field.suggestions {
        Some(SuggestionHint::String) => FieldKind::Text,
        Some(SuggestionHint::Number) => FieldKind::Numeric,
        Some(SuggestionHint::Integer) => FieldKind::Integer,
        Some(SuggestionHint::Date) => FieldKind::Date,
        _ => FieldKind::Uri,
    }
}

impl Converter<'_> {
    /// Builds the destination field for `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Blueprint`] if the field blueprint is missing
    /// or malformed, and propagates lookup-service failures.
    pub fn classify_field(&mut self, source: &SourceField) -> Result<Field, ConvertError> {
        let seed = self.identities.next_seed();
        let base = self
            .blueprints
            .build_field(&seed, &source.name, &source.description)?;
        self.stats.fields += 1;

        let mut field = match planned_kind(source) {
            FieldKind::Controlled => {
                let mut partition = Partition::default();
                for spec in &source.values {
                    partition.extend(resolve_value(
                        spec,
                        &self.catalog,
                        &mut self.terms,
                        self.lookup,
                    )?);
                }
                if partition.is_empty_selection() {
                    self.stats.demoted += 1;
                    info!(
                        field = %source.name,
                        values = source.values.len(),
                        "no usable ontology values; demoted to free text"
                    );
                    text_field(base)
                } else {
                    controlled_field(base, partition)
                }
            }
            FieldKind::Text => text_field(base),
            FieldKind::Numeric => numeric_field(base),
            FieldKind::Integer => integer_field(base),
            FieldKind::Date => date_field(base),
            FieldKind::Uri => uri_field(base),
        };

        field.value_constraints.required_value = source.mandatory;
        debug!(field = %source.name, kind = field.kind().as_str(), "classified field");
        Ok(field)
    }
}

/// Free text: a literal value is required.
#[must_use]
pub fn text_field(mut field: Field) -> Field {
    field.ui.input_type = InputType::Textfield;
    field.properties.value = Some(LiteralSchema::nullable_string());
    field.properties.id = None;
    field.required = vec!["@value".to_owned()];
    field
}

/// Day-granularity `xsd:date` literal.
#[must_use]
pub fn date_field(field: Field) -> Field {
    let mut field = text_field(field);
    field.ui.input_type = InputType::Temporal;
    field.ui.temporal_granularity = Some(TemporalGranularity::Day);
    field.value_constraints.temporal_type = Some(TemporalType::Date);
    field
}

/// `xsd:decimal` literal; both the value and its datatype are required.
#[must_use]
pub fn numeric_field(field: Field) -> Field {
    let mut field = text_field(field);
    field.ui.input_type = InputType::Numeric;
    field.value_constraints.number_type = Some(NumberType::Decimal);
    field.required = vec!["@value".to_owned(), "@type".to_owned()];
    field
}

/// Numeric literal with zero decimal places.
#[must_use]
pub fn integer_field(field: Field) -> Field {
    let mut field = numeric_field(field);
    field.value_constraints.decimal_place = Some(0);
    field
}

/// IRI reference instead of a literal value.
#[must_use]
pub fn uri_field(mut field: Field) -> Field {
    field.ui.input_type = InputType::Link;
    field.properties.value = None;
    field.properties.id = Some(IdSchema::Uri(UriSchema::new()));
    field.required = vec!["@id".to_owned()];
    field
}

/// Ontology-constrained value drawn from the resolved constraint lists.
#[must_use]
pub fn controlled_field(mut field: Field, partition: Partition) -> Field {
    field.ui.input_type = InputType::Textfield;
    field.properties.value = None;
    field.properties.type_ = IdSchema::uri_or_list();
    field.properties.id = Some(IdSchema::Uri(UriSchema::new()));
    field.properties.label = Some(LiteralSchema::nullable_string());
    field.required = Vec::new();

    let constraints = &mut field.value_constraints;
    constraints.ontologies = Some(Vec::new());
    constraints.value_sets = Some(Vec::new());
    constraints.branches = Some(partition.branches);
    constraints.classes = Some(partition.classes);
    constraints.actions = Some(partition.actions);
    field
}
