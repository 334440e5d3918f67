//! JSON-LD serializer for CEDAR templates and elements.
//!
//! The typed model already mirrors the CEDAR JSON-LD layout, so serialization
//! is a direct `serde` pass. The publish projection removes the artifact
//! `@id` and the `pav:createdOn`, `pav:createdBy`, `pav:lastUpdatedOn` and
//! `oslc:modifiedBy` audit properties from the top-level artifact; the
//! repository assigns those itself. Nested members keep theirs.

use serde_json::Value;

use crate::model::{Container, Provenance};

/// Top-level properties removed by [`publish_projection`].
pub const TRANSIENT_PROPERTIES: &[&str] = &[
    "@id",
    "pav:createdOn",
    "pav:createdBy",
    "pav:lastUpdatedOn",
    "oslc:modifiedBy",
];

/// Serializes a template or element to a JSON-LD `Value`.
///
/// # Errors
///
/// Returns an error only if `serde_json` rejects the value, which the model
/// types never trigger in practice.
pub fn to_json_ld(container: &Container) -> Result<Value, serde_json::Error> {
    serde_json::to_value(container)
}

/// Serializes a template or element to pretty-printed JSON-LD text.
///
/// # Errors
///
/// See [`to_json_ld`].
pub fn to_json_ld_string(container: &Container) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(container)
}

/// Returns a copy of `container` without its identity and audit properties.
///
/// Applying the projection twice yields the same result as applying it once.
#[must_use]
pub fn publish_projection(container: &Container) -> Container {
    let mut projected = container.clone();
    projected.id = None;
    projected.provenance = Provenance::default();
    projected
}

/// Serializes the publish projection of `container` to compact JSON text.
///
/// # Errors
///
/// See [`to_json_ld`].
pub fn to_publish_json(container: &Container) -> Result<String, serde_json::Error> {
    serde_json::to_string(&publish_projection(container))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{BlueprintSet, EntityKind, IdentitySeed};

    fn template() -> Container {
        BlueprintSet::embedded()
            .build_container(
                EntityKind::Template,
                &IdentitySeed::generate(),
                "Assay",
                "Root assay group",
            )
            .expect("template builds")
    }

    #[test]
    fn projection_strips_transient_properties() {
        let mut template = template();
        template.touch("2024-02-02T00:00:00+00:00");
        let value: Value =
            serde_json::from_str(&to_publish_json(&template).expect("serializes")).expect("parses");
        for key in TRANSIENT_PROPERTIES {
            assert!(value.get(key).is_none(), "{key} should be stripped");
        }
        assert_eq!(value["schema:name"], "Assay");
    }

    #[test]
    fn projection_is_idempotent() {
        let template = template();
        let once = publish_projection(&template);
        let twice = publish_projection(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn json_ld_round_trips_through_model() {
        let template = template();
        let text = to_json_ld_string(&template).expect("serializes");
        let parsed: Container = serde_json::from_str(&text).expect("parses back");
        assert_eq!(parsed, template);
    }

    #[test]
    fn json_ld_keeps_context_and_type() {
        let value = to_json_ld(&template()).expect("serializes");
        assert_eq!(value["@type"], crate::model::iris::TEMPLATE_TYPE);
        assert!(value["@context"].get("schema").is_some());
        assert_eq!(value["properties"]["@context"]["type"], "object");
    }
}
