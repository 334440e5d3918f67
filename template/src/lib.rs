//! CEDAR metadata templates encoded as typed Rust data.
//!
//! The `cedar-template` crate models CEDAR templates, template elements and
//! template fields as `serde` records, instantiates blank artifacts from
//! blueprints, and serializes finished artifacts to JSON-LD.
//!
//! # Entry Point
//!
//! ```
//! use cedar_template::{BlueprintSet, EntityKind, IdentitySeed};
//!
//! let blueprints = BlueprintSet::embedded();
//! let template = blueprints
//!     .build_container(EntityKind::Template, &IdentitySeed::generate(), "Assay", "Assay template")
//!     .expect("embedded blueprints are valid");
//! assert!(template.ui.order.is_empty());
//! ```
//!
//! # Serialization
//!
//! ```
//! # use cedar_template::{BlueprintSet, EntityKind, IdentitySeed};
//! # let template = BlueprintSet::embedded()
//! #     .build_container(EntityKind::Template, &IdentitySeed::generate(), "Assay", "")
//! #     .expect("embedded blueprints are valid");
//! let json_ld = cedar_template::serializer::jsonld::to_json_ld_string(&template);
//! let publish = cedar_template::serializer::jsonld::to_publish_json(&template);
//! # assert!(json_ld.is_ok() && publish.is_ok());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod blueprint;
pub mod model;
pub mod serializer;

pub use blueprint::{sanitize, timestamp_now, BlueprintError, BlueprintSet, Entity, EntityKind, IdentitySeed};
pub use model::{
    ActionConstraint, BranchConstraint, ClassConstraint, Container, ContainerKind, Field,
    FieldKind, InputType, Member, ValueConstraints,
};

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn seed(n: u128) -> IdentitySeed {
        IdentitySeed {
            guid: Uuid::from_u128(n),
            created_on: "2024-01-01T00:00:00+00:00".to_owned(),
        }
    }

    fn blank(kind: EntityKind, n: u128, name: &str) -> Container {
        BlueprintSet::embedded()
            .build_container(kind, &seed(n), name, "")
            .expect("embedded blueprint")
    }

    fn field(n: u128, name: &str) -> Member {
        Member::Field(Box::new(
            BlueprintSet::embedded()
                .build_field(&seed(n), name, "")
                .expect("embedded blueprint"),
        ))
    }

    #[test]
    fn splice_keeps_order_labels_and_required_in_step() {
        let mut template = blank(EntityKind::Template, 1, "Root");
        template.splice(field(2, "assay format"), "http://example.org/p/format");
        template.splice(field(3, "organism"), "http://example.org/p/organism");

        assert_eq!(template.ui.order, vec!["assay format", "organism"]);
        assert_eq!(template.ui.property_labels["organism"], "organism");
        assert!(template.required.ends_with(&["assay format".to_owned(), "organism".to_owned()]));
        let context_required = template
            .properties
            .context
            .required
            .as_ref()
            .expect("context required list");
        assert!(context_required.ends_with(&["assay format".to_owned(), "organism".to_owned()]));
        assert_eq!(
            template.properties.context.properties["organism"],
            model::ContextTerm::Enumerated(model::EnumeratedTerm {
                values: vec!["http://example.org/p/organism".to_owned()]
            })
        );
    }

    #[test]
    fn splice_disambiguates_repeated_names() {
        let mut template = blank(EntityKind::Template, 1, "Root");
        let first = template.splice(field(2, "target"), "http://example.org/p/a");
        let second = template.splice(field(3, "target"), "http://example.org/p/b");
        assert_eq!(first, "target");
        assert_eq!(second, "target 2");
        assert_eq!(template.member_count(), 2);
        assert_eq!(template.ui.property_labels["target 2"], "target");
    }

    #[test]
    fn splice_does_not_overwrite_structural_properties() {
        let mut template = blank(EntityKind::Template, 1, "Root");
        let key = template.splice(field(2, "schema:name"), "http://example.org/p/name");
        assert_eq!(key, "schema:name 2");
        assert!(matches!(
            template.properties.entries.get("schema:name"),
            Some(Member::Schema(_))
        ));

        let key = template.splice(field(3, "@context"), "http://example.org/p/context");
        assert_eq!(key, "@context 2");
        assert_eq!(template.ui.property_labels["@context 2"], "@context");
        let text = serializer::jsonld::to_json_ld_string(&template).expect("serializes");
        let reparsed: Container = serde_json::from_str(&text).expect("reparses");
        assert_eq!(reparsed, template);
    }

    #[test]
    fn elements_follow_render_order() {
        let mut template = blank(EntityKind::Template, 1, "Root");
        template.splice(
            Member::Element(Box::new(blank(EntityKind::Element, 2, "zeta"))),
            "http://example.org/g/zeta",
        );
        template.splice(field(3, "middle"), "http://example.org/p/middle");
        template.splice(
            Member::Element(Box::new(blank(EntityKind::Element, 4, "alpha"))),
            "http://example.org/g/alpha",
        );
        let names: Vec<&str> = template.elements().map(|(key, _)| key).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
