//! Template assembly: a source document to one destination template.
//!
//! Fields of a group are spliced first, in source order, then each sub-group
//! is built into an element (recursively) and spliced the same way. The
//! resulting `_ui.order` is the render order used by every later step.

use cedar_template::{Container, EntityKind, Member};
use tracing::{debug, info};

use crate::engine::Converter;
use crate::error::ConvertError;
use crate::source::{SourceDocument, SourceGroup};

impl Converter<'_> {
    /// Builds the destination template for `document`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Blueprint`] if a blueprint is missing or
    /// malformed, and propagates lookup-service failures. Nothing is
    /// returned on failure.
    pub fn assemble(&mut self, document: &SourceDocument) -> Result<Container, ConvertError> {
        let root = &document.root;
        info!(template = %root.name, "assembling template");
        let template = self.assemble_group(root, EntityKind::Template)?;
        let stats = self.stats();
        info!(
            members = template.member_count(),
            fields = stats.fields,
            elements = stats.elements,
            demoted = stats.demoted,
            lookups = stats.terms.lookups,
            cache_hits = stats.terms.hits,
            "template assembled"
        );
        Ok(template)
    }

    fn assemble_group(
        &mut self,
        group: &SourceGroup,
        kind: EntityKind,
    ) -> Result<Container, ConvertError> {
        let seed = self.identities.next_seed();
        let mut container =
            self.blueprints
                .build_container(kind, &seed, &group.name, &group.description)?;

        for source in &group.assignments {
            let field = self.classify_field(source)?;
            let key = container.splice(Member::Field(Box::new(field)), &source.prop_uri);
            debug!(container = %group.name, key = %key, "spliced field");
        }

        for sub_group in &group.sub_groups {
            let element = self.assemble_group(sub_group, EntityKind::Element)?;
            self.stats.elements += 1;
            let key = container.splice(Member::Element(Box::new(element)), &sub_group.group_uri);
            debug!(container = %group.name, key = %key, "spliced element");
        }

        let timestamp = self.identities.timestamp();
        container.touch(&timestamp);
        Ok(container)
    }
}
