//! Blueprint-based entity construction.
//!
//! A blueprint is the JSON text of a blank CEDAR field, element or template
//! containing `%{guid}`, `%{name}`, `%{descr}` and `%{created_on}`
//! placeholders. [`BlueprintSet::build`] substitutes a fresh identity and the
//! sanitized name/description, then parses the result into a typed
//! [`Entity`].
//!
//! The embedded set ([`BlueprintSet::embedded`]) ships with the crate; a
//! directory of `{kind}.json` files may replace it at runtime.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

use crate::model::{Container, Field};

/// Errors raised while loading or instantiating blueprints.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// No blueprint is registered for the requested kind.
    #[error("no blueprint found for entity kind `{kind}`")]
    BlueprintMissing {
        /// The requested kind.
        kind: EntityKind,
    },
    /// Substitution produced text that does not parse as the expected entity.
    #[error("blueprint for `{kind}` did not produce a valid entity: {source}")]
    Malformed {
        /// The requested kind.
        kind: EntityKind,
        /// Underlying parse failure.
        source: serde_json::Error,
    },
    /// A blueprint file could not be read.
    #[error("failed to read blueprint {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
}

/// The three entity kinds a blueprint can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Leaf field.
    Field,
    /// Template element.
    Element,
    /// Top-level template.
    Template,
}

impl EntityKind {
    /// All kinds, in blueprint-file order.
    pub const ALL: [EntityKind; 3] = [EntityKind::Field, EntityKind::Element, EntityKind::Template];

    /// Returns the blueprint name (`"field"`, `"element"`, `"template"`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Field => "field",
            EntityKind::Element => "element",
            EntityKind::Template => "template",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly instantiated entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    /// Built from the `field` blueprint.
    Field(Field),
    /// Built from the `element` blueprint.
    Element(Container),
    /// Built from the `template` blueprint.
    Template(Container),
}

/// Identity and creation time substituted into one entity.
///
/// A seed must never be reused for two entities of the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySeed {
    /// Unique identifier embedded in the artifact IRI.
    pub guid: Uuid,
    /// Creation timestamp (RFC 3339).
    pub created_on: String,
}

impl IdentitySeed {
    /// Random v4 identifier stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            guid: Uuid::new_v4(),
            created_on: timestamp_now(),
        }
    }
}

/// Current time in the format used for `pav:*On` timestamps.
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Makes free text safe to embed in a JSON string literal.
///
/// Double quotes become single quotes and CR, LF and tab become a single
/// space each. Backslashes are escaped and any other control character is
/// replaced by a space, so the substituted blueprint always parses.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push('\''),
            '\r' | '\n' | '\t' => out.push(' '),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// Replaces `%{key}` placeholders in a single left-to-right pass.
///
/// Substituted values are never rescanned, so text that itself contains a
/// placeholder is embedded literally. Unknown keys are left untouched.
fn substitute(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("%{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("%{");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Registry of blueprints keyed by entity kind.
#[derive(Debug, Clone, Default)]
pub struct BlueprintSet {
    blueprints: HashMap<EntityKind, String>,
}

impl BlueprintSet {
    /// An empty registry; every build fails with
    /// [`BlueprintError::BlueprintMissing`] until blueprints are inserted.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The blueprints shipped with this crate.
    #[must_use]
    pub fn embedded() -> Self {
        let mut set = Self::empty();
        set.insert(EntityKind::Field, include_str!("../blueprints/field.json"));
        set.insert(EntityKind::Element, include_str!("../blueprints/element.json"));
        set.insert(EntityKind::Template, include_str!("../blueprints/template.json"));
        set
    }

    /// Loads `field.json`, `element.json` and `template.json` from `dir`.
    ///
    /// Kinds whose file is absent are simply not registered; building them
    /// later fails with [`BlueprintError::BlueprintMissing`].
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::Io`] if a present file cannot be read.
    pub fn from_dir(dir: &Path) -> Result<Self, BlueprintError> {
        let mut set = Self::empty();
        for kind in EntityKind::ALL {
            let path = dir.join(format!("{}.json", kind.as_str()));
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|source| BlueprintError::Io { path: path.clone(), source })?;
            set.insert(kind, text);
        }
        Ok(set)
    }

    /// Registers (or replaces) the blueprint for `kind`.
    pub fn insert(&mut self, kind: EntityKind, text: impl Into<String>) {
        self.blueprints.insert(kind, text.into());
    }

    /// Returns true if a blueprint is registered for `kind`.
    #[must_use]
    pub fn contains(&self, kind: EntityKind) -> bool {
        self.blueprints.contains_key(&kind)
    }

    /// Instantiates a blank entity of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::BlueprintMissing`] if no blueprint exists for
    /// `kind`, or [`BlueprintError::Malformed`] if the substituted text is not
    /// a valid entity of that kind.
    pub fn build(
        &self,
        kind: EntityKind,
        seed: &IdentitySeed,
        name: &str,
        description: &str,
    ) -> Result<Entity, BlueprintError> {
        let blueprint = self
            .blueprints
            .get(&kind)
            .ok_or(BlueprintError::BlueprintMissing { kind })?;

        let guid = seed.guid.to_string();
        let name = sanitize(name);
        let description = sanitize(description);
        let text = substitute(
            blueprint,
            &[
                ("guid", &guid),
                ("name", &name),
                ("descr", &description),
                ("created_on", &seed.created_on),
            ],
        );

        let malformed = |source| BlueprintError::Malformed { kind, source };
        Ok(match kind {
            EntityKind::Field => Entity::Field(serde_json::from_str(&text).map_err(malformed)?),
            EntityKind::Element => {
                Entity::Element(serde_json::from_str(&text).map_err(malformed)?)
            }
            EntityKind::Template => {
                Entity::Template(serde_json::from_str(&text).map_err(malformed)?)
            }
        })
    }

    /// Builds a blank field.
    ///
    /// # Errors
    ///
    /// See [`BlueprintSet::build`].
    pub fn build_field(
        &self,
        seed: &IdentitySeed,
        name: &str,
        description: &str,
    ) -> Result<Field, BlueprintError> {
        match self.build(EntityKind::Field, seed, name, description)? {
            Entity::Field(field) => Ok(field),
            Entity::Element(_) | Entity::Template(_) => {
                Err(BlueprintError::BlueprintMissing { kind: EntityKind::Field })
            }
        }
    }

    /// Builds a blank template or element container.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::BlueprintMissing`] when `kind` is
    /// [`EntityKind::Field`]; otherwise see [`BlueprintSet::build`].
    pub fn build_container(
        &self,
        kind: EntityKind,
        seed: &IdentitySeed,
        name: &str,
        description: &str,
    ) -> Result<Container, BlueprintError> {
        match self.build(kind, seed, name, description)? {
            Entity::Element(container) | Entity::Template(container) => Ok(container),
            Entity::Field(_) => Err(BlueprintError::BlueprintMissing { kind }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{iris, ContainerKind, FieldKind};

    fn seed(n: u128) -> IdentitySeed {
        IdentitySeed {
            guid: Uuid::from_u128(n),
            created_on: "2024-01-01T00:00:00+00:00".to_owned(),
        }
    }

    #[test]
    fn sanitize_replaces_quotes_and_whitespace_controls() {
        assert_eq!(sanitize("say \"hi\"\r\n\tnow"), "say 'hi'   now");
        assert_eq!(sanitize(r"a\b"), r"a\\b");
    }

    #[test]
    fn substitute_is_single_pass() {
        let out = substitute("%{name}-%{descr}-%{other}", &[("name", "%{descr}"), ("descr", "d")]);
        assert_eq!(out, "%{descr}-d-%{other}");
    }

    #[test]
    fn embedded_field_blueprint_builds_text_field() {
        let field = BlueprintSet::embedded()
            .build_field(&seed(1), "assay \"kind\"", "line one\nline two")
            .expect("field builds");
        assert_eq!(field.type_, iris::FIELD_TYPE);
        assert_eq!(field.name, "assay 'kind'");
        assert_eq!(field.description, "line one line two");
        assert_eq!(field.kind(), FieldKind::Text);
        assert!(field
            .id
            .as_deref()
            .is_some_and(|id| id.ends_with("00000000-0000-0000-0000-000000000001")));
        assert_eq!(
            field.provenance.created_on.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn embedded_container_blueprints_build() {
        let set = BlueprintSet::embedded();
        let template = set
            .build_container(EntityKind::Template, &seed(2), "Root", "root group")
            .expect("template builds");
        let element = set
            .build_container(EntityKind::Element, &seed(3), "Group", "sub group")
            .expect("element builds");
        assert_eq!(template.kind(), ContainerKind::Template);
        assert_eq!(element.kind(), ContainerKind::Element);
        assert!(template.ui.order.is_empty());
        assert!(element.ui.order.is_empty());
    }

    #[test]
    fn missing_blueprint_is_reported() {
        let err = BlueprintSet::empty()
            .build(EntityKind::Element, &seed(4), "x", "y")
            .expect_err("no blueprint registered");
        assert!(matches!(
            err,
            BlueprintError::BlueprintMissing { kind: EntityKind::Element }
        ));
    }

    #[test]
    fn blueprint_dir_registers_only_present_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("field.json"),
            include_str!("../blueprints/field.json"),
        )
        .expect("write blueprint");
        let set = BlueprintSet::from_dir(dir.path()).expect("load dir");
        assert!(set.contains(EntityKind::Field));
        assert!(!set.contains(EntityKind::Template));
    }
}
