//! Resource traits and attribute mapping.
//!
//! A resource is a plain serde struct plus a few associated constants:
//!
//! - [`Entity::FIELDS`]: aliases between attribute names and wire names, and
//!   per-attribute defaults
//! - [`Resource::CATALOG_TYPE`]: the catalog type of the service that owns it
//! - [`Resource::OPTIONS`]: endpoint and envelope keys
//!
//! # Example
//!
//! ```rust
//! use cloud_portal::rest::{Entity, FieldMap, Resource, ResourceOptions};
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Clone, Debug, Deserialize)]
//! struct Flavor {
//!     id: String,
//!     #[serde(default)]
//!     is_disabled: bool,
//! }
//!
//! impl Entity for Flavor {
//!     const NAME: &'static str = "Flavor";
//!     const FIELDS: FieldMap = FieldMap::new(&[("is_disabled", "OS-FLV-DISABLED:disabled")], &[]);
//! }
//!
//! impl Resource for Flavor {
//!     const CATALOG_TYPE: &'static str = "compute";
//!     const OPTIONS: ResourceOptions = ResourceOptions::new("/flavors").with_detail();
//!
//!     fn primary_key(&self) -> String {
//!         self.id.clone()
//!     }
//! }
//!
//! let flavor = Flavor::from_wire(json!({"id": "m1", "OS-FLV-DISABLED:disabled": true})).unwrap();
//! assert!(flavor.is_disabled);
//! ```

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::rest::{ResourceError, ResourceOptions, UnmanagedOptions};

/// Produces a fresh default value for one attribute.
pub type DefaultFactory = fn() -> Value;

/// Static attribute mapping for an entity.
///
/// `aliases` pairs an attribute name with its wire name. Reads translate
/// wire names to attribute names and writes translate back. `defaults`
/// supply values for attributes absent from a response; each factory runs
/// once per decoded instance so no two instances share a default.
#[derive(Clone, Copy, Debug)]
pub struct FieldMap {
    aliases: &'static [(&'static str, &'static str)],
    defaults: &'static [(&'static str, DefaultFactory)],
}

impl FieldMap {
    /// A map with no aliases and no defaults.
    pub const EMPTY: Self = Self::new(&[], &[]);

    /// Creates a field map from `(attribute, wire)` aliases and
    /// `(attribute, factory)` defaults.
    #[must_use]
    pub const fn new(
        aliases: &'static [(&'static str, &'static str)],
        defaults: &'static [(&'static str, DefaultFactory)],
    ) -> Self {
        Self { aliases, defaults }
    }

    /// Returns the wire name for an attribute.
    #[must_use]
    pub fn wire_name<'a>(&self, attribute: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(attr, _)| *attr == attribute)
            .map_or(attribute, |(_, wire)| *wire)
    }

    /// Returns the attribute name for a wire name.
    #[must_use]
    pub fn attribute_name<'a>(&self, wire: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(_, w)| *w == wire)
            .map_or(wire, |(attr, _)| *attr)
    }

    /// Translates a wire object to attribute names and fills in defaults.
    ///
    /// Non-object values are returned unchanged.
    #[must_use]
    pub fn to_attributes(&self, value: Value) -> Value {
        match value {
            Value::Object(wire) => Value::Object(self.attributes_from(wire)),
            other => other,
        }
    }

    /// Object form of [`to_attributes`](Self::to_attributes).
    #[must_use]
    pub fn attributes_from(&self, wire: Map<String, Value>) -> Map<String, Value> {
        let mut attributes: Map<String, Value> = wire
            .into_iter()
            .map(|(key, value)| (self.attribute_name(&key).to_string(), value))
            .collect();
        for (attribute, factory) in self.defaults {
            if !attributes.contains_key(*attribute) {
                attributes.insert((*attribute).to_string(), factory());
            }
        }
        attributes
    }

    /// Translates attribute names in an object to wire names.
    #[must_use]
    pub fn to_wire(&self, attributes: Map<String, Value>) -> Map<String, Value> {
        attributes
            .into_iter()
            .map(|(key, value)| (self.wire_name(&key).to_string(), value))
            .collect()
    }
}

/// A typed value decoded from an API document.
pub trait Entity: DeserializeOwned + Send + Sync + Sized {
    /// Name used in error messages and logs.
    const NAME: &'static str;

    /// Attribute aliases and defaults.
    const FIELDS: FieldMap = FieldMap::EMPTY;

    /// Decodes an entity from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Deserialize`] if the document does not fit
    /// the typed model.
    fn from_wire(value: Value) -> Result<Self, ResourceError> {
        serde_json::from_value(Self::FIELDS.to_attributes(value))
            .map_err(|e| ResourceError::deserialize(Self::NAME, &e))
    }
}

/// A managed resource with its own identity and URL.
pub trait Resource: Entity + Clone {
    /// Catalog type of the service that owns this resource.
    const CATALOG_TYPE: &'static str;

    /// Endpoint and envelope description.
    const OPTIONS: ResourceOptions;

    /// Returns the value used as the instance key in URLs.
    fn primary_key(&self) -> String;
}

/// A document served by an endpoint that has no identity of its own.
pub trait UnmanagedResource: Entity {
    /// Endpoint and envelope description.
    const OPTIONS: UnmanagedOptions;
}

/// Renders a scalar JSON value as an instance key.
pub(crate) fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn empty_object() -> Value {
        json!({})
    }

    const SERVER_FIELDS: FieldMap = FieldMap::new(
        &[
            ("image_id", "imageRef"),
            ("task_state", "OS-EXT-STS:task_state"),
        ],
        &[("fault", empty_object)],
    );

    #[derive(Debug, Deserialize)]
    struct Probe {
        id: u64,
        #[serde(default)]
        task_state: Option<String>,
        fault: Value,
    }

    impl Entity for Probe {
        const NAME: &'static str = "Probe";
        const FIELDS: FieldMap = SERVER_FIELDS;
    }

    #[test]
    fn test_aliases_translate_both_ways() {
        assert_eq!(SERVER_FIELDS.wire_name("image_id"), "imageRef");
        assert_eq!(SERVER_FIELDS.attribute_name("imageRef"), "image_id");
        assert_eq!(SERVER_FIELDS.wire_name("name"), "name");
        assert_eq!(SERVER_FIELDS.attribute_name("name"), "name");
    }

    #[test]
    fn test_to_wire_renames_known_attributes_only() {
        let attributes = json!({"image_id": "img", "name": "vm"});
        let Value::Object(attributes) = attributes else {
            unreachable!()
        };
        let wire = SERVER_FIELDS.to_wire(attributes);
        assert_eq!(Value::Object(wire), json!({"imageRef": "img", "name": "vm"}));
    }

    #[test]
    fn test_defaults_fill_missing_attributes_only() {
        let probe = Probe::from_wire(json!({"id": 1, "OS-EXT-STS:task_state": "spawning"})).unwrap();
        assert_eq!(probe.id, 1);
        assert_eq!(probe.task_state.as_deref(), Some("spawning"));
        assert_eq!(probe.fault, json!({}));

        let probe = Probe::from_wire(json!({"id": 2, "fault": {"code": 500}})).unwrap();
        assert_eq!(probe.fault, json!({"code": 500}));
    }

    #[test]
    fn test_defaults_are_fresh_per_instance() {
        let Value::Object(mut first) = SERVER_FIELDS.to_attributes(json!({"id": 1})) else {
            unreachable!()
        };
        let second = SERVER_FIELDS.to_attributes(json!({"id": 2}));

        first
            .get_mut("fault")
            .and_then(Value::as_object_mut)
            .unwrap()
            .insert("code".to_string(), json!(1));
        assert_eq!(second["fault"], json!({}));
    }

    #[test]
    fn test_decode_failure_names_the_entity() {
        let error = Probe::from_wire(json!({"id": "not-a-number"})).unwrap_err();
        assert!(matches!(error, ResourceError::Deserialize { resource: "Probe", .. }));
    }

    #[test]
    fn test_key_string_accepts_strings_and_numbers() {
        assert_eq!(key_string(&json!("abc")), Some("abc".to_string()));
        assert_eq!(key_string(&json!(42)), Some("42".to_string()));
        assert_eq!(key_string(&json!("")), None);
        assert_eq!(key_string(&Value::Null), None);
    }
}
