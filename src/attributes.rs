use crate::graph::TypeId;
use crate::schema::{JsonSchema, PropertySchema};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tag identifying an attribute channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AttributeKind {
    /// Raw `default` values of a class's properties, keyed by JSON name.
    PropertyDefaults,
}

/// Typed metadata attached to a type-graph node, independent of the node's
/// structural information.
#[derive(Debug, Clone)]
pub enum Attribute {
    PropertyDefaults(BTreeMap<String, Value>),
}

impl Attribute {
    pub const fn kind(&self) -> AttributeKind {
        match self {
            Self::PropertyDefaults(_) => AttributeKind::PropertyDefaults,
        }
    }
}

/// Merge policy invoked when a node receives a second attribute of the same
/// kind (i.e. when two schema sources unify onto one node).
pub type MergeFn = fn(Attribute, Attribute) -> Attribute;

/// Inspects one schema object and optionally yields an attribute for the
/// class node it becomes.
pub type AttributeProducer = fn(&JsonSchema) -> Option<Attribute>;

/// Keeps the first source's attribute unchanged. Later sources' conflicting
/// values are silently dropped; this is a documented simplification, not a
/// general merge.
fn keep_first(existing: Attribute, _incoming: Attribute) -> Attribute {
    existing
}

/// Side table of per-node attributes with an injectable per-kind merge
/// policy. Each node is written at most once per schema-object occurrence
/// and read once during emission.
#[derive(Debug)]
pub struct AttributeStore {
    entries: BTreeMap<(TypeId, AttributeKind), Attribute>,
    merge_fns: BTreeMap<AttributeKind, MergeFn>,
}

impl AttributeStore {
    pub fn new() -> Self {
        let mut store: Self = Self {
            entries: BTreeMap::new(),
            merge_fns: BTreeMap::new(),
        };
        store.register(AttributeKind::PropertyDefaults, keep_first);
        store
    }

    /// Register the merge policy for an attribute kind, replacing any
    /// previous registration.
    pub fn register(&mut self, kind: AttributeKind, merge: MergeFn) {
        self.merge_fns.insert(kind, merge);
    }

    /// Attach an attribute to a node. If the node already carries one of the
    /// same kind, the registered merge policy decides what survives;
    /// an unregistered kind keeps the incoming attribute.
    pub fn attach(&mut self, id: TypeId, attribute: Attribute) {
        let kind: AttributeKind = attribute.kind();
        let merged: Attribute = match self.entries.remove(&(id, kind)) {
            Some(existing) => match self.merge_fns.get(&kind) {
                Some(merge) => merge(existing, attribute),
                None => attribute,
            },
            None => attribute,
        };
        self.entries.insert((id, kind), merged);
    }

    pub fn get(&self, id: TypeId, kind: AttributeKind) -> Option<&Attribute> {
        self.entries.get(&(id, kind))
    }

    /// Typed accessor for the property-defaults channel.
    pub fn property_defaults(&self, id: TypeId) -> Option<&BTreeMap<String, Value>> {
        match self.get(id, AttributeKind::PropertyDefaults)? {
            Attribute::PropertyDefaults(values) => Some(values),
        }
    }
}

impl Default for AttributeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract per-property `default` values from one schema object.
///
/// Produces nothing for schemas without `properties` and nothing when no
/// declared property carries a `default` key. Non-object property schemas
/// are silently skipped. `"default": null` counts as present.
pub fn property_defaults_producer(schema: &JsonSchema) -> Option<Attribute> {
    let properties = schema.properties.as_ref()?;
    let mut values: BTreeMap<String, Value> = BTreeMap::new();
    for (name, property) in properties {
        let PropertySchema::Schema(property_schema) = property else {
            continue;
        };
        if let Some(default) = property_schema.default.value() {
            values.insert(name.clone(), default.clone());
        }
    }
    if values.is_empty() {
        None
    } else {
        Some(Attribute::PropertyDefaults(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(json: &str) -> JsonSchema {
        serde_json::from_str(json).expect("valid schema json")
    }

    fn defaults_of(attribute: &Attribute) -> &BTreeMap<String, Value> {
        match attribute {
            Attribute::PropertyDefaults(values) => values,
        }
    }

    #[test]
    fn producer_yields_nothing_without_properties() {
        let no_properties: JsonSchema = schema(r#"{ "type": "object" }"#);
        assert!(property_defaults_producer(&no_properties).is_none());
    }

    #[test]
    fn producer_yields_nothing_without_defaults() {
        let no_defaults: JsonSchema = schema(
            r#"{
                "type": "object",
                "properties": { "x": { "type": "string" } }
            }"#,
        );
        assert!(property_defaults_producer(&no_defaults).is_none());
    }

    #[test]
    fn producer_collects_defaults_and_skips_non_object_schemas() {
        let mixed: JsonSchema = schema(
            r#"{
                "type": "object",
                "properties": {
                    "a": { "type": "integer", "default": 7 },
                    "b": true,
                    "c": { "type": "string" },
                    "d": { "type": "string", "default": null }
                }
            }"#,
        );
        let attribute: Attribute =
            property_defaults_producer(&mixed).expect("defaults present");
        let values: &BTreeMap<String, Value> = defaults_of(&attribute);
        assert_eq!(values.len(), 2);
        assert_eq!(values.get("a"), Some(&Value::from(7)));
        assert_eq!(
            values.get("d"),
            Some(&Value::Null),
            "default null is a present default"
        );
        assert!(!values.contains_key("b"), "boolean schemas are skipped");
    }

    #[test]
    fn attach_keeps_first_source_on_merge() {
        let first: JsonSchema = schema(
            r#"{
                "type": "object",
                "properties": { "x": { "type": "integer", "default": 1 } }
            }"#,
        );
        let second: JsonSchema = schema(
            r#"{
                "type": "object",
                "properties": { "x": { "type": "integer", "default": 2 } }
            }"#,
        );
        let id: TypeId = {
            // Any stable id works; take one from a real build.
            let mut store: AttributeStore = AttributeStore::new();
            let (_, root) = crate::graph::GraphBuilder::build(
                &schema(r#"{ "type": "object", "properties": {} }"#),
                &[],
                &mut store,
            )
            .expect("graph should build");
            root
        };

        let mut store: AttributeStore = AttributeStore::new();
        store.attach(
            id,
            property_defaults_producer(&first).expect("defaults present"),
        );
        store.attach(
            id,
            property_defaults_producer(&second).expect("defaults present"),
        );

        let values: &BTreeMap<String, Value> =
            store.property_defaults(id).expect("attribute attached");
        assert_eq!(
            values.get("x"),
            Some(&Value::from(1)),
            "the first source's defaults must survive unification"
        );
    }

    #[test]
    fn register_replaces_the_merge_policy() {
        fn keep_last(_existing: Attribute, incoming: Attribute) -> Attribute {
            incoming
        }

        let mut store: AttributeStore = AttributeStore::new();
        store.register(AttributeKind::PropertyDefaults, keep_last);

        let id: TypeId = {
            let mut scratch: AttributeStore = AttributeStore::new();
            let (_, root) = crate::graph::GraphBuilder::build(
                &schema(r#"{ "type": "object", "properties": {} }"#),
                &[],
                &mut scratch,
            )
            .expect("graph should build");
            root
        };

        let one: BTreeMap<String, Value> =
            [("x".to_string(), Value::from(1))].into_iter().collect();
        let two: BTreeMap<String, Value> =
            [("x".to_string(), Value::from(2))].into_iter().collect();
        store.attach(id, Attribute::PropertyDefaults(one));
        store.attach(id, Attribute::PropertyDefaults(two));

        let values: &BTreeMap<String, Value> =
            store.property_defaults(id).expect("attribute attached");
        assert_eq!(values.get("x"), Some(&Value::from(2)));
    }
}
