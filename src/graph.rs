use crate::attributes::{AttributeProducer, AttributeStore};
use crate::error::CodeGenError;
use crate::schema::{JsonSchema, PropertySchema, TypeField};
use heck::ToUpperCamelCase;
use std::collections::BTreeMap;

/// Stable identity of a type-graph node (arena index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeId(usize);

/// Kinds of primitive nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Any,
    Null,
    Bool,
    Integer,
    Double,
    String,
}

impl PrimitiveKind {
    pub const fn kind_name(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::String => "string",
        }
    }
}

/// One property of a class node.
#[derive(Debug)]
pub struct ClassProperty {
    /// The JSON property name, as spelled in the schema.
    pub json_name: String,
    pub type_id: TypeId,
    pub required: bool,
}

/// Closed set of type-graph node variants. The renderer matches these
/// exhaustively; there is no runtime downcasting.
#[derive(Debug)]
pub enum TypeNode {
    Primitive(PrimitiveKind),
    Array {
        items: TypeId,
    },
    Enum {
        name: String,
        /// Declared string cases, in declaration order.
        cases: Vec<String>,
    },
    Union {
        /// Members in declaration order of the schema's `type` list.
        members: Vec<TypeId>,
    },
    Class {
        name: String,
        properties: Vec<ClassProperty>,
    },
}

impl TypeNode {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(kind) => kind.kind_name(),
            Self::Array { .. } => "array",
            Self::Enum { .. } => "enum",
            Self::Union { .. } => "union",
            Self::Class { .. } => "class",
        }
    }
}

/// Arena of type nodes. Built once during ingestion, then read-only; the
/// only per-node mutation after conversion happens in the attribute store,
/// never in the graph itself.
#[derive(Debug)]
pub struct TypeGraph {
    nodes: Vec<TypeNode>,
}

impl TypeGraph {
    pub fn node(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (TypeId(i), n))
    }

    /// Follow transparent wrappers (single-member unions, two-member unions
    /// with a null primitive) to the concrete target type used for
    /// default-formatting decisions. Idempotent; bounded by node count so
    /// chained indirection terminates.
    pub fn follow_target_type(&self, id: TypeId) -> TypeId {
        let mut current: TypeId = id;
        for _ in 0..self.nodes.len() {
            let next: TypeId = match self.node(current) {
                TypeNode::Union { members } if members.len() == 1 => members[0],
                TypeNode::Union { members } if members.len() == 2 => {
                    let null_position: Option<usize> = members.iter().position(|&m| {
                        matches!(self.node(m), TypeNode::Primitive(PrimitiveKind::Null))
                    });
                    match null_position {
                        Some(i) => members[1 - i],
                        None => break,
                    }
                }
                _ => break,
            };
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    /// The element kind name to use as a generic list parameter.
    ///
    /// Primitive: its own kind name. Array: its items' kind name. Union: the
    /// items' kind name of the first array member, in declaration order.
    /// Partial by design; callers must tolerate `None` for unions with no
    /// array member.
    pub fn array_element_type(&self, id: TypeId) -> Option<&'static str> {
        match self.node(id) {
            TypeNode::Primitive(kind) => Some(kind.kind_name()),
            TypeNode::Array { items } => Some(self.node(*items).kind_name()),
            TypeNode::Union { members } => members.iter().find_map(|&m| {
                if let TypeNode::Array { items } = self.node(m) {
                    Some(self.node(*items).kind_name())
                } else {
                    None
                }
            }),
            _ => None,
        }
    }
}

/// Convert a schema title or property key to a C# type identifier
/// (`PascalCase`). Digit-leading results get a "The" prefix; enum members
/// use a different guard (see `member_ident` in the C# emitter).
pub fn type_ident(raw: &str) -> String {
    let name: String = raw.to_upper_camel_case();
    if name.is_empty() {
        return "Type".to_string();
    }
    if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("The{name}")
    } else {
        name
    }
}

/// Extract string enum cases: all `enum` values must be strings, and there
/// must be at least one. Returns `None` otherwise (the schema then converts
/// by its `type`).
fn string_enum_cases(schema: &JsonSchema) -> Option<Vec<String>> {
    let values: &Vec<serde_json::Value> = schema.r#enum.as_ref()?;
    if values.is_empty() {
        return None;
    }
    values
        .iter()
        .map(|v| v.as_str().map(String::from))
        .collect()
}

/// Converts one schema document into a `TypeGraph`.
///
/// Structurally identical classes and enums are interned onto a single node
/// (annotations such as `title` and `default` are excluded from the
/// structural key), which is what unifies repeated schema objects. Attribute
/// producers run once per schema-object occurrence, so a second occurrence
/// of an already-interned class still reaches the attribute store and
/// triggers its merge policy.
pub struct GraphBuilder<'a> {
    nodes: Vec<TypeNode>,
    producers: &'a [AttributeProducer],
    primitives: BTreeMap<PrimitiveKind, TypeId>,
    interned: BTreeMap<String, TypeId>,
    name_counts: BTreeMap<String, usize>,
}

impl<'a> GraphBuilder<'a> {
    /// Build the graph for one schema document. The root schema must have
    /// `type: "object"`. Returns the graph and the root class node.
    pub fn build(
        schema: &JsonSchema,
        producers: &'a [AttributeProducer],
        store: &mut AttributeStore,
    ) -> Result<(TypeGraph, TypeId), CodeGenError> {
        if !matches!(schema.r#type, Some(TypeField::One(ref t)) if t == "object") {
            return Err(CodeGenError::GenericError(
                "Root schema must have type \"object\"".to_string(),
            ));
        }

        let mut builder: GraphBuilder<'a> = GraphBuilder {
            nodes: Vec::new(),
            producers,
            primitives: BTreeMap::new(),
            interned: BTreeMap::new(),
            name_counts: BTreeMap::new(),
        };
        let root: TypeId = builder.convert(schema, "Root", store);
        let graph: TypeGraph = TypeGraph {
            nodes: builder.nodes,
        };
        Ok((graph, root))
    }

    fn convert(&mut self, schema: &JsonSchema, fallback: &str, store: &mut AttributeStore) -> TypeId {
        if let Some(cases) = string_enum_cases(schema) {
            return self.intern_enum(schema, fallback, cases);
        }
        match &schema.r#type {
            Some(TypeField::Many(names)) => {
                let members: Vec<TypeId> = names
                    .iter()
                    .map(|name| self.convert_named(schema, name, fallback, store))
                    .collect();
                self.intern_union(members)
            }
            Some(TypeField::One(name)) => self.convert_named(schema, name, fallback, store),
            None => {
                if schema.properties.is_some() {
                    self.convert_class(schema, fallback, store)
                } else if schema.items.is_some() {
                    self.convert_array(schema, fallback, store)
                } else {
                    self.primitive(PrimitiveKind::Any)
                }
            }
        }
    }

    fn convert_named(
        &mut self,
        schema: &JsonSchema,
        type_name: &str,
        fallback: &str,
        store: &mut AttributeStore,
    ) -> TypeId {
        match type_name {
            "object" => self.convert_class(schema, fallback, store),
            "array" => self.convert_array(schema, fallback, store),
            "null" => self.primitive(PrimitiveKind::Null),
            "boolean" => self.primitive(PrimitiveKind::Bool),
            "integer" => self.primitive(PrimitiveKind::Integer),
            "number" => self.primitive(PrimitiveKind::Double),
            "string" => self.primitive(PrimitiveKind::String),
            _ => self.primitive(PrimitiveKind::Any),
        }
    }

    fn convert_array(
        &mut self,
        schema: &JsonSchema,
        fallback: &str,
        store: &mut AttributeStore,
    ) -> TypeId {
        let items: TypeId = match &schema.items {
            Some(items_schema) => self.convert(items_schema, fallback, store),
            None => self.primitive(PrimitiveKind::Any),
        };
        let key: String = format!("array({})", items.0);
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id: TypeId = self.push(TypeNode::Array { items });
        self.interned.insert(key, id);
        id
    }

    fn convert_class(
        &mut self,
        schema: &JsonSchema,
        fallback: &str,
        store: &mut AttributeStore,
    ) -> TypeId {
        // Children first, so the structural key is over already-interned ids.
        let mut class_properties: Vec<ClassProperty> = Vec::new();
        if let Some(ref properties) = schema.properties {
            for (key, property) in properties {
                let PropertySchema::Schema(property_schema) = property else {
                    continue;
                };
                let type_id: TypeId = self.convert(property_schema, key, store);
                let required: bool = schema.required.as_ref().is_some_and(|r| r.contains(key));
                class_properties.push(ClassProperty {
                    json_name: key.clone(),
                    type_id,
                    required,
                });
            }
        }

        let key_parts: Vec<String> = class_properties
            .iter()
            .map(|p| format!("{}:{}:{}", p.json_name, p.type_id.0, p.required))
            .collect();
        let key: String = format!("class({})", key_parts.join(","));

        let id: TypeId = match self.interned.get(&key) {
            Some(&id) => id,
            None => {
                let name: String = self.claim_name(schema.title.as_deref().unwrap_or(fallback));
                let id: TypeId = self.push(TypeNode::Class {
                    name,
                    properties: class_properties,
                });
                self.interned.insert(key, id);
                id
            }
        };

        // Every occurrence feeds the attribute store; repeated occurrences of
        // the same structural class go through the per-kind merge policy.
        for producer in self.producers {
            if let Some(attribute) = producer(schema) {
                store.attach(id, attribute);
            }
        }
        id
    }

    fn intern_enum(&mut self, schema: &JsonSchema, fallback: &str, cases: Vec<String>) -> TypeId {
        let key: String = format!("enum({})", serde_json::Value::from(cases.clone()));
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let name: String = self.claim_name(schema.title.as_deref().unwrap_or(fallback));
        let id: TypeId = self.push(TypeNode::Enum { name, cases });
        self.interned.insert(key, id);
        id
    }

    fn intern_union(&mut self, members: Vec<TypeId>) -> TypeId {
        let key_parts: Vec<String> = members.iter().map(|m| m.0.to_string()).collect();
        let key: String = format!("union({})", key_parts.join(","));
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id: TypeId = self.push(TypeNode::Union { members });
        self.interned.insert(key, id);
        id
    }

    fn primitive(&mut self, kind: PrimitiveKind) -> TypeId {
        if let Some(&id) = self.primitives.get(&kind) {
            return id;
        }
        let id: TypeId = self.push(TypeNode::Primitive(kind));
        self.primitives.insert(kind, id);
        id
    }

    /// Claim a type name, suffixing duplicates numerically (`Name`, `Name2`,
    /// `Name3`, ...). Claiming happens in depth-first conversion order, so
    /// names are deterministic for a given document.
    fn claim_name(&mut self, raw: &str) -> String {
        let base: String = type_ident(raw);
        let count: &mut usize = self.name_counts.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            base
        } else {
            format!("{base}{count}")
        }
    }

    fn push(&mut self, node: TypeNode) -> TypeId {
        let id: TypeId = TypeId(self.nodes.len());
        self.nodes.push(node);
        id
    }
}
