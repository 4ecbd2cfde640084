use crate::attributes::{AttributeProducer, AttributeStore, property_defaults_producer};
use crate::error::CodeGenError;
use crate::graph::{
    ClassProperty, GraphBuilder, PrimitiveKind, TypeGraph, TypeId, TypeNode, type_ident,
};
use crate::schema::JsonSchema;
use crate::settings::GenerateSettings;
use heck::ToUpperCamelCase;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

/// Every generated class is rooted under this type, regardless of schema
/// content.
const BASE_CLASS: &str = "GameObject";

/// Pluggable seam for appending a default-value initializer to a property's
/// base definition. `Ok(None)` leaves the base definition unchanged;
/// `Ok(Some(text))` renders as `<base definition> = <text>;`.
pub trait DefaultLiteralResolver {
    /// # Errors
    ///
    /// Returns `CodeGenError::StringCases` when a default needs an enum
    /// member lookup and the resolved type has no matching case.
    fn resolve_default(
        &self,
        graph: &TypeGraph,
        class_id: TypeId,
        property: &ClassProperty,
        type_text: &str,
        settings: &GenerateSettings,
    ) -> Result<Option<String>, CodeGenError>;
}

/// Resolver backed by the attribute store's property-defaults channel.
pub struct StoreDefaults<'a> {
    store: &'a AttributeStore,
}

impl<'a> StoreDefaults<'a> {
    pub const fn new(store: &'a AttributeStore) -> Self {
        Self { store }
    }
}

impl DefaultLiteralResolver for StoreDefaults<'_> {
    fn resolve_default(
        &self,
        graph: &TypeGraph,
        class_id: TypeId,
        property: &ClassProperty,
        type_text: &str,
        settings: &GenerateSettings,
    ) -> Result<Option<String>, CodeGenError> {
        let Some(defaults) = self.store.property_defaults(class_id) else {
            return Ok(None);
        };
        let Some(value) = defaults.get(&property.json_name) else {
            return Ok(None);
        };
        let target: TypeId = graph.follow_target_type(property.type_id);

        if let Value::Array(elements) = value {
            // A singleton default array stands in for a scalar default: emit
            // the sole element's own literal, brackets stripped, with no
            // numeric coercion.
            if let [sole] = elements.as_slice() {
                return Ok(Some(sole.to_string()));
            }
            let rendered: Vec<String> = elements.iter().map(float_coerced_json).collect();
            let joined: String = rendered.join(",");
            let text: String = if settings.use_list {
                let element: &str = graph.array_element_type(target).unwrap_or_default();
                format!("new List<{element}> {{{joined}}}")
            } else {
                format!("new[] {{{joined}}}")
            };
            return Ok(Some(text));
        }

        if matches!(graph.node(target), TypeNode::Enum { .. }) {
            let Some(case) = value.as_str() else {
                return Err(CodeGenError::StringCases {
                    kind: graph.node(target).kind_name().to_string(),
                });
            };
            return Ok(Some(string_case_value(graph, target, case)?));
        }

        // A boolean default, either value, means "construct the property's
        // own type"; the truth value itself never reaches the output.
        if value.is_boolean() {
            return Ok(Some(format!("new {type_text}()")));
        }

        Ok(Some(value.to_string()))
    }
}

/// JSON text of a value with every whole number forced to carry a decimal
/// point (`3` -> `3.0`), recursively through nested arrays and objects.
/// Originally fractional numbers are left untouched.
fn float_coerced_json(value: &Value) -> String {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                format!("{i}.0")
            } else if let Some(u) = n.as_u64() {
                format!("{u}.0")
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.1}"),
                    _ => n.to_string(),
                }
            }
        }
        Value::Array(elements) => {
            let inner: Vec<String> = elements.iter().map(float_coerced_json).collect();
            format!("[{}]", inner.join(","))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}:{}",
                        Value::String(k.clone()),
                        float_coerced_json(v)
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(","))
        }
        other => other.to_string(),
    }
}

/// Literal for a string-cased default: a quoted string for the string
/// primitive, a qualified member reference for an enum.
///
/// # Errors
///
/// Returns `CodeGenError::StringCases` for any other kind, and for an enum
/// default string that matches no declared case.
fn string_case_value(graph: &TypeGraph, id: TypeId, case: &str) -> Result<String, CodeGenError> {
    match graph.node(id) {
        TypeNode::Primitive(PrimitiveKind::String) => {
            Ok(Value::String(case.to_string()).to_string())
        }
        TypeNode::Enum { name, cases } => {
            let members: Vec<(String, String)> = enum_member_names(cases);
            members
                .iter()
                .find(|(_, json_value)| json_value == case)
                .map(|(member, _)| format!("{name}.{member}"))
                .ok_or_else(|| CodeGenError::StringCases {
                    kind: "enum".to_string(),
                })
        }
        node => Err(CodeGenError::StringCases {
            kind: node.kind_name().to_string(),
        }),
    }
}

/// Convert a JSON enum case to a C# member identifier (`PascalCase`).
/// Prefixes with `E` if the result is empty or starts with a digit: members
/// take the short `E` guard (`"7"` -> `E7`) where type names take the `The`
/// prefix (see `type_ident`).
fn member_ident(case: &str) -> String {
    let base: String = case.to_upper_camel_case();
    if base.is_empty() || base.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("E{base}")
    } else {
        base
    }
}

/// Build member names from declared enum cases: declaration order,
/// deduplicated preserving the first occurrence, base-name collisions
/// suffixed `_0`, `_1`, ... Returns `(member_name, json_value)` pairs.
fn enum_member_names(cases: &[String]) -> Vec<(String, String)> {
    let mut unique: Vec<String> = Vec::new();
    for case in cases {
        if !unique.contains(case) {
            unique.push(case.clone());
        }
    }

    let base_names: Vec<String> = unique.iter().map(|c| member_ident(c)).collect();
    let mut name_counts: BTreeMap<String, usize> = BTreeMap::new();
    for base in &base_names {
        *name_counts.entry(base.clone()).or_insert(0) += 1;
    }

    let mut result: Vec<(String, String)> = Vec::with_capacity(unique.len());
    let mut name_indices: BTreeMap<String, usize> = BTreeMap::new();
    for (json_value, base_name) in unique.iter().zip(base_names.iter()) {
        let member: String = if *name_counts.get(base_name).unwrap_or(&0) > 1 {
            let idx: usize = *name_indices.get(base_name).unwrap_or(&0);
            name_indices.insert(base_name.clone(), idx + 1);
            format!("{base_name}_{idx}")
        } else {
            base_name.clone()
        };
        result.push((member, json_value.clone()));
    }
    result
}

/// C# type text for a node. Callers pass the already-resolved target when
/// transparent wrappers should disappear; a union that survives resolution
/// renders as `object`.
fn type_text(graph: &TypeGraph, id: TypeId, settings: &GenerateSettings) -> String {
    match graph.node(id) {
        TypeNode::Primitive(PrimitiveKind::Any | PrimitiveKind::Null) => "object".to_string(),
        TypeNode::Primitive(PrimitiveKind::Bool) => "bool".to_string(),
        TypeNode::Primitive(PrimitiveKind::Integer) => "long".to_string(),
        TypeNode::Primitive(PrimitiveKind::Double) => "double".to_string(),
        TypeNode::Primitive(PrimitiveKind::String) => "string".to_string(),
        TypeNode::Array { items } => {
            let element: String = type_text(graph, graph.follow_target_type(*items), settings);
            if settings.use_list {
                format!("List<{element}>")
            } else {
                format!("{element}[]")
            }
        }
        TypeNode::Enum { name, .. } | TypeNode::Class { name, .. } => name.clone(),
        TypeNode::Union { .. } => "object".to_string(),
    }
}

/// True for C# value types, which take a `?` suffix when nullable.
const fn is_value_type(node: &TypeNode) -> bool {
    matches!(
        node,
        TypeNode::Primitive(
            PrimitiveKind::Bool | PrimitiveKind::Integer | PrimitiveKind::Double
        ) | TypeNode::Enum { .. }
    )
}

fn union_has_null(graph: &TypeGraph, id: TypeId) -> bool {
    match graph.node(id) {
        TypeNode::Union { members } => members
            .iter()
            .any(|&m| matches!(graph.node(m), TypeNode::Primitive(PrimitiveKind::Null))),
        _ => false,
    }
}

/// Full type text of a property, `?`-suffixed for optional (or
/// null-unioned) value types.
fn property_type_text(
    graph: &TypeGraph,
    property: &ClassProperty,
    settings: &GenerateSettings,
) -> String {
    let target: TypeId = graph.follow_target_type(property.type_id);
    let through_null: bool = target != property.type_id && union_has_null(graph, property.type_id);
    let text: String = type_text(graph, target, settings);
    if (!property.required || through_null) && is_value_type(graph.node(target)) {
        format!("{text}?")
    } else {
        text
    }
}

/// Determine class emission order: dependencies before their dependents.
fn emission_order(graph: &TypeGraph, root: TypeId) -> Vec<TypeId> {
    fn visit(graph: &TypeGraph, id: TypeId, order: &mut Vec<TypeId>, visited: &mut BTreeSet<TypeId>) {
        if !visited.insert(id) {
            return;
        }
        match graph.node(id) {
            TypeNode::Class { properties, .. } => {
                for property in properties {
                    visit(graph, property.type_id, order, visited);
                }
                order.push(id);
            }
            TypeNode::Array { items } => visit(graph, *items, order, visited),
            TypeNode::Union { members } => {
                for &member in members {
                    visit(graph, member, order, visited);
                }
            }
            TypeNode::Primitive(_) | TypeNode::Enum { .. } => {}
        }
    }

    let mut order: Vec<TypeId> = Vec::new();
    let mut visited: BTreeSet<TypeId> = BTreeSet::new();
    visit(graph, root, &mut order, &mut visited);

    // Classes unreachable from the root (shouldn't happen for one document,
    // but be safe).
    for (id, node) in graph.iter() {
        if matches!(node, TypeNode::Class { .. }) && !visited.contains(&id) {
            visit(graph, id, &mut order, &mut visited);
        }
    }

    order
}

fn emit_enum<W: Write>(
    writer: &mut W,
    name: &str,
    cases: &[String],
) -> std::io::Result<()> {
    let members: Vec<(String, String)> = enum_member_names(cases);
    let names: Vec<String> = members.into_iter().map(|(member, _)| member).collect();
    writeln!(writer, "    public enum {name} {{ {} }};", names.join(", "))
}

fn emit_class<W: Write>(
    writer: &mut W,
    graph: &TypeGraph,
    id: TypeId,
    name: &str,
    properties: &[ClassProperty],
    resolver: &dyn DefaultLiteralResolver,
    settings: &GenerateSettings,
) -> Result<(), CodeGenError> {
    writeln!(writer, "    public partial class {name} : {BASE_CLASS}")?;
    writeln!(writer, "    {{")?;
    for (i, property) in properties.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(
            writer,
            "        [JsonProperty({})]",
            Value::String(property.json_name.clone())
        )?;
        let text: String = property_type_text(graph, property, settings);
        let property_name: String = type_ident(&property.json_name);
        let base: String = format!("public {text} {property_name} {{ get; set; }}");
        match resolver.resolve_default(graph, id, property, &text, settings)? {
            Some(literal) => writeln!(writer, "        {base} = {literal};")?,
            None => writeln!(writer, "        {base}")?,
        }
    }
    writeln!(writer, "    }}")?;
    Ok(())
}

/// Render the whole artifact for an already-built graph. The output is
/// buffered and written in one piece, so a rendering error never leaves
/// partial output behind.
pub fn render<W: Write>(
    graph: &TypeGraph,
    root: TypeId,
    resolver: &dyn DefaultLiteralResolver,
    settings: &GenerateSettings,
    writer: &mut W,
) -> Result<(), CodeGenError> {
    // The namespace body renders first: whether the generic-collections
    // using is needed depends on the rendered text, since `new List<..>`
    // initializers can appear on properties of any type, not just
    // array-typed ones.
    let mut body: Vec<u8> = Vec::new();

    let mut enums: Vec<(&String, &Vec<String>)> = graph
        .iter()
        .filter_map(|(_, node)| match node {
            TypeNode::Enum { name, cases } => Some((name, cases)),
            _ => None,
        })
        .collect();
    enums.sort_by(|a, b| a.0.cmp(b.0));

    let mut first: bool = true;
    for (name, cases) in enums {
        if !first {
            writeln!(body)?;
        }
        first = false;
        emit_enum(&mut body, name, cases)?;
    }

    for id in emission_order(graph, root) {
        let TypeNode::Class { name, properties } = graph.node(id) else {
            continue;
        };
        if !first {
            writeln!(body)?;
        }
        first = false;
        emit_class(&mut body, graph, id, name, properties, resolver, settings)?;
    }

    let mut buffer: Vec<u8> = Vec::new();
    writeln!(buffer, "// Generated by json-schema-cs. Do not edit manually.")?;
    writeln!(buffer)?;
    let needs_generic_using: bool = body.windows(5).any(|window| window == b"List<");
    if needs_generic_using {
        writeln!(buffer, "using System.Collections.Generic;")?;
    }
    writeln!(buffer, "using Newtonsoft.Json;")?;
    writeln!(buffer)?;
    writeln!(buffer, "namespace {}", settings.namespace)?;
    writeln!(buffer, "{{")?;
    buffer.extend_from_slice(&body);
    writeln!(buffer, "}}")?;
    writer.write_all(&buffer)?;
    Ok(())
}

/// Generate C# model classes from a JSON Schema string and write to
/// `writer`. The full pipeline: parse, build the type graph with the
/// property-defaults producer attached, then render with the store-backed
/// default resolver.
pub fn generate_to_writer<W: Write>(
    schema_json: &str,
    writer: &mut W,
    settings: &GenerateSettings,
) -> Result<(), CodeGenError> {
    let schema: JsonSchema = serde_json::from_str(schema_json)?;
    let producers: &[AttributeProducer] = &[property_defaults_producer];
    let mut store: AttributeStore = AttributeStore::new();
    let (graph, root) = GraphBuilder::build(&schema, producers, &mut store)?;
    let resolver: StoreDefaults<'_> = StoreDefaults::new(&store);
    render(&graph, root, &resolver, settings, writer)
}
