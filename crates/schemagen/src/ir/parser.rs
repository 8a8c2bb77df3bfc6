//! JSON-Schema → IR parser (`spec.md` §4.1).
//!
//! Operates directly on `oas3::spec::ObjectSchema` — the shape every
//! component schema, property, array-item, and composition member already
//! comes in as once the orchestrator has resolved it out of the document.
//! `$ref` members are read from their `ObjectOrReference::Ref` form without
//! ever calling `.resolve`, so a `$ref` always produces `IrType::Reference`
//! rather than inlining the referent (rule 1).

use oas3::spec::{ObjectOrReference, ObjectSchema, Schema, SchemaType, SchemaTypeSet};

use super::{ArrayConstraints, IrType, Literal, NumericConstraints, ObjectField, StringConstraints};
use crate::warning::{Warning, WarningKind};

const MAX_DEPTH: usize = 30;

pub(crate) struct ParseCtx<'a> {
  pub(crate) path: String,
  pub(crate) warnings: &'a mut Vec<Warning>,
  depth: usize,
}

impl<'a> ParseCtx<'a> {
  pub(crate) fn new(path: impl Into<String>, warnings: &'a mut Vec<Warning>) -> Self {
    Self { path: path.into(), warnings, depth: 0 }
  }

  fn child(&mut self, segment: &str) -> ParseCtx<'_> {
    ParseCtx { path: format!("{}.{segment}", self.path), warnings: self.warnings, depth: self.depth + 1 }
  }
}

/// Extracts the bare name from a `#/components/schemas/Name`-shaped ref path.
pub(crate) fn ref_name(ref_path: &str) -> String {
  ref_path.rsplit('/').next().unwrap_or(ref_path).to_string()
}

fn ref_or_object(obj_ref: &ObjectOrReference<ObjectSchema>, ctx: &mut ParseCtx) -> IrType {
  match obj_ref {
    ObjectOrReference::Ref { ref_path, .. } => IrType::Reference(ref_name(ref_path)),
    ObjectOrReference::Object(schema) => parse(schema, ctx),
  }
}

/// Entry point for schemas reached outside the component-schema context
/// (request bodies, response bodies): same rules as [`parse`], just without
/// a pre-existing [`ParseCtx`] to share.
pub(crate) fn parse_body_schema(obj_ref: &ObjectOrReference<ObjectSchema>, path: &str, warnings: &mut Vec<Warning>) -> IrType {
  let mut ctx = ParseCtx::new(path, warnings);
  ref_or_object(obj_ref, &mut ctx)
}

fn schema_from_boxed(items: &Schema, ctx: &mut ParseCtx) -> IrType {
  match items {
    Schema::Object(obj_ref) => ref_or_object(obj_ref, ctx),
    Schema::Boolean(_) => IrType::Unknown,
  }
}

/// Parses one `ObjectSchema` into an `IrType`, pushing any warnings onto
/// `ctx.warnings`. This is the entry point the orchestrator calls once per
/// top-level named schema (and the parser calls recursively on its own
/// children, via `parse`).
pub(crate) fn parse(schema: &ObjectSchema, ctx: &mut ParseCtx) -> IrType {
  if ctx.depth >= MAX_DEPTH {
    ctx.warnings.push(Warning { path: ctx.path.clone(), kind: WarningKind::DepthLimitReached, message: "recursion depth limit reached while parsing schema".to_string() });
    return IrType::Unknown;
  }

  // Rule 2: `nullable: true` (legacy OAS 3.0) wraps whatever the base type
  // parses to in `Option`. The `oas3` 0.20 / OpenAPI 3.1 dialect instead
  // expresses this as `type: [X, "null"]`, handled inside `dispatch_type`.
  if schema.nullable == Some(true) {
    let mut stripped = schema.clone();
    stripped.nullable = None;
    let mut child = ctx.child("nullable");
    return IrType::option(parse(&stripped, &mut child));
  }

  if !schema.enum_values.is_empty() && schema.schema_type.is_none() {
    return parse_enum(schema);
  }

  if let Some(ref schema_type) = schema.schema_type {
    return dispatch_type(schema_type, schema, ctx);
  }

  if !schema.all_of.is_empty() {
    return IrType::Intersection(parse_composition(&schema.all_of, ctx, "allOf"));
  }
  if !schema.one_of.is_empty() {
    return IrType::Union(parse_composition(&schema.one_of, ctx, "oneOf"));
  }
  if !schema.any_of.is_empty() {
    return IrType::Union(parse_composition(&schema.any_of, ctx, "anyOf"));
  }

  IrType::Unknown
}

fn parse_composition(members: &[ObjectOrReference<ObjectSchema>], ctx: &mut ParseCtx, keyword: &str) -> Vec<IrType> {
  members
    .iter()
    .enumerate()
    .map(|(i, member)| {
      let mut child = ctx.child(&format!("{keyword}[{i}]"));
      ref_or_object(member, &mut child)
    })
    .collect()
}

fn parse_enum(schema: &ObjectSchema) -> IrType {
  let members = schema
    .enum_values
    .iter()
    .map(|v| IrType::Literal(literal_from_value(v)))
    .collect();
  IrType::Union(members)
}

fn literal_from_value(v: &serde_json::Value) -> Literal {
  match v {
    serde_json::Value::String(s) => Literal::Str(s.clone()),
    serde_json::Value::Number(n) => Literal::Number(n.clone()),
    serde_json::Value::Bool(b) => Literal::Boolean(*b),
    _ => Literal::Null,
  }
}

fn dispatch_type(schema_type: &SchemaTypeSet, schema: &ObjectSchema, ctx: &mut ParseCtx) -> IrType {
  match schema_type {
    SchemaTypeSet::Single(single) => dispatch_single(*single, schema, ctx),
    SchemaTypeSet::Multiple(types) => dispatch_multiple(types, schema, ctx),
  }
}

/// `type: [X, "null", ...]`: the OAS 3.1 spelling of nullability (rule 2's
/// sibling case). Exactly one non-null type alongside `null` wraps in
/// `Option`; more than one degrades to `Option<Union<...>>` so no
/// information is silently dropped.
fn dispatch_multiple(types: &[SchemaType], schema: &ObjectSchema, ctx: &mut ParseCtx) -> IrType {
  let non_null: Vec<_> = types.iter().copied().filter(|t| *t != SchemaType::Null).collect();
  let has_null = non_null.len() != types.len();

  let base = if non_null.len() == 1 {
    dispatch_single(non_null[0], schema, ctx)
  } else if non_null.is_empty() {
    IrType::Null
  } else {
    IrType::Union(non_null.into_iter().map(|t| dispatch_single(t, schema, ctx)).collect())
  };

  if has_null { IrType::option(base) } else { base }
}

fn dispatch_single(schema_type: SchemaType, schema: &ObjectSchema, ctx: &mut ParseCtx) -> IrType {
  match schema_type {
    SchemaType::String => IrType::String(StringConstraints {
      min_len: schema.min_length,
      max_len: schema.max_length,
      pattern: schema.pattern.clone(),
    }),
    SchemaType::Number => IrType::Number(numeric_constraints(schema)),
    SchemaType::Integer => IrType::Integer(numeric_constraints(schema)),
    SchemaType::Boolean => IrType::Boolean,
    SchemaType::Null => IrType::Null,
    SchemaType::Array => parse_array(schema, ctx),
    SchemaType::Object => parse_object(schema, ctx),
  }
}

fn numeric_constraints(schema: &ObjectSchema) -> NumericConstraints {
  NumericConstraints {
    min: schema.minimum.as_ref().and_then(serde_json::Number::as_f64),
    max: schema.maximum.as_ref().and_then(serde_json::Number::as_f64),
    multiple_of: schema.multiple_of.as_ref().and_then(serde_json::Number::as_f64),
  }
}

fn parse_array(schema: &ObjectSchema, ctx: &mut ParseCtx) -> IrType {
  let mut child = ctx.child("items");
  let items = match schema.items.as_deref() {
    Some(items_schema) => schema_from_boxed(items_schema, &mut child),
    None => IrType::Unknown,
  };
  IrType::Array {
    items: Box::new(items),
    constraints: ArrayConstraints {
      min_items: schema.min_items,
      max_items: schema.max_items,
      unique: schema.unique_items.unwrap_or(false),
    },
  }
}

fn parse_object(schema: &ObjectSchema, ctx: &mut ParseCtx) -> IrType {
  if !schema.all_of.is_empty() {
    return IrType::Intersection(parse_composition(&schema.all_of, ctx, "allOf"));
  }

  let required: std::collections::HashSet<&str> = schema.required.iter().map(String::as_str).collect();
  let properties = schema
    .properties
    .iter()
    .map(|(name, prop_ref)| {
      let mut child = ctx.child(name);
      let ty = ref_or_object(prop_ref, &mut child);
      let description = match prop_ref {
        ObjectOrReference::Object(o) => o.description.clone(),
        ObjectOrReference::Ref { .. } => None,
      };
      let deprecated = matches!(prop_ref, ObjectOrReference::Object(o) if o.deprecated == Some(true));
      ObjectField { name: name.clone(), ty, required: required.contains(name.as_str()), description, deprecated }
    })
    .collect();

  let mut ap_child = ctx.child("additionalProperties");
  let additional_properties = schema.additional_properties.as_ref().and_then(|ap| match ap {
    Schema::Object(obj_ref) => Some(Box::new(ref_or_object(obj_ref, &mut ap_child))),
    Schema::Boolean(_) => None,
  });

  IrType::Object { properties, additional_properties }
}
