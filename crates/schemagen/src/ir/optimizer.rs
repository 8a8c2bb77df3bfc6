//! Normalises the raw output of [`super::parser`] before any emitter sees it
//! (`spec.md` §4.1's optimisation pass): flattens nested unions/intersections
//! one level, dedups union members, collapses degenerate single-member or
//! empty compositions, and inlines simple references up to depth 2.

use super::{IrType, SchemaContext};

/// Maximum [`IrType::complexity_score`] a referenced schema may have and
/// still be inlined in place of its [`IrType::Reference`].
const INLINE_COMPLEXITY_BUDGET: usize = 2;

/// Maximum recursion depth for simple-reference inlining — deliberately
/// shallow so a chain of trivial aliases doesn't balloon into a deep inline
/// tree; anything past depth 2 stays a `Reference`.
const INLINE_DEPTH: usize = 2;

/// Runs the full optimisation pass on one top-level schema's `IrType`.
/// `schemas` is the full context, used only for simple-reference inlining —
/// every other pass is purely local to the value being optimised.
pub(crate) fn optimize(ty: IrType, schemas: &SchemaContext) -> IrType {
  let ty = inline_simple_references(ty, schemas, INLINE_DEPTH);
  normalize(ty)
}

fn inline_simple_references(ty: IrType, schemas: &SchemaContext, depth: usize) -> IrType {
  if depth == 0 {
    return ty;
  }
  match ty {
    IrType::Reference(name) => match schemas.get(&name) {
      Some(target) if target.ty.complexity_score() <= INLINE_COMPLEXITY_BUDGET => {
        inline_simple_references(target.ty.clone(), schemas, depth - 1)
      }
      _ => IrType::Reference(name),
    },
    IrType::Array { items, constraints } => {
      IrType::Array { items: Box::new(inline_simple_references(*items, schemas, depth)), constraints }
    }
    IrType::Option(inner) => IrType::option(inline_simple_references(*inner, schemas, depth)),
    IrType::Object { properties, additional_properties } => IrType::Object {
      properties: properties
        .into_iter()
        .map(|mut f| {
          f.ty = inline_simple_references(f.ty, schemas, depth);
          f
        })
        .collect(),
      additional_properties: additional_properties.map(|ap| Box::new(inline_simple_references(*ap, schemas, depth))),
    },
    IrType::Union(members) => IrType::Union(members.into_iter().map(|m| inline_simple_references(m, schemas, depth)).collect()),
    IrType::Intersection(members) => {
      IrType::Intersection(members.into_iter().map(|m| inline_simple_references(m, schemas, depth)).collect())
    }
    other => other,
  }
}

/// Flattens, dedups, and collapses unions/intersections, recursing into
/// children first so nested compositions are already normalised by the time
/// their parent inspects them.
fn normalize(ty: IrType) -> IrType {
  match ty {
    IrType::Array { items, constraints } => IrType::Array { items: Box::new(normalize(*items)), constraints },
    IrType::Option(inner) => IrType::option(normalize(*inner)),
    IrType::Object { properties, additional_properties } => IrType::Object {
      properties: properties
        .into_iter()
        .map(|mut f| {
          f.ty = normalize(f.ty);
          f
        })
        .collect(),
      additional_properties: additional_properties.map(|ap| Box::new(normalize(*ap))),
    },
    IrType::Union(members) => normalize_union(members),
    IrType::Intersection(members) => normalize_intersection(members),
    other => other,
  }
}

fn normalize_union(members: Vec<IrType>) -> IrType {
  let mut flat = Vec::with_capacity(members.len());
  for member in members {
    match normalize(member) {
      IrType::Union(inner) => flat.extend(inner),
      other => flat.push(other),
    }
  }

  let mut seen = std::collections::HashSet::new();
  flat.retain(|m| seen.insert(m.pretty_key()));

  match flat.len() {
    0 => IrType::Unknown,
    1 => flat.into_iter().next().expect("len checked above"),
    _ => IrType::Union(flat),
  }
}

fn normalize_intersection(members: Vec<IrType>) -> IrType {
  let mut flat = Vec::with_capacity(members.len());
  for member in members {
    match normalize(member) {
      IrType::Intersection(inner) => flat.extend(inner),
      other => flat.push(other),
    }
  }

  match flat.len() {
    0 => IrType::Unknown,
    1 => flat.into_iter().next().expect("len checked above"),
    _ => IrType::Intersection(flat),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::{Literal, NamedSchema, ObjectField};

  fn empty_ctx() -> SchemaContext {
    indexmap::IndexMap::new()
  }

  #[test]
  fn flattens_nested_unions_one_level() {
    let ty = IrType::Union(vec![IrType::String(Default::default()), IrType::Union(vec![IrType::Boolean, IrType::Null])]);
    let flattened = optimize(ty, &empty_ctx());
    let IrType::Union(members) = flattened else { panic!("expected union") };
    assert_eq!(members.len(), 3);
  }

  #[test]
  fn dedups_union_members_by_pretty_key() {
    let ty = IrType::Union(vec![IrType::String(Default::default()), IrType::String(Default::default())]);
    let deduped = optimize(ty, &empty_ctx());
    assert!(matches!(deduped, IrType::String(_)));
  }

  #[test]
  fn collapses_single_member_union_to_bare_type() {
    let ty = IrType::Union(vec![IrType::Literal(Literal::Str("only".into()))]);
    let collapsed = optimize(ty, &empty_ctx());
    assert!(matches!(collapsed, IrType::Literal(Literal::Str(s)) if s == "only"));
  }

  #[test]
  fn inlines_simple_reference_within_budget() {
    let mut schemas = empty_ctx();
    schemas.insert(
      "Id".to_string(),
      NamedSchema { name: "Id".to_string(), description: None, ty: IrType::String(Default::default()) },
    );
    let ty = IrType::Object {
      properties: vec![ObjectField {
        name: "id".to_string(),
        ty: IrType::Reference("Id".to_string()),
        required: true,
        description: None,
        deprecated: false,
      }],
      additional_properties: None,
    };
    let inlined = optimize(ty, &schemas);
    let IrType::Object { properties, .. } = inlined else { panic!("expected object") };
    assert!(matches!(properties[0].ty, IrType::String(_)));
  }

  #[test]
  fn leaves_complex_reference_unresolved() {
    let mut schemas = empty_ctx();
    schemas.insert(
      "Pet".to_string(),
      NamedSchema {
        name: "Pet".to_string(),
        description: None,
        ty: IrType::Object {
          properties: vec![
            ObjectField { name: "id".to_string(), ty: IrType::Integer(Default::default()), required: true, description: None, deprecated: false },
            ObjectField { name: "name".to_string(), ty: IrType::String(Default::default()), required: true, description: None, deprecated: false },
          ],
          additional_properties: None,
        },
      },
    );
    let ty = IrType::Reference("Pet".to_string());
    let untouched = optimize(ty, &schemas);
    assert!(matches!(untouched, IrType::Reference(name) if name == "Pet"));
  }
}
