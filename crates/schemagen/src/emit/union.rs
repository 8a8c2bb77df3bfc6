//! The union discriminability analysis (`spec.md` §4.3), shared verbatim by
//! the type emitter and the schema emitter so the two lowering passes can
//! never disagree about which shape a union takes.

use std::collections::{BTreeSet, HashMap};

use schemagen_support::Shape;

use crate::{ir::IrType, naming::to_rust_type_name};

/// One constructor of an [`UnionDecision::UnboxedVariant`]: a label plus the
/// member it wraps and the runtime [`Shape`] it is dispatched on.
pub(crate) struct UnboxedBranch {
  pub(crate) label: String,
  pub(crate) member: IrType,
  pub(crate) shape: Shape,
}

pub(crate) enum UnionDecision {
  /// `has_null && non_null.len() == 1`: collapses straight to `Option<T>`.
  OptionOf(IrType),
  /// The array-plus-element simplification: `Array<T> | T` lowers to `Array<T>`.
  ArrayPlusElement(IrType),
  /// A pure string-literal union of 1–50 members: a polymorphic variant.
  PolymorphicVariant(Vec<String>),
  /// Every member has a distinct runtime [`Shape`]: a runtime-dispatchable
  /// unboxed variant.
  UnboxedVariant(Vec<UnboxedBranch>),
  /// No discrimination strategy applies: best-effort fallback to the last
  /// member, with a `ComplexUnionSimplified` warning left for the caller to
  /// push.
  Fallback(IrType),
}

const MAX_POLYMORPHIC_VARIANT_MEMBERS: usize = 50;

/// Runs the full decision tree of `spec.md` §4.3 over a `Union`'s raw
/// members (pre-split). Returns whether the union carries a `null` member
/// and the decision computed over the non-null "effective" members (or all
/// members, if there was no null to split off).
pub(crate) fn decide(members: &[IrType]) -> (bool, UnionDecision) {
  let (nulls, non_null): (Vec<_>, Vec<_>) = members.iter().cloned().partition(|m| matches!(m, IrType::Null));
  let has_null = !nulls.is_empty();

  if has_null && non_null.len() == 1 {
    return (true, UnionDecision::OptionOf(non_null.into_iter().next().expect("len checked above")));
  }

  let effective: Vec<IrType> = if has_null { non_null } else { members.to_vec() };

  if let Some(decision) = array_plus_element(&effective) {
    return (has_null, decision);
  }

  if let Some(decision) = polymorphic_variant(&effective) {
    return (has_null, decision);
  }

  if let Some(decision) = unboxed_variant(&effective) {
    return (has_null, decision);
  }

  let fallback = effective.last().cloned().unwrap_or(IrType::Unknown);
  (has_null, UnionDecision::Fallback(fallback))
}

fn array_plus_element(effective: &[IrType]) -> Option<UnionDecision> {
  if effective.len() != 2 {
    return None;
  }
  let (a, b) = (&effective[0], &effective[1]);
  if let IrType::Array { items, .. } = a
    && items.structural_eq(b)
  {
    return Some(UnionDecision::ArrayPlusElement((**items).clone()));
  }
  if let IrType::Array { items, .. } = b
    && items.structural_eq(a)
  {
    return Some(UnionDecision::ArrayPlusElement((**items).clone()));
  }
  None
}

fn polymorphic_variant(effective: &[IrType]) -> Option<UnionDecision> {
  if effective.is_empty() || effective.len() > MAX_POLYMORPHIC_VARIANT_MEMBERS {
    return None;
  }
  let all_string_literals = effective.iter().all(|m| matches!(m, IrType::Literal(crate::ir::Literal::Str(_))));
  if !all_string_literals {
    return None;
  }
  let labels = effective
    .iter()
    .map(|m| match m {
      IrType::Literal(crate::ir::Literal::Str(s)) => s.clone(),
      _ => unreachable!("filtered to string literals above"),
    })
    .collect();
  Some(UnionDecision::PolymorphicVariant(labels))
}

fn runtime_shape(ty: &IrType) -> Shape {
  match ty {
    IrType::Boolean | IrType::Literal(crate::ir::Literal::Boolean(_)) => Shape::Boolean,
    IrType::String(_) | IrType::Literal(crate::ir::Literal::Str(_)) => Shape::String,
    IrType::Number(_) | IrType::Integer(_) | IrType::Literal(crate::ir::Literal::Number(_)) => Shape::Number,
    IrType::Array { .. } => Shape::Array,
    IrType::Null | IrType::Literal(crate::ir::Literal::Null) => Shape::Null,
    IrType::Object { .. } | IrType::Reference(_) | IrType::Intersection(_) | IrType::Unknown | IrType::Union(_) | IrType::Option(_) => Shape::Object,
  }
}

fn branch_label(ty: &IrType) -> String {
  match ty {
    IrType::String(_) => "String".to_string(),
    IrType::Integer(_) => "Int".to_string(),
    IrType::Number(_) => "Number".to_string(),
    IrType::Boolean => "Bool".to_string(),
    IrType::Null => "Null".to_string(),
    IrType::Array { .. } => "Array".to_string(),
    IrType::Reference(name) => to_rust_type_name(name),
    IrType::Literal(crate::ir::Literal::Str(s)) => to_rust_type_name(s),
    _ => "Object".to_string(),
  }
}

fn unboxed_variant(effective: &[IrType]) -> Option<UnionDecision> {
  let shapes: Vec<Shape> = effective.iter().map(runtime_shape).collect();
  let mut counts: HashMap<Shape, usize> = HashMap::new();
  for shape in &shapes {
    *counts.entry(*shape).or_default() += 1;
  }
  let unboxable = counts.values().all(|&n| n <= 1);
  if !unboxable {
    return None;
  }

  let mut used_labels = BTreeSet::new();
  let branches = effective
    .iter()
    .zip(shapes)
    .map(|(member, shape)| {
      let base = branch_label(member);
      let label = crate::naming::ensure_unique(&base, &used_labels);
      used_labels.insert(label.clone());
      UnboxedBranch { label, member: member.clone(), shape }
    })
    .collect();

  Some(UnionDecision::UnboxedVariant(branches))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::{NumericConstraints, StringConstraints};

  #[test]
  fn single_non_null_member_collapses_to_option() {
    let (has_null, decision) = decide(&[IrType::String(StringConstraints::default()), IrType::Null]);
    assert!(has_null);
    assert!(matches!(decision, UnionDecision::OptionOf(IrType::String(_))));
  }

  #[test]
  fn array_and_element_simplify() {
    let item = IrType::Reference("Tag".to_string());
    let members = vec![item.clone(), IrType::Array { items: Box::new(item), constraints: Default::default() }];
    let (has_null, decision) = decide(&members);
    assert!(!has_null);
    assert!(matches!(decision, UnionDecision::ArrayPlusElement(IrType::Reference(name)) if name == "Tag"));
  }

  #[test]
  fn pure_string_literals_become_polymorphic_variant() {
    let members: Vec<_> = ["public", "home", "followers", "specified"]
      .into_iter()
      .map(|s| IrType::Literal(crate::ir::Literal::Str(s.to_string())))
      .collect();
    let (_, decision) = decide(&members);
    assert!(matches!(decision, UnionDecision::PolymorphicVariant(labels) if labels.len() == 4));
  }

  #[test]
  fn distinct_shapes_become_unboxed_variant() {
    let members = vec![IrType::String(StringConstraints::default()), IrType::Integer(NumericConstraints::default()), IrType::Boolean];
    let (_, decision) = decide(&members);
    let UnionDecision::UnboxedVariant(branches) = decision else { panic!("expected unboxed variant") };
    assert_eq!(branches.len(), 3);
    assert_eq!(branches[0].label, "String");
    assert_eq!(branches[1].label, "Int");
    assert_eq!(branches[2].label, "Bool");
  }

  #[test]
  fn colliding_shapes_fall_back_to_last_member() {
    let members = vec![
      IrType::Object { properties: vec![], additional_properties: None },
      IrType::Reference("Other".to_string()),
    ];
    let (_, decision) = decide(&members);
    assert!(matches!(decision, UnionDecision::Fallback(IrType::Reference(name)) if name == "Other"));
  }
}
