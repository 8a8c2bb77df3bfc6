//! Intersection lowering (`spec.md` §4.4), shared by the type emitter and
//! the schema emitter: both need the same "which members are objects, what
//! does the merged record look like" decision.

use crate::ir::{IrType, ObjectField};

pub(crate) enum IntersectionDecision {
  /// Every member is a bare `Reference`: lower to the last one (the
  /// override pattern — a derived schema that "is" its base with no added
  /// fields the core can see).
  AllReferences(IrType),
  /// Every member is an `Object` (or reference-shaped): merged into one
  /// flat record.
  AllObjects(IrType),
  /// No member is an object: falls back to the last member, same as the
  /// all-references case but for a different reason.
  NoObjects(IrType),
  /// A mix of object and non-object members: the object parts are merged
  /// and the rest dropped, with `IntersectionNotFullySupported` left for
  /// the caller to warn about.
  Mixed(IrType),
}

pub(crate) fn decide(members: &[IrType]) -> IntersectionDecision {
  if members.iter().all(|m| matches!(m, IrType::Reference(_))) {
    return IntersectionDecision::AllReferences(members.last().cloned().unwrap_or(IrType::Unknown));
  }

  let objects: Vec<&IrType> = members.iter().filter(|m| matches!(m, IrType::Object { .. })).collect();

  if objects.is_empty() {
    return IntersectionDecision::NoObjects(members.last().cloned().unwrap_or(IrType::Unknown));
  }

  let merged = merge_objects(&objects);
  if objects.len() == members.len() {
    IntersectionDecision::AllObjects(merged)
  } else {
    IntersectionDecision::Mixed(merged)
  }
}

fn merge_objects(objects: &[&IrType]) -> IrType {
  let mut properties: Vec<ObjectField> = Vec::new();
  let mut additional_properties = None;

  for object in objects {
    let IrType::Object { properties: props, additional_properties: ap } = object else {
      unreachable!("filtered to Object members above")
    };
    for field in props {
      if let Some(existing) = properties.iter_mut().find(|f: &&mut ObjectField| f.name == field.name) {
        *existing = field.clone();
      } else {
        properties.push(field.clone());
      }
    }
    if ap.is_some() {
      additional_properties = ap.clone();
    }
  }

  IrType::Object { properties, additional_properties }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn all_reference_members_lower_to_last() {
    let members = vec![IrType::Reference("Base".to_string()), IrType::Reference("Extended".to_string())];
    let decision = decide(&members);
    assert!(matches!(decision, IntersectionDecision::AllReferences(IrType::Reference(name)) if name == "Extended"));
  }

  #[test]
  fn all_object_members_merge_fields() {
    let a = IrType::Object {
      properties: vec![ObjectField { name: "id".to_string(), ty: IrType::Integer(Default::default()), required: true, description: None, deprecated: false }],
      additional_properties: None,
    };
    let b = IrType::Object {
      properties: vec![ObjectField { name: "name".to_string(), ty: IrType::String(Default::default()), required: true, description: None, deprecated: false }],
      additional_properties: None,
    };
    let IntersectionDecision::AllObjects(IrType::Object { properties, .. }) = decide(&[a, b]) else { panic!("expected merged object") };
    assert_eq!(properties.len(), 2);
  }

  #[test]
  fn mixed_members_merge_object_parts_only() {
    let obj = IrType::Object {
      properties: vec![ObjectField { name: "id".to_string(), ty: IrType::Integer(Default::default()), required: true, description: None, deprecated: false }],
      additional_properties: None,
    };
    let decision = decide(&[obj, IrType::Reference("Tag".to_string())]);
    assert!(matches!(decision, IntersectionDecision::Mixed(_)));
  }
}
