//! The intermediate representation: a tagged sum over normalised
//! JSON-Schema shapes, plus the structural equality and pretty-printing
//! the rest of the core depends on.
//!
//! `IrType` values are immutable once the parser produces them; the
//! optimiser (`optimizer.rs`) returns new values rather than mutating in
//! place.

pub(crate) mod optimizer;
pub(crate) mod parser;

use std::cmp::Ordering;

use serde_json::Number;

/// One property of an [`IrType::Object`], in source document order.
#[derive(Debug, Clone)]
pub(crate) struct ObjectField {
  pub(crate) name: String,
  pub(crate) ty: IrType,
  pub(crate) required: bool,
  pub(crate) description: Option<String>,
  pub(crate) deprecated: bool,
}

/// A literal value an [`IrType::Literal`] pins a member to.
#[derive(Debug, Clone)]
pub(crate) enum Literal {
  Str(String),
  Number(Number),
  Boolean(bool),
  Null,
}

impl Literal {
  fn structural_eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::Str(a), Self::Str(b)) => a == b,
      (Self::Number(a), Self::Number(b)) => a == b,
      (Self::Boolean(a), Self::Boolean(b)) => a == b,
      (Self::Null, Self::Null) => true,
      _ => false,
    }
  }

  fn pretty_key(&self) -> String {
    match self {
      Self::Str(s) => format!("\"{s}\""),
      Self::Number(n) => n.to_string(),
      Self::Boolean(b) => b.to_string(),
      Self::Null => "null".to_string(),
    }
  }
}

/// Length/pattern constraints attached to [`IrType::String`].
///
/// Ignored by [`IrType::structural_eq`] (see the crate's design notes on
/// the constraints-vs-equality trade-off) but carried through to the
/// schema emitter, which does enforce them at runtime.
#[derive(Debug, Clone, Default)]
pub(crate) struct StringConstraints {
  pub(crate) min_len: Option<u64>,
  pub(crate) max_len: Option<u64>,
  pub(crate) pattern: Option<String>,
}

/// Range/step constraints shared by [`IrType::Number`] and [`IrType::Integer`].
#[derive(Debug, Clone, Default)]
pub(crate) struct NumericConstraints {
  pub(crate) min: Option<f64>,
  pub(crate) max: Option<f64>,
  pub(crate) multiple_of: Option<f64>,
}

/// Array-level constraints attached to [`IrType::Array`].
#[derive(Debug, Clone, Default)]
pub(crate) struct ArrayConstraints {
  pub(crate) min_items: Option<u64>,
  pub(crate) max_items: Option<u64>,
  pub(crate) unique: bool,
}

/// The normalised algebra of types the parser produces and every lowering
/// pass consumes.
///
/// See `spec.md` §3 for the full variant table; this is a direct
/// transcription, with constraint fields kept alongside the primitives they
/// refine rather than split into a side table, matching how `oas3`'s
/// `ObjectSchema` keeps constraint fields inline on the same struct as
/// `schema_type`.
#[derive(Debug, Clone)]
pub(crate) enum IrType {
  String(StringConstraints),
  Number(NumericConstraints),
  Integer(NumericConstraints),
  Boolean,
  Null,
  Array { items: Box<IrType>, constraints: ArrayConstraints },
  Object { properties: Vec<ObjectField>, additional_properties: Option<Box<IrType>> },
  Literal(Literal),
  Union(Vec<IrType>),
  Intersection(Vec<IrType>),
  Reference(String),
  Option(Box<IrType>),
  Unknown,
}

impl IrType {
  pub(crate) fn option(inner: IrType) -> IrType {
    match inner {
      IrType::Option(_) => inner,
      other => IrType::Option(Box::new(other)),
    }
  }

  pub(crate) fn is_option(&self) -> bool {
    matches!(self, IrType::Option(_))
  }

  /// `true` if this type (possibly a `Union`) already carries a null
  /// member, i.e. wrapping it in `Option` again would be redundant. Used by
  /// the emitters' double-option guard (`spec.md` §4.2).
  pub(crate) fn is_nullish(&self) -> bool {
    match self {
      IrType::Option(_) | IrType::Null => true,
      IrType::Union(members) => members.iter().any(IrType::is_nullish),
      _ => false,
    }
  }

  /// Structural equality: same variant, equal children, constraint fields
  /// ignored. This is the equality the generation context's extracted-type
  /// cache dedups on (`spec.md` §3 invariant 3).
  pub(crate) fn structural_eq(&self, other: &IrType) -> bool {
    use IrType::{Array, Boolean, Integer, Intersection, Literal as Lit, Null, Number, Object, Option as Opt, Reference, String as Str, Union, Unknown};
    match (self, other) {
      (Str(_), Str(_))
      | (Number(_), Number(_))
      | (Integer(_), Integer(_))
      | (Boolean, Boolean)
      | (Null, Null)
      | (Unknown, Unknown) => true,
      (Array { items: a, .. }, Array { items: b, .. }) => a.structural_eq(b),
      (Object { properties: a, additional_properties: ap_a }, Object { properties: b, additional_properties: ap_b }) => {
        a.len() == b.len()
          && a.iter().zip(b.iter()).all(|(fa, fb)| fa.name == fb.name && fa.required == fb.required && fa.ty.structural_eq(&fb.ty))
          && match (ap_a, ap_b) {
            (None, None) => true,
            (Some(x), Some(y)) => x.structural_eq(y),
            _ => false,
          }
      }
      (Lit(a), Lit(b)) => a.structural_eq(b),
      (Union(a), Union(b)) | (Intersection(a), Intersection(b)) => {
        a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
      }
      (Reference(a), Reference(b)) => a == b,
      (Opt(a), Opt(b)) => a.structural_eq(b),
      _ => false,
    }
  }

  /// A deterministic, order-stable string key for this type, ignoring
  /// constraints, used both for union-member deduplication (`spec.md`
  /// §4.1's optimisation pass) and as the key into the generation
  /// context's `extracted_types` dedup index (a plain
  /// `HashMap<String, usize>` keyed on this string).
  pub(crate) fn pretty_key(&self) -> String {
    match self {
      IrType::String(_) => "string".to_string(),
      IrType::Number(_) => "number".to_string(),
      IrType::Integer(_) => "integer".to_string(),
      IrType::Boolean => "boolean".to_string(),
      IrType::Null => "null".to_string(),
      IrType::Unknown => "unknown".to_string(),
      IrType::Array { items, .. } => format!("array<{}>", items.pretty_key()),
      IrType::Object { properties, additional_properties } => {
        let fields = properties
          .iter()
          .map(|f| format!("{}{}:{}", f.name, if f.required { "" } else { "?" }, f.ty.pretty_key()))
          .collect::<Vec<_>>()
          .join(",");
        match additional_properties {
          Some(ap) => format!("object{{{fields}}}+{}", ap.pretty_key()),
          None => format!("object{{{fields}}}"),
        }
      }
      IrType::Literal(l) => format!("literal({})", l.pretty_key()),
      IrType::Union(members) => format!("union[{}]", members.iter().map(IrType::pretty_key).collect::<Vec<_>>().join("|")),
      IrType::Intersection(members) => {
        format!("intersection[{}]", members.iter().map(IrType::pretty_key).collect::<Vec<_>>().join("&"))
      }
      IrType::Reference(name) => format!("ref({name})"),
      IrType::Option(inner) => format!("option<{}>", inner.pretty_key()),
    }
  }

  /// A rough complexity score used by the optimiser's bounded
  /// simple-reference inlining (`spec.md` §4.1: depth 2): primitives and
  /// literals are "simple" (score 1), everything else grows with its
  /// children so a depth-2 cap can be enforced without an explicit
  /// recursion-depth parameter threaded through the inliner.
  pub(crate) fn complexity_score(&self) -> usize {
    match self {
      IrType::String(_) | IrType::Number(_) | IrType::Integer(_) | IrType::Boolean | IrType::Null | IrType::Unknown | IrType::Literal(_) => 1,
      IrType::Reference(_) => 1,
      IrType::Array { items, .. } => 1 + items.complexity_score(),
      IrType::Option(inner) => inner.complexity_score(),
      IrType::Object { properties, .. } => 1 + properties.iter().map(|f| f.ty.complexity_score()).sum::<usize>(),
      IrType::Union(members) | IrType::Intersection(members) => 1 + members.iter().map(IrType::complexity_score).sum::<usize>(),
    }
  }

  /// Names this type references directly (one level, not transitively) —
  /// the edge set the component-schema orchestrator builds its dependency
  /// graph from.
  pub(crate) fn direct_references(&self, out: &mut Vec<String>) {
    match self {
      IrType::Reference(name) => out.push(name.clone()),
      IrType::Array { items, .. } | IrType::Option(items) => items.direct_references(out),
      IrType::Object { properties, additional_properties } => {
        for field in properties {
          field.ty.direct_references(out);
        }
        if let Some(ap) = additional_properties {
          ap.direct_references(out);
        }
      }
      IrType::Union(members) | IrType::Intersection(members) => {
        for member in members {
          member.direct_references(out);
        }
      }
      _ => {}
    }
  }
}

/// Ordering used only to make union-member deduplication deterministic when
/// two members have equal `pretty_key`s but arrived via different source
/// positions; not a total order on the algebra, just stable-sort glue.
pub(crate) fn pretty_key_cmp(a: &IrType, b: &IrType) -> Ordering {
  a.pretty_key().cmp(&b.pretty_key())
}

/// A top-level named schema: `(name, description, IrType)` from `spec.md` §3.
#[derive(Debug, Clone)]
pub(crate) struct NamedSchema {
  pub(crate) name: String,
  pub(crate) description: Option<String>,
  pub(crate) ty: IrType,
}

/// The universe for reference resolution: every named schema in the spec,
/// keyed by name.
pub(crate) type SchemaContext = indexmap::IndexMap<String, NamedSchema>;

#[cfg(test)]
mod tests {
  use super::*;

  fn obj(fields: Vec<(&str, IrType, bool)>) -> IrType {
    IrType::Object {
      properties: fields
        .into_iter()
        .map(|(name, ty, required)| ObjectField { name: name.to_string(), ty, required, description: None, deprecated: false })
        .collect(),
      additional_properties: None,
    }
  }

  #[test]
  fn structural_eq_ignores_constraints() {
    let a = IrType::String(StringConstraints { min_len: Some(1), ..Default::default() });
    let b = IrType::String(StringConstraints { min_len: Some(99), ..Default::default() });
    assert!(a.structural_eq(&b));
  }

  #[test]
  fn structural_eq_distinguishes_required() {
    let a = obj(vec![("id", IrType::Integer(Default::default()), true)]);
    let b = obj(vec![("id", IrType::Integer(Default::default()), false)]);
    assert!(!a.structural_eq(&b));
  }

  #[test]
  fn option_is_idempotent() {
    let once = IrType::option(IrType::String(Default::default()));
    let twice = IrType::option(once.clone());
    assert!(once.structural_eq(&twice));
    assert!(matches!(twice, IrType::Option(inner) if matches!(*inner, IrType::String(_))));
  }

  #[test]
  fn direct_references_collects_one_level() {
    let ty = obj(vec![
      ("a", IrType::Reference("Foo".into()), true),
      ("b", IrType::Array { items: Box::new(IrType::Reference("Bar".into())), constraints: Default::default() }, true),
    ]);
    let mut refs = vec![];
    ty.direct_references(&mut refs);
    assert_eq!(refs, vec!["Foo".to_string(), "Bar".to_string()]);
  }
}
