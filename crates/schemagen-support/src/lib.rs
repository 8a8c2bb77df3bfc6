//! Runtime validator combinators consumed by code `schemagen` emits.
//!
//! The code generator's type emitter and schema emitter agree on a shared
//! vocabulary of auxiliary types and validators (see `schemagen`'s
//! generation context). This crate is the runtime half of that vocabulary:
//! every emitted validator binding is an expression built out of the
//! combinators below, evaluated against a decoded `serde_json::Value`.
//!
//! A [`Schema<T>`] is a named, cloneable decode function. Combinators build
//! bigger schemas out of smaller ones; [`recursive`] ties the one knot the
//! combinators can't express by composition alone.

mod error;
mod shape;

use std::sync::Arc;

pub use error::ValidationError;
use serde_json::Value;
pub use shape::Shape;

type DecodeFn<T> = dyn Fn(&Value) -> Result<T, ValidationError> + Send + Sync;

/// A named, cloneable validator/decoder for one JSON shape.
///
/// Cloning a `Schema` is cheap (an `Arc` bump); this is what lets the same
/// schema value be reused as a struct field, an array element, and a union
/// branch without re-describing it.
pub struct Schema<T> {
  name: &'static str,
  decode: Arc<DecodeFn<T>>,
}

impl<T> Clone for Schema<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name,
      decode: Arc::clone(&self.decode),
    }
  }
}

impl<T> Schema<T> {
  fn new(name: &'static str, decode: impl Fn(&Value) -> Result<T, ValidationError> + Send + Sync + 'static) -> Self {
    Self {
      name,
      decode: Arc::new(decode),
    }
  }

  /// The synthetic or declared name this schema was built under (diagnostics only).
  #[must_use]
  pub fn name(&self) -> &'static str {
    self.name
  }

  /// Decode and validate `value` against this schema.
  ///
  /// # Errors
  ///
  /// Returns [`ValidationError`] if `value`'s runtime shape or constraints
  /// don't match what this schema describes.
  pub fn validate(&self, value: &Value) -> Result<T, ValidationError> {
    (self.decode)(value)
  }
}

fn expect_shape<T>(name: &'static str, value: &Value, want: Shape) -> Result<T, ValidationError>
where
  T: Sized,
{
  Err(ValidationError::ShapeMismatch {
    schema: name,
    expected: want,
    found: Shape::classify(value),
  })
}

/// Schema for a bare JSON string with no length/pattern constraints.
#[must_use]
pub fn string() -> Schema<String> {
  Schema::new("string", |v| match v {
    Value::String(s) => Ok(s.clone()),
    other => expect_shape("string", other, Shape::String),
  })
}

/// Schema for a string constrained by `minLength`/`maxLength`/`pattern`.
///
/// `pattern`, when present, is compiled once per call (the emitter hoists
/// one `Schema` value per field, so this happens once per process, not
/// once per decode), the same way the generator's own identifier
/// sanitisation (`schemagen::naming`) compiles its regexes once via
/// `LazyLock`. An invalid pattern (should never occur against a
/// conformant OpenAPI document) is treated as no constraint at all rather
/// than panicking at schema-construction time.
#[must_use]
pub fn string_constrained(min_len: Option<u64>, max_len: Option<u64>, pattern: Option<&str>) -> Schema<String> {
  let compiled = pattern.and_then(|p| regex::Regex::new(p).ok());
  Schema::new("string", move |v| {
    let Value::String(s) = v else {
      return expect_shape("string", v, Shape::String);
    };
    let len = s.chars().count() as u64;
    if let Some(min) = min_len
      && len < min
    {
      return Err(ValidationError::LengthOutOfRange { schema: "string", min: min_len, max: max_len, actual: len });
    }
    if let Some(max) = max_len
      && len > max
    {
      return Err(ValidationError::LengthOutOfRange { schema: "string", min: min_len, max: max_len, actual: len });
    }
    if let Some(ref re) = compiled
      && !re.is_match(s)
    {
      return Err(ValidationError::PatternMismatch { schema: "string" });
    }
    Ok(s.clone())
  })
}

/// Schema for a JSON number (`f64`).
#[must_use]
pub fn number() -> Schema<f64> {
  Schema::new("number", |v| match v {
    Value::Number(n) => n.as_f64().ok_or(ValidationError::NotFinite { schema: "number" }),
    other => expect_shape("number", other, Shape::Number),
  })
}

/// Schema for a JSON number constrained to `minimum`/`maximum`/`multipleOf`.
#[must_use]
pub fn number_constrained(min: Option<f64>, max: Option<f64>, multiple_of: Option<f64>) -> Schema<f64> {
  Schema::new("number", move |v| {
    let Value::Number(n) = v else {
      return expect_shape("number", v, Shape::Number);
    };
    let n = n.as_f64().ok_or(ValidationError::NotFinite { schema: "number" })?;
    check_numeric_range("number", n, min, max, multiple_of)?;
    Ok(n)
  })
}

/// Schema for a JSON integer (`i64`); rejects non-integral numbers.
#[must_use]
pub fn integer() -> Schema<i64> {
  Schema::new("integer", |v| match v {
    Value::Number(n) => n.as_i64().ok_or(ValidationError::NotAnInteger { schema: "integer" }),
    other => expect_shape("integer", other, Shape::Number),
  })
}

/// Schema for a JSON integer constrained to `minimum`/`maximum`/`multipleOf`.
#[must_use]
pub fn integer_constrained(min: Option<i64>, max: Option<i64>, multiple_of: Option<i64>) -> Schema<i64> {
  Schema::new("integer", move |v| {
    let Value::Number(n) = v else {
      return expect_shape("integer", v, Shape::Number);
    };
    let n = n.as_i64().ok_or(ValidationError::NotAnInteger { schema: "integer" })?;
    check_numeric_range(
      "integer",
      n as f64,
      min.map(|m| m as f64),
      max.map(|m| m as f64),
      multiple_of.map(|m| m as f64),
    )?;
    Ok(n)
  })
}

fn check_numeric_range(
  schema: &'static str,
  n: f64,
  min: Option<f64>,
  max: Option<f64>,
  multiple_of: Option<f64>,
) -> Result<(), ValidationError> {
  if let Some(min) = min
    && n < min
  {
    return Err(ValidationError::NumberOutOfRange { schema, min, max, actual: n });
  }
  if let Some(max) = max
    && n > max
  {
    return Err(ValidationError::NumberOutOfRange { schema, min, max, actual: n });
  }
  if let Some(step) = multiple_of
    && step != 0.0
    && (n / step).fract().abs() > f64::EPSILON
  {
    return Err(ValidationError::NotMultipleOf { schema, multiple_of: step });
  }
  Ok(())
}

/// Schema for a JSON boolean.
#[must_use]
pub fn boolean() -> Schema<bool> {
  Schema::new("boolean", |v| match v {
    Value::Bool(b) => Ok(*b),
    other => expect_shape("boolean", other, Shape::Boolean),
  })
}

/// Schema for JSON `null`, decoding to `()`.
#[must_use]
pub fn null() -> Schema<()> {
  Schema::new("null", |v| match v {
    Value::Null => Ok(()),
    other => expect_shape("null", other, Shape::Null),
  })
}

/// Schema for an unconstrained JSON value (the `Unknown` fallback).
#[must_use]
pub fn unknown() -> Schema<Value> {
  Schema::new("unknown", |v| Ok(v.clone()))
}

/// Schema matching one exact string literal.
#[must_use]
pub fn literal_str(expected: &'static str) -> Schema<String> {
  Schema::new("literal", move |v| match v {
    Value::String(s) if s == expected => Ok(s.clone()),
    Value::String(_) => Err(ValidationError::LiteralMismatch { schema: "literal", expected }),
    other => expect_shape("literal", other, Shape::String),
  })
}

/// Schema for a homogeneous JSON array, decoding each element with `item`.
#[must_use]
pub fn array<T: 'static>(item: Schema<T>) -> Schema<Vec<T>> {
  Schema::new("array", move |v| {
    let Value::Array(items) = v else {
      return expect_shape("array", v, Shape::Array);
    };
    items
      .iter()
      .enumerate()
      .map(|(i, el)| item.validate(el).map_err(|e| ValidationError::AtIndex { index: i, source: Box::new(e) }))
      .collect()
  })
}

/// Schema for a JSON object whose own decoding is delegated to `build`,
/// which receives the validated-as-object [`serde_json::Map`] and is
/// expected to read its fields with [`field`]/[`field_or`].
pub fn object<T: 'static>(
  name: &'static str,
  build: impl Fn(&serde_json::Map<String, Value>) -> Result<T, ValidationError> + Send + Sync + 'static,
) -> Schema<T> {
  Schema::new(name, move |v| {
    let Value::Object(map) = v else {
      return expect_shape(name, v, Shape::Object);
    };
    build(map)
  })
}

/// Wraps `schema`'s decoded value in a `Box`, matching the emitted type's
/// own boxing of a self-referencing field (the type emitter boxes every
/// occurrence of a schema's own name to keep the Rust type finite-sized;
/// this is the schema-emitter counterpart so the two stay field-for-field
/// compatible — see `spec.md` §3 invariant 4).
#[must_use]
pub fn boxed<T: 'static>(schema: Schema<T>) -> Schema<Box<T>> {
  Schema::new(schema.name, move |v| schema.validate(v).map(Box::new))
}

/// A JSON object used as an open-ended dictionary: every value decoded with `value_schema`.
#[must_use]
pub fn dictionary<T: 'static>(value_schema: Schema<T>) -> Schema<indexmap::IndexMap<String, T>> {
  Schema::new("dictionary", move |v| {
    let Value::Object(map) = v else {
      return expect_shape("dictionary", v, Shape::Object);
    };
    map
      .iter()
      .map(|(k, val)| {
        value_schema
          .validate(val)
          .map(|decoded| (k.clone(), decoded))
          .map_err(|e| ValidationError::AtField { field: k.clone(), source: Box::new(e) })
      })
      .collect()
  })
}

/// Reads a required field out of a decoded object.
///
/// # Errors
///
/// Returns [`ValidationError::MissingField`] if absent, or the inner
/// schema's error (wrapped with the field name) if present but invalid.
pub fn field<T>(
  obj: &serde_json::Map<String, Value>,
  json_name: &'static str,
  schema: &Schema<T>,
) -> Result<T, ValidationError> {
  let value = obj.get(json_name).ok_or(ValidationError::MissingField { field: json_name })?;
  schema.validate(value).map_err(|e| ValidationError::AtField { field: json_name.to_string(), source: Box::new(e) })
}

/// Reads an optional field, substituting `default` when absent.
///
/// # Errors
///
/// Returns the inner schema's error (wrapped with the field name) if the
/// field is present but fails to decode.
pub fn field_or<T: Clone>(
  obj: &serde_json::Map<String, Value>,
  json_name: &'static str,
  schema: &Schema<T>,
  default: T,
) -> Result<T, ValidationError> {
  match obj.get(json_name) {
    None => Ok(default),
    Some(value) => schema
      .validate(value)
      .map_err(|e| ValidationError::AtField { field: json_name.to_string(), source: Box::new(e) }),
  }
}

/// Wraps `schema` so `null` decodes to `None` and anything else decodes
/// through `schema` into `Some`. Idempotent at the type level: wrapping an
/// already-nullable schema again still produces `Schema<Option<T>>`, never
/// `Schema<Option<Option<T>>>`, because the emitter never calls this twice
/// on the same field (see the generation context's double-option check).
#[must_use]
pub fn option<T: 'static>(schema: Schema<T>) -> Schema<Option<T>> {
  Schema::new("option", move |v| match v {
    Value::Null => Ok(None),
    other => schema.validate(other).map(Some),
  })
}

/// Alias for [`option`] used by the schema emitter for fields whose
/// underlying schema does not itself return `null`, kept as a distinct name
/// to mirror the vocabulary the type emitter and schema emitter agree on
/// (`nullable_as_option` vs. plain `option`).
#[must_use]
pub fn nullable_as_option<T: 'static>(schema: Schema<T>) -> Schema<Option<T>> {
  option(schema)
}

/// A single shape-tagged branch of an unboxed-variant union.
pub struct ShapeBranch<T> {
  pub shape: Shape,
  pub decode: Arc<dyn Fn(&Value) -> Result<T, ValidationError> + Send + Sync>,
}

/// Builds an unboxed-variant schema: the runtime [`Shape`] of the input
/// value selects which branch decodes it. Exactly one branch may claim each
/// [`Shape`] — this is the runtime twin of the discriminability analysis
/// that decided this union was unboxable in the first place.
#[must_use]
pub fn shape<T: 'static>(name: &'static str, branches: Vec<ShapeBranch<T>>) -> Schema<T> {
  Schema::new(name, move |v| {
    let found = Shape::classify(v);
    for branch in &branches {
      if branch.shape == found {
        return (branch.decode)(v);
      }
    }
    Err(ValidationError::NoMatchingShape { schema: name, found })
  })
}

/// Builds a branch for [`shape`] out of a schema whose own runtime shape is
/// unambiguous (the emitter only calls this once per distinct [`Shape`]).
pub fn shape_branch<T: 'static, U: 'static>(
  shape: Shape,
  schema: Schema<U>,
  wrap: impl Fn(U) -> T + Send + Sync + 'static,
) -> ShapeBranch<T> {
  ShapeBranch {
    shape,
    decode: Arc::new(move |v| schema.validate(v).map(&wrap)),
  }
}

/// Decodes `T` through its own `serde::Deserialize` impl, rather than a
/// hand-written combinator.
///
/// Used for polymorphic-variant (`#[serde(rename = ..)]` unit enum) and
/// unboxed-variant (`#[serde(untagged)]` enum) unions: the emitted type
/// already carries the attributes needed to decode correctly, so the
/// schema for it is a thin wrapper rather than a second description of the
/// same discrimination logic.
#[must_use]
pub fn via_serde<T: for<'de> serde::Deserialize<'de> + 'static>(name: &'static str) -> Schema<T> {
  Schema::new(name, move |v| {
    serde_json::from_value(v.clone()).map_err(|e| ValidationError::SerdeDecodeFailed { schema: name, message: e.to_string() })
  })
}

/// Builds a self-referential schema. `build` receives a lazy placeholder
/// referring back to the schema under construction and must return the
/// fully-described schema; the placeholder is wired to that result before
/// `recursive` returns, so calling the placeholder before `build` finishes
/// would deadlock — `build` must not *evaluate* the placeholder eagerly,
/// only capture it for later use inside a field/array/shape combinator.
#[must_use]
pub fn recursive<T: 'static>(name: &'static str, build: impl FnOnce(Schema<T>) -> Schema<T>) -> Schema<T> {
  use std::sync::RwLock;

  let cell: Arc<RwLock<Option<Schema<T>>>> = Arc::new(RwLock::new(None));
  let cell_for_placeholder = Arc::clone(&cell);
  let placeholder = Schema::new(name, move |v| {
    let guard = cell_for_placeholder.read().expect("recursive schema cell poisoned");
    let inner = guard.as_ref().expect("recursive schema evaluated before it finished building");
    inner.validate(v)
  });

  let real = build(placeholder);
  *cell.write().expect("recursive schema cell poisoned") = Some(real.clone());
  real
}
