use serde_json::Value;

/// The runtime kind of a decoded JSON value, used to classify union members
/// for unboxed-variant dispatch.
///
/// This mirrors the discriminability analysis's classification exactly:
/// `Object`, `Reference`, and `Intersection` IR members all collapse to
/// [`Shape::Object`] at runtime, since a decoder can't distinguish them by
/// inspecting the value alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
  Null,
  Boolean,
  String,
  Number,
  Array,
  Object,
}

impl Shape {
  #[must_use]
  pub fn classify(value: &Value) -> Self {
    match value {
      Value::Null => Self::Null,
      Value::Bool(_) => Self::Boolean,
      Value::String(_) => Self::String,
      Value::Number(_) => Self::Number,
      Value::Array(_) => Self::Array,
      Value::Object(_) => Self::Object,
    }
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      Self::Null => "null",
      Self::Boolean => "boolean",
      Self::String => "string",
      Self::Number => "number",
      Self::Array => "array",
      Self::Object => "object",
    };
    f.write_str(s)
  }
}
