use crate::shape::Shape;

/// Failure decoding a JSON value against a [`crate::Schema`].
///
/// Every variant carries enough context to render a single diagnostic
/// line; nested failures (`AtField`, `AtIndex`) box their source so the
/// error threads a path back to the root value without an explicit stack.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
  #[error("schema '{schema}' expected {expected} but found {found}")]
  ShapeMismatch { schema: &'static str, expected: Shape, found: Shape },

  #[error("schema '{schema}' expected a value matching no branch's shape, found {found}")]
  NoMatchingShape { schema: &'static str, found: Shape },

  #[error("missing required field '{field}'")]
  MissingField { field: &'static str },

  #[error("field '{field}': {source}")]
  AtField { field: String, #[source] source: Box<ValidationError> },

  #[error("index {index}: {source}")]
  AtIndex { index: usize, #[source] source: Box<ValidationError> },

  #[error("schema '{schema}' expected length between {min:?} and {max:?}, got {actual}")]
  LengthOutOfRange { schema: &'static str, min: Option<u64>, max: Option<u64>, actual: u64 },

  #[error("schema '{schema}' value did not match the required pattern")]
  PatternMismatch { schema: &'static str },

  #[error("schema '{schema}' expected a value between {min:?} and {max:?}, got {actual}")]
  NumberOutOfRange { schema: &'static str, min: Option<f64>, max: Option<f64>, actual: f64 },

  #[error("schema '{schema}' expected a multiple of {multiple_of}")]
  NotMultipleOf { schema: &'static str, multiple_of: f64 },

  #[error("schema '{schema}' expected an integral number")]
  NotAnInteger { schema: &'static str },

  #[error("schema '{schema}' expected a finite number")]
  NotFinite { schema: &'static str },

  #[error("schema '{schema}' expected the literal '{expected}'")]
  LiteralMismatch { schema: &'static str, expected: &'static str },

  #[error("schema '{schema}' failed to decode: {message}")]
  SerdeDecodeFailed { schema: &'static str, message: String },
}
