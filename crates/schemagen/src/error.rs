//! The crate's public error boundary (`spec.md` §6/§7).
//!
//! Internally, traversal code returns `anyhow::Result` the way the teacher's
//! converters do (composing `.context(...)` freely); at the library entry
//! point those are folded into `UnknownError` so callers see a closed,
//! `thiserror`-derived enum rather than an opaque `anyhow::Error`.

use thiserror::Error;

/// Where a fatal error occurred, attached to every [`CoreError`] variant.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
  pub path: Option<String>,
  pub operation: Option<String>,
  pub schema: Option<String>,
}

impl ErrorContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_path(mut self, path: impl Into<String>) -> Self {
    self.path = Some(path.into());
    self
  }

  pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
    self.operation = Some(operation.into());
    self
  }

  pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
    self.schema = Some(schema.into());
    self
  }
}

impl std::fmt::Display for ErrorContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut parts = vec![];
    if let Some(ref p) = self.path {
      parts.push(format!("path={p}"));
    }
    if let Some(ref o) = self.operation {
      parts.push(format!("operation={o}"));
    }
    if let Some(ref s) = self.schema {
      parts.push(format!("schema={s}"));
    }
    write!(f, "{}", parts.join(", "))
  }
}

/// Fatal, short-circuiting failures (`spec.md` §6's exit/return list). Every
/// recoverable condition instead pushes a [`crate::warning::Warning`] and
/// the run continues — see `spec.md` §7's recoverable/fatal split.
#[derive(Debug, Error)]
pub enum CoreError {
  #[error("failed to resolve the OpenAPI specification ({context})")]
  SpecResolutionError { context: ErrorContext },

  #[error("failed to parse schema into IR ({context})")]
  SchemaParseError { context: ErrorContext },

  #[error("unresolved reference ({context})")]
  ReferenceError { context: ErrorContext },

  #[error("validation failed ({context})")]
  ValidationError { context: ErrorContext },

  #[error("circular schema dependency could not be resolved ({context})")]
  CircularSchemaError { context: ErrorContext },

  #[error("failed to write generated output ({context})")]
  FileWriteError { context: ErrorContext },

  #[error("invalid configuration ({context})")]
  InvalidConfigError { context: ErrorContext },

  #[error("unexpected error ({context}): {source}")]
  UnknownError {
    context: ErrorContext,
    #[source]
    source: anyhow::Error,
  },
}

impl CoreError {
  pub fn from_anyhow(context: ErrorContext, source: anyhow::Error) -> Self {
    Self::UnknownError { context, source }
  }
}

pub type CoreResult<T> = Result<T, CoreError>;
