//! Non-fatal diagnostics collected while generating: a schema that can't be
//! perfectly represented still produces something useful, with a note
//! attached to `spec.md` §6's warnings list rather than aborting the run.

use std::fmt;

/// A single non-fatal diagnostic, pinned to the schema path that produced it.
#[derive(Debug, Clone)]
pub struct Warning {
  pub path: String,
  pub kind: WarningKind,
  pub message: String,
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.path, self.message)
  }
}

/// The distinct situations the pipeline degrades gracefully from, named to
/// match `spec.md` §7's table exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
  /// An unresolved `$ref` fell back to an untyped value.
  FallbackToJson,
  /// `$ref`/composition nesting exceeded the parser's recursion limit.
  DepthLimitReached,
  /// An `allOf`/`anyOf`/`oneOf` mixed object and non-object members; only the
  /// object parts were merged.
  IntersectionNotFullySupported,
  /// A union couldn't be made runtime-discriminable; the last member's shape
  /// was used as a fallback.
  ComplexUnionSimplified,
  /// A schema was expected by name but not found in the component context.
  MissingSchema,
  /// A component schema participates in a dependency cycle that required
  /// back-edge removal to emit deterministically; if the cycle is a mutual
  /// one (not a literal self-reference), each side boxes its reference to
  /// the other to stay finitely sized. Ambient beyond spec.md §7's table
  /// (the table predates the orchestrator's cycle-tolerance design) — see
  /// DESIGN.md.
  CyclicSchema,
  /// A doc-override file's endpoint hash no longer matches the current spec.
  /// Ambient beyond spec.md §7's table for the same reason as `CyclicSchema`.
  StaleDocOverride,
}

impl fmt::Display for WarningKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::FallbackToJson => "fallback-to-json",
      Self::DepthLimitReached => "depth-limit-reached",
      Self::IntersectionNotFullySupported => "intersection-not-fully-supported",
      Self::ComplexUnionSimplified => "complex-union-simplified",
      Self::MissingSchema => "missing-schema",
      Self::CyclicSchema => "cyclic-schema",
      Self::StaleDocOverride => "stale-doc-override",
    };
    f.write_str(s)
  }
}
