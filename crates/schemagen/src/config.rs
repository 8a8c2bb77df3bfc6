//! `CodegenConfig`: the closed set of configuration options the core accepts
//! (`spec.md` §6), built with `bon`'s derive macro the way the teacher builds
//! its AST value objects (`generator/ast/mod.rs`'s `#[derive(..., bon::Builder)]`
//! structs).

use std::path::PathBuf;

/// How multiple fork specifications compose into one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositionStrategy {
  /// Each fork is emitted independently.
  Separate,
  /// Forks share one base module, diffing against it.
  #[default]
  SharedBase,
}

/// Policy for a detected breaking change between fork specifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakingChangeHandling {
  Error,
  #[default]
  Warn,
  Ignore,
}

/// Which emitters a run should exercise. The schema-compilation core always
/// runs the type and schema emitters; these flags gate the peripheral
/// wrapper/declaration emitters that sit outside this crate's in-scope work
/// (`spec.md` §1's Non-goals) but are still named here since `spec.md` §6
/// lists them as part of the configuration surface a caller can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, bon::Builder)]
pub struct EmitTargets {
  #[builder(default = true)]
  pub api: bool,
  #[builder(default)]
  pub wrapper: bool,
  #[builder(default)]
  pub dts: bool,
  #[builder(default)]
  pub ts_wrapper: bool,
}

impl Default for EmitTargets {
  fn default() -> Self {
    Self { api: true, wrapper: false, dts: false, ts_wrapper: false }
  }
}

#[derive(Debug, Clone, bon::Builder)]
pub struct CodegenConfig {
  #[builder(default)]
  pub strategy: CompositionStrategy,

  #[builder(default = true)]
  pub module_per_tag: bool,

  #[builder(default)]
  pub include_tags: Vec<String>,

  #[builder(default)]
  pub exclude_tags: Vec<String>,

  #[builder(default)]
  pub generate_diff_report: bool,

  #[builder(default)]
  pub breaking_change_handling: BreakingChangeHandling,

  #[builder(default)]
  pub targets: EmitTargets,

  #[builder(into)]
  pub base_instance_name: Option<String>,

  #[builder(into)]
  pub base_module_prefix: Option<String>,

  pub doc_override_dir: Option<PathBuf>,
}

impl Default for CodegenConfig {
  fn default() -> Self {
    Self {
      strategy: CompositionStrategy::default(),
      module_per_tag: true,
      include_tags: Vec::new(),
      exclude_tags: Vec::new(),
      generate_diff_report: false,
      breaking_change_handling: BreakingChangeHandling::default(),
      targets: EmitTargets::default(),
      base_instance_name: None,
      base_module_prefix: None,
      doc_override_dir: None,
    }
  }
}

impl CodegenConfig {
  /// `true` if `tag` survives the `include_tags`/`exclude_tags` filters.
  pub(crate) fn tag_allowed(&self, tag: &str) -> bool {
    if !self.include_tags.is_empty() && !self.include_tags.iter().any(|t| t == tag) {
      return false;
    }
    !self.exclude_tags.iter().any(|t| t == tag)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_config_matches_documented_defaults() {
    let config = CodegenConfig::default();
    assert_eq!(config.strategy, CompositionStrategy::SharedBase);
    assert!(config.module_per_tag);
    assert!(config.targets.api);
  }

  #[test]
  fn tag_allowed_respects_include_and_exclude() {
    let config = CodegenConfig::builder().include_tags(vec!["pets".to_string()]).exclude_tags(vec!["internal".to_string()]).build();
    assert!(config.tag_allowed("pets"));
    assert!(!config.tag_allowed("orders"));
    assert!(!config.tag_allowed("internal"));
  }
}
