//! The per-top-level-schema generation context shared by the type emitter
//! and the schema emitter (`spec.md` §4.3's field-for-field agreement
//! invariant).
//!
//! The type emitter runs first and populates `extracted_types`; the schema
//! emitter runs second against the *same* context and so sees exactly the
//! types the type emitter already committed to, by construction rather than
//! by re-deriving names independently. Deduplication keys on
//! [`crate::ir::IrType::structural_eq`] via `pretty_key`, mirroring the
//! teacher's `SharedSchemaCache::hash_schema` dedup-by-canonical-key idea
//! but keyed on the IR's own `pretty_key` string in a plain
//! `HashMap<String, usize>`, rather than a blake3 digest of re-serialised
//! `ObjectSchema` JSON.

use std::collections::BTreeSet;

use crate::{
  ir::{IrType, SchemaContext},
  naming::{ensure_unique, to_rust_type_name},
  warning::{Warning, WarningKind},
};

/// One type the context has committed a name to, in first-registered order.
/// Both emitters iterate `extracted_types` in this order, which is what
/// keeps generated output byte-identical across runs (`spec.md` §4.6).
pub(crate) struct ExtractedType {
  pub(crate) name: String,
  pub(crate) ty: IrType,
}

pub(crate) struct GenerationContext<'a> {
  pub(crate) path: String,
  pub(crate) inside_component_schemas: bool,
  pub(crate) available_schemas: &'a SchemaContext,
  pub(crate) module_prefix: String,
  pub(crate) self_ref_name: Option<String>,
  /// Other component-schema names that form a mutual dependency cycle with
  /// the schema currently being emitted. A reference to the *same* name as
  /// `self_ref_name` is handled by the fixed-point `recursive` combinator;
  /// a reference to one of these peers is an ordinary forward reference to
  /// a distinct schema, but still needs `Box` on the type side, since two
  /// structs directly containing each other are an infinite-size type.
  pub(crate) cyclic_peers: BTreeSet<String>,
  pub(crate) warnings: Vec<Warning>,
  extracted_types: Vec<ExtractedType>,
  dedup_index: std::collections::HashMap<String, usize>,
  used_names: BTreeSet<String>,
  extract_counter: usize,
}

impl<'a> GenerationContext<'a> {
  pub(crate) fn new(path: impl Into<String>, module_prefix: impl Into<String>, available_schemas: &'a SchemaContext) -> Self {
    Self {
      path: path.into(),
      inside_component_schemas: false,
      available_schemas,
      module_prefix: module_prefix.into(),
      self_ref_name: None,
      cyclic_peers: BTreeSet::new(),
      warnings: Vec::new(),
      extracted_types: Vec::new(),
      dedup_index: std::collections::HashMap::new(),
      used_names: BTreeSet::new(),
      extract_counter: 0,
    }
  }

  /// Whether a reference to `name` needs `Box` indirection to keep the
  /// containing type finitely sized: either `name` is the schema currently
  /// being emitted (literal self-reference) or it is one of its mutual-cycle
  /// peers.
  pub(crate) fn requires_boxing(&self, name: &str) -> bool {
    self.self_ref_name.as_deref() == Some(name) || self.cyclic_peers.contains(name)
  }

  pub(crate) fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
    self.warnings.push(Warning { path: self.path.clone(), kind, message: message.into() });
  }

  pub(crate) fn reserve_name(&mut self, name: &str) {
    self.used_names.insert(name.to_string());
  }

  /// Registers `ty` under `base_name`, returning the name it was ultimately
  /// given. A structurally-equal type already registered returns its
  /// existing name instead of minting a new one — the dedup step
  /// `spec.md` §3 invariant 3 requires.
  pub(crate) fn extract_type(&mut self, base_name: &str, ty: IrType) -> String {
    let key = ty.pretty_key();

    if let Some(&idx) = self.dedup_index.get(&key) {
      return self.extracted_types[idx].name.clone();
    }

    let candidate = to_rust_type_name(base_name);
    let name = ensure_unique(&candidate, &self.used_names);
    self.used_names.insert(name.clone());

    let idx = self.extracted_types.len();
    self.dedup_index.insert(key, idx);
    self.extracted_types.push(ExtractedType { name: name.clone(), ty });
    self.extract_counter += 1;

    name
  }

  /// Looks up a previously extracted type by the name the type emitter gave
  /// it — the handle the schema emitter uses to emit the matching validator
  /// without re-deriving the extraction decision.
  pub(crate) fn extracted(&self, name: &str) -> Option<&IrType> {
    self.extracted_types.iter().find(|e| e.name == name).map(|e| &e.ty)
  }

  pub(crate) fn extracted_types(&self) -> &[ExtractedType] {
    &self.extracted_types
  }

  pub(crate) fn extract_count(&self) -> usize {
    self.extract_counter
  }

  pub(crate) fn scoped(&mut self, segment: &str, f: impl FnOnce(&mut Self)) {
    let saved_path = self.path.clone();
    self.path = format!("{saved_path}.{segment}");
    f(self);
    self.path = saved_path;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::NumericConstraints;

  #[test]
  fn extract_type_dedups_structurally_equal_types() {
    let schemas = SchemaContext::new();
    let mut ctx = GenerationContext::new("root", "", &schemas);
    let a = ctx.extract_type("Count", IrType::Integer(NumericConstraints::default()));
    let b = ctx.extract_type("Quantity", IrType::Integer(NumericConstraints::default()));
    assert_eq!(a, b);
    assert_eq!(ctx.extract_count(), 1);
  }

  #[test]
  fn extract_type_disambiguates_name_collisions() {
    let schemas = SchemaContext::new();
    let mut ctx = GenerationContext::new("root", "", &schemas);
    ctx.reserve_name("Pet");
    let name = ctx.extract_type("Pet", IrType::Boolean);
    assert_eq!(name, "Pet2");
  }

  #[test]
  fn schema_emitter_sees_same_names_type_emitter_produced() {
    let schemas = SchemaContext::new();
    let mut ctx = GenerationContext::new("root", "", &schemas);
    let name = ctx.extract_type("Tag", IrType::String(Default::default()));
    assert!(matches!(ctx.extracted(&name), Some(IrType::String(_))));
  }
}
