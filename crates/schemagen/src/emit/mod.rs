//! The two lowering engines (`spec.md` §4.2–§4.5): [`types`] lowers
//! `IrType` to Rust type syntax, [`schema`] lowers the same `IrType` to
//! `schemagen_support::Schema<T>`-builder syntax. Both consult the same
//! [`crate::context::GenerationContext`] so they agree on which inline
//! complex types got promoted to names (`spec.md` §3 invariant 3); the
//! shared discriminability analysis in [`union`] is what keeps their union
//! lowering decisions identical.

pub(crate) mod intersection;
pub(crate) mod schema;
pub(crate) mod types;
pub(crate) mod union;

use crate::naming::to_rust_field_name;

/// A field's escaped Rust identifier plus, when it differs from the source
/// JSON name, the `serde(rename = "...")` attribute carrying the original
/// spelling (`spec.md` §9's "keyword escaping and field renaming" note).
pub(crate) struct FieldIdent {
  pub(crate) ident: syn::Ident,
  pub(crate) json_name: String,
  pub(crate) renamed: bool,
}

impl FieldIdent {
  pub(crate) fn new(json_name: &str) -> Self {
    let rust_name = to_rust_field_name(json_name);
    let bare = rust_name.trim_start_matches("r#");
    let renamed = bare != json_name;
    let ident = if rust_name.starts_with("r#") {
      syn::Ident::new_raw(bare, proc_macro2::Span::call_site())
    } else {
      syn::Ident::new(bare, proc_macro2::Span::call_site())
    };
    Self { ident, json_name: json_name.to_string(), renamed }
  }
}
