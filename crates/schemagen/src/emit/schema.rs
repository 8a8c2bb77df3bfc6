//! Lowers `IrType` to `schemagen_support::Schema<T>`-builder syntax
//! (`spec.md` §4.5). Mirrors `emit::types` field-for-field, consulting the
//! same [`GenerationContext`] so an extracted auxiliary type and its
//! validator always share one name.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{intersection, union};
use crate::{
  context::GenerationContext,
  ir::{IrType, Literal, ObjectField},
  naming::{to_rust_field_name, to_rust_type_name},
  warning::WarningKind,
};

fn schema_fn_ident(name: &str) -> syn::Ident {
  format_ident!("{}_schema", to_rust_field_name(name))
}

fn self_binding_ident(name: &str) -> syn::Ident {
  format_ident!("{}_self", to_rust_field_name(name))
}

fn path_base_name(path: &str) -> String {
  path.rsplit('.').next().unwrap_or(path).to_string()
}

/// Lowers a `Schema<T>`-building expression for `ty`, extracting and
/// referencing auxiliary validators the same way [`super::types::lower`]
/// extracts and references auxiliary types.
pub(crate) fn lower(ty: &IrType, ctx: &mut GenerationContext) -> TokenStream {
  match ty {
    IrType::String(c) => lower_string(c),
    IrType::Number(c) => lower_number(c),
    IrType::Integer(c) => lower_integer(c),
    IrType::Boolean => quote! { schemagen_support::boolean() },
    IrType::Null => quote! { schemagen_support::null() },
    IrType::Unknown => quote! { schemagen_support::unknown() },
    IrType::Literal(Literal::Str(s)) => quote! { schemagen_support::literal_str(#s) },
    IrType::Literal(Literal::Number(_)) => quote! { schemagen_support::number() },
    IrType::Literal(Literal::Boolean(_)) => quote! { schemagen_support::boolean() },
    IrType::Literal(Literal::Null) => quote! { schemagen_support::null() },
    IrType::Array { items, .. } => {
      let item_schema = lower(items, ctx);
      quote! { schemagen_support::array(#item_schema) }
    }
    IrType::Object { properties, additional_properties } if properties.is_empty() => match additional_properties {
      Some(value_ty) => {
        let value_schema = lower(value_ty, ctx);
        quote! { schemagen_support::dictionary(#value_schema) }
      }
      None => quote! { schemagen_support::unknown() },
    },
    IrType::Object { .. } => {
      let base = path_base_name(&ctx.path);
      let name = ctx.extract_type(&base, ty.clone());
      reference_call(&name, ctx)
    }
    IrType::Option(inner) => {
      let inner_schema = lower(inner, ctx);
      quote! { schemagen_support::option(#inner_schema) }
    }
    IrType::Reference(name) => {
      if ctx.self_ref_name.as_deref() != Some(name.as_str()) && !ctx.available_schemas.contains_key(name) {
        ctx.warn(WarningKind::FallbackToJson, format!("reference to unknown schema `{name}`; falling back to an untyped value"));
        return quote! { schemagen_support::unknown() };
      }
      reference_call(name, ctx)
    }
    IrType::Union(members) => lower_union(members, ctx),
    IrType::Intersection(members) => lower_intersection(members, ctx),
  }
}

/// Lowers a reference to its validator call, matching
/// [`super::types::lower_reference`]'s `Box<...>` wrap field-for-field: the
/// type emitter boxes *every* occurrence of a schema's own name (not just
/// the top-level recursive field), so the schema emitter must box the
/// matching validator call the same way or the two disagree on the
/// decoded type (`Schema<Folder>` vs. the struct's `Box<Folder>` field).
///
/// A mutual-cycle peer (`ctx.cyclic_peers`) is boxed the same way, but via
/// an ordinary call to its own `_schema()` function rather than the
/// self-binding: it is a distinct schema with its own fixed point (or none,
/// if it isn't itself self-referential), not a recursive occurrence of the
/// one currently being built.
fn reference_call(name: &str, ctx: &GenerationContext) -> TokenStream {
  if ctx.self_ref_name.as_deref() == Some(name) {
    let binding = self_binding_ident(name);
    quote! { schemagen_support::boxed(#binding.clone()) }
  } else if ctx.cyclic_peers.contains(name) {
    let fn_ident = schema_fn_ident(name);
    quote! { schemagen_support::boxed(#fn_ident()) }
  } else {
    let fn_ident = schema_fn_ident(name);
    quote! { #fn_ident() }
  }
}

fn lower_string(c: &crate::ir::StringConstraints) -> TokenStream {
  if c.min_len.is_none() && c.max_len.is_none() && c.pattern.is_none() {
    return quote! { schemagen_support::string() };
  }
  let min = opt_tokens(c.min_len);
  let max = opt_tokens(c.max_len);
  let pattern = match &c.pattern {
    Some(p) => quote! { Some(#p) },
    None => quote! { None },
  };
  quote! { schemagen_support::string_constrained(#min, #max, #pattern) }
}

fn lower_number(c: &crate::ir::NumericConstraints) -> TokenStream {
  if c.min.is_none() && c.max.is_none() && c.multiple_of.is_none() {
    return quote! { schemagen_support::number() };
  }
  let min = opt_tokens(c.min);
  let max = opt_tokens(c.max);
  let multiple_of = opt_tokens(c.multiple_of);
  quote! { schemagen_support::number_constrained(#min, #max, #multiple_of) }
}

fn lower_integer(c: &crate::ir::NumericConstraints) -> TokenStream {
  if c.min.is_none() && c.max.is_none() && c.multiple_of.is_none() {
    return quote! { schemagen_support::integer() };
  }
  let min = opt_tokens(c.min);
  let max = opt_tokens(c.max);
  let multiple_of = opt_tokens(c.multiple_of);
  quote! { schemagen_support::integer_constrained(#min, #max, #multiple_of) }
}

fn opt_tokens<T: quote::ToTokens>(value: Option<T>) -> TokenStream {
  match value {
    Some(v) => quote! { Some(#v) },
    None => quote! { None },
  }
}

fn lower_union(members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  let (has_null, decision) = union::decide(members);
  let base = match decision {
    union::UnionDecision::OptionOf(inner) => {
      let inner_schema = lower(&inner, ctx);
      return quote! { schemagen_support::option(#inner_schema) };
    }
    union::UnionDecision::ArrayPlusElement(item) => {
      let item_schema = lower(&item, ctx);
      let array_schema = quote! { schemagen_support::array(#item_schema) };
      return if has_null { quote! { schemagen_support::option(#array_schema) } } else { array_schema };
    }
    union::UnionDecision::PolymorphicVariant(_) | union::UnionDecision::UnboxedVariant(_) => {
      let name = path_base_name(&ctx.path);
      let extracted = ctx.extract_type(&name, IrType::Union(members.to_vec()));
      reference_call(&extracted, ctx)
    }
    union::UnionDecision::Fallback(last) => {
      ctx.warn(WarningKind::ComplexUnionSimplified, "union members have overlapping runtime shapes; falling back to the last member");
      lower(&last, ctx)
    }
  };
  if has_null {
    quote! { schemagen_support::option(#base) }
  } else {
    base
  }
}

fn lower_intersection(members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  match intersection::decide(members) {
    intersection::IntersectionDecision::AllReferences(last) | intersection::IntersectionDecision::NoObjects(last) => lower(&last, ctx),
    intersection::IntersectionDecision::AllObjects(merged) => {
      let base = path_base_name(&ctx.path);
      let name = ctx.extract_type(&base, merged);
      reference_call(&name, ctx)
    }
    intersection::IntersectionDecision::Mixed(merged) => {
      ctx.warn(WarningKind::IntersectionNotFullySupported, "intersection mixes object and non-object members; only object parts were merged");
      let base = path_base_name(&ctx.path);
      let name = ctx.extract_type(&base, merged);
      reference_call(&name, ctx)
    }
  }
}

/// Renders the `pub fn <name>_schema() -> Schema<Name>` item for one named
/// schema (top-level or extracted auxiliary), wrapping the body in
/// `recursive(...)` when the schema references its own name.
///
/// Self-referentiality is decided once per top-level emission, by the
/// orchestrator, and carried on `ctx.self_ref_name` for the lifetime of
/// that emission (including every auxiliary type it extracts) — this
/// function only reads that flag, it does not rediscover or reset it,
/// so the type emitter's earlier pass over the same schema and this one
/// agree on which name is self-referential (`spec.md` §3 invariant 4).
pub(crate) fn render_item(name: &str, ty: &IrType, ctx: &mut GenerationContext) -> TokenStream {
  let type_ident = format_ident!("{}", to_rust_type_name(name));
  let fn_ident = schema_fn_ident(name);

  let is_self_referential = ctx.self_ref_name.as_deref() == Some(name);

  let body = render_body(ty, ctx);

  if is_self_referential {
    let binding = self_binding_ident(name);
    quote! {
      pub fn #fn_ident() -> schemagen_support::Schema<#type_ident> {
        schemagen_support::recursive(#name, |#binding| {
          #body
        })
      }
    }
  } else {
    quote! {
      pub fn #fn_ident() -> schemagen_support::Schema<#type_ident> {
        #body
      }
    }
  }
}

fn render_body(ty: &IrType, ctx: &mut GenerationContext) -> TokenStream {
  match ty {
    IrType::Object { properties, additional_properties } => render_object_body(properties, additional_properties.as_deref(), ctx),
    IrType::Union(members) => render_union_body(members, ctx),
    IrType::Intersection(members) => render_intersection_body(members, ctx),
    other => lower(other, ctx),
  }
}

/// Direct counterpart to [`super::types::render_union_item`]: builds the
/// schema for a *named* union item's own body. Unlike [`lower_union`] (used
/// when a union appears nested inside a field/array/option and must be
/// outlined through the generation context), this never re-extracts the
/// union it is already rendering — doing so would mint a second name and
/// have the first schema function call the second forever.
fn render_union_body(members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  let (has_null, decision) = union::decide(members);
  let type_ident = format_ident!("{}", to_rust_type_name(&path_base_name(&ctx.path)));
  match decision {
    union::UnionDecision::OptionOf(inner) => {
      let inner_schema = lower(&inner, ctx);
      quote! { schemagen_support::option(#inner_schema) }
    }
    union::UnionDecision::ArrayPlusElement(item) => {
      let item_schema = lower(&item, ctx);
      let array_schema = quote! { schemagen_support::array(#item_schema) };
      if has_null { quote! { schemagen_support::option(#array_schema) } } else { array_schema }
    }
    union::UnionDecision::PolymorphicVariant(_) | union::UnionDecision::UnboxedVariant(_) => {
      let inner_ident = if has_null { format_ident!("{type_ident}Inner") } else { type_ident };
      let decoded = quote! { schemagen_support::via_serde::<#inner_ident>(stringify!(#inner_ident)) };
      if has_null { quote! { schemagen_support::option(#decoded) } } else { decoded }
    }
    union::UnionDecision::Fallback(last) => {
      ctx.warn(WarningKind::ComplexUnionSimplified, "union members have overlapping runtime shapes; falling back to the last member");
      let lowered = lower(&last, ctx);
      if has_null { quote! { schemagen_support::option(#lowered) } } else { lowered }
    }
  }
}

/// Direct counterpart to [`super::types::render_intersection_item`]; see
/// [`render_union_body`] for why this must not delegate to
/// [`lower_intersection`].
fn render_intersection_body(members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  match intersection::decide(members) {
    intersection::IntersectionDecision::AllReferences(last) | intersection::IntersectionDecision::NoObjects(last) => lower(&last, ctx),
    intersection::IntersectionDecision::AllObjects(IrType::Object { properties, additional_properties }) => {
      render_object_body(&properties, additional_properties.as_deref(), ctx)
    }
    intersection::IntersectionDecision::Mixed(IrType::Object { properties, additional_properties }) => {
      ctx.warn(WarningKind::IntersectionNotFullySupported, "intersection mixes object and non-object members; only object parts were merged");
      render_object_body(&properties, additional_properties.as_deref(), ctx)
    }
    _ => unreachable!("intersection::decide always wraps merged members in IrType::Object"),
  }
}

fn render_object_body(properties: &[ObjectField], additional_properties: Option<&IrType>, ctx: &mut GenerationContext) -> TokenStream {
  if properties.is_empty() {
    if let Some(value_ty) = additional_properties {
      let value_schema = lower(value_ty, ctx);
      return quote! { schemagen_support::dictionary(#value_schema) };
    }
    return quote! { schemagen_support::unknown() };
  }

  let struct_name = path_base_name(&ctx.path);
  let type_ident = format_ident!("{}", to_rust_type_name(&struct_name));

  let field_exprs = properties.iter().map(|field| {
    let ident = {
      let bare = to_rust_field_name(&field.name);
      let bare = bare.trim_start_matches("r#");
      if to_rust_field_name(&field.name).starts_with("r#") {
        syn::Ident::new_raw(bare, proc_macro2::Span::call_site())
      } else {
        syn::Ident::new(bare, proc_macro2::Span::call_site())
      }
    };
    let json_name = &field.name;

    let saved_path = ctx.path.clone();
    ctx.path = format!("{saved_path}.{}", field.name);
    let field_schema = lower(&field.ty, ctx);
    ctx.path = saved_path;

    let value = if field.required {
      quote! { schemagen_support::field(obj, #json_name, &(#field_schema))? }
    } else if field.ty.is_nullish() {
      quote! { schemagen_support::field_or(obj, #json_name, &(#field_schema), None)? }
    } else {
      quote! { schemagen_support::field_or(obj, #json_name, &schemagen_support::nullable_as_option(#field_schema), None)? }
    };

    quote! { #ident: #value, }
  });

  quote! {
    schemagen_support::object(stringify!(#type_ident), move |obj| {
      Ok(#type_ident {
        #(#field_exprs)*
      })
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::{NumericConstraints, SchemaContext, StringConstraints};

  #[test]
  fn pet_validator_uses_field_and_field_or() {
    let schemas = SchemaContext::new();
    let mut ctx = GenerationContext::new("Pet", "", &schemas);
    let ty = IrType::Object {
      properties: vec![
        ObjectField { name: "id".to_string(), ty: IrType::Integer(NumericConstraints::default()), required: true, description: None, deprecated: false },
        ObjectField { name: "name".to_string(), ty: IrType::String(StringConstraints::default()), required: true, description: None, deprecated: false },
        ObjectField { name: "tag".to_string(), ty: IrType::String(StringConstraints::default()), required: false, description: None, deprecated: false },
      ],
      additional_properties: None,
    };
    let rendered = render_item("Pet", &ty, &mut ctx).to_string();
    assert!(rendered.contains("field (obj , \"id\""));
    assert!(rendered.contains("field_or (obj , \"tag\""));
    assert!(rendered.contains("nullable_as_option"));
  }

  #[test]
  fn self_referential_schema_wraps_in_recursive_combinator() {
    let schemas = SchemaContext::new();
    let mut ctx = GenerationContext::new("Folder", "", &schemas);
    ctx.self_ref_name = Some("Folder".to_string());
    let ty = IrType::Object {
      properties: vec![
        ObjectField { name: "id".to_string(), ty: IrType::String(StringConstraints::default()), required: true, description: None, deprecated: false },
        ObjectField {
          name: "parent".to_string(),
          ty: IrType::Option(Box::new(IrType::Reference("Folder".to_string()))),
          required: false,
          description: None,
          deprecated: false,
        },
      ],
      additional_properties: None,
    };
    let rendered = render_item("Folder", &ty, &mut ctx).to_string();
    assert!(rendered.contains("recursive (\"Folder\""));
    assert!(rendered.contains("folder_self"));
    assert!(
      rendered.contains("boxed (folder_self . clone ())"),
      "self-referencing validator call must box to match the type emitter's `Box<Folder>` field: {rendered}"
    );
  }

  #[test]
  fn top_level_polymorphic_union_delegates_to_serde_without_self_extraction() {
    let schemas = SchemaContext::new();
    let mut ctx = GenerationContext::new("Visibility", "", &schemas);
    let ty = IrType::Union(
      ["public", "home", "followers", "specified"].into_iter().map(|s| IrType::Literal(crate::ir::Literal::Str(s.to_string()))).collect(),
    );
    let rendered = render_item("Visibility", &ty, &mut ctx).to_string();
    assert!(rendered.contains("via_serde :: < Visibility > (stringify ! (Visibility))"));
    assert_eq!(ctx.extract_count(), 0, "rendering a named union's own body must not extract a second copy of itself");
  }
}
