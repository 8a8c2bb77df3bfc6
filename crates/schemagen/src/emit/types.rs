//! Lowers `IrType` to Rust type syntax (`spec.md` §4.2).

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use super::{intersection, union, FieldIdent};
use crate::{
  context::GenerationContext,
  ir::{IrType, Literal},
  naming::to_rust_type_name,
  warning::WarningKind,
};

/// Lowers a type expression appearing under a type constructor (array
/// element, option parameter, field type) — the `inline=true` position of
/// `spec.md` §4.2's table. Object/Union/Intersection shapes that require a
/// named declaration in this position are extracted into the generation
/// context rather than rendered inline.
pub(crate) fn lower(ty: &IrType, ctx: &mut GenerationContext) -> TokenStream {
  match ty {
    IrType::String(_) => quote! { String },
    IrType::Number(_) => quote! { f64 },
    IrType::Integer(_) => quote! { i64 },
    IrType::Boolean => quote! { bool },
    IrType::Null => quote! { () },
    IrType::Unknown => quote! { serde_json::Value },
    IrType::Literal(lit) => lower_literal_primitive(lit),
    IrType::Array { items, .. } => {
      let item = lower(items, ctx);
      quote! { Vec<#item> }
    }
    IrType::Object { properties, additional_properties } if properties.is_empty() => match additional_properties {
      Some(value_ty) => {
        let value = lower(value_ty, ctx);
        quote! { indexmap::IndexMap<String, #value> }
      }
      None => quote! { serde_json::Map<String, serde_json::Value> },
    },
    IrType::Object { .. } => {
      let base = path_base_name(&ctx.path);
      let name = ctx.extract_type(&base, ty.clone());
      let ident = format_ident!("{name}");
      quote! { #ident }
    }
    IrType::Option(inner) => lower_option(inner, ctx),
    IrType::Reference(name) => {
      if !ctx.requires_boxing(name) && !ctx.available_schemas.contains_key(name) {
        ctx.warn(WarningKind::FallbackToJson, format!("reference to unknown schema `{name}`; falling back to an untyped value"));
        return quote! { serde_json::Value };
      }
      lower_reference(name, ctx)
    }
    IrType::Union(members) => lower_union(members, ctx),
    IrType::Intersection(members) => lower_intersection(members, ctx),
  }
}

fn path_base_name(path: &str) -> String {
  path.rsplit('.').next().unwrap_or(path).to_string()
}

fn lower_literal_primitive(lit: &Literal) -> TokenStream {
  match lit {
    Literal::Str(_) => quote! { String },
    Literal::Number(_) => quote! { f64 },
    Literal::Boolean(_) => quote! { bool },
    Literal::Null => quote! { () },
  }
}

fn lower_reference(name: &str, ctx: &GenerationContext) -> TokenStream {
  let ident = format_ident!("{}", to_rust_type_name(name));
  // Boxed not only for a literal self-reference but also for a mutual-cycle
  // peer (`ctx.cyclic_peers`): two structs directly containing each other
  // would otherwise be an infinite-size type.
  if ctx.requires_boxing(name) {
    quote! { Box<#ident> }
  } else {
    quote! { #ident }
  }
}

/// Wraps `inner` in `Option<...>`, eliding the wrap if `inner` already
/// carries nullability (double-option guard, `spec.md` §4.2/§8 invariant 3).
fn lower_option(inner: &IrType, ctx: &mut GenerationContext) -> TokenStream {
  if inner.is_nullish() {
    return lower(inner, ctx);
  }
  let lowered = lower(inner, ctx);
  quote! { Option<#lowered> }
}

fn lower_union(members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  let (has_null, decision) = union::decide(members);
  let base = match decision {
    union::UnionDecision::OptionOf(inner) => return lower_option(&inner, ctx),
    union::UnionDecision::ArrayPlusElement(item) => {
      let item_tokens = lower(&item, ctx);
      return if has_null { quote! { Option<Vec<#item_tokens>> } } else { quote! { Vec<#item_tokens> } };
    }
    union::UnionDecision::PolymorphicVariant(_) | union::UnionDecision::UnboxedVariant(_) => {
      let name = path_base_name(&ctx.path);
      let extracted = ctx.extract_type(&name, IrType::Union(members.to_vec()));
      let ident = format_ident!("{extracted}");
      quote! { #ident }
    }
    union::UnionDecision::Fallback(last) => {
      ctx.warn(WarningKind::ComplexUnionSimplified, "union members have overlapping runtime shapes; falling back to the last member");
      lower(&last, ctx)
    }
  };
  if has_null {
    quote! { Option<#base> }
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
      let ident = format_ident!("{name}");
      quote! { #ident }
    }
    intersection::IntersectionDecision::Mixed(merged) => {
      ctx.warn(WarningKind::IntersectionNotFullySupported, "intersection mixes object and non-object members; only object parts were merged");
      let base = path_base_name(&ctx.path);
      let name = ctx.extract_type(&base, merged);
      let ident = format_ident!("{name}");
      quote! { #ident }
    }
  }
}

/// Renders the top-level item for one named schema — a `pub struct`,
/// `pub enum`, or `pub type` alias, depending on `ty`'s outer shape. Used
/// both for the schema's own declaration and, identically, for every
/// auxiliary type the generation context accumulated while lowering it.
pub(crate) fn render_item(name: &str, ty: &IrType, ctx: &mut GenerationContext) -> TokenStream {
  let ident = format_ident!("{}", to_rust_type_name(name));
  match ty {
    IrType::Object { properties, additional_properties } => render_struct(&ident, properties, additional_properties.as_deref(), ctx),
    IrType::Union(members) => render_union_item(&ident, members, ctx),
    IrType::Intersection(members) => render_intersection_item(&ident, members, ctx),
    other => {
      let aliased = lower(other, ctx);
      quote! { pub type #ident = #aliased; }
    }
  }
}

fn render_struct(ident: &syn::Ident, properties: &[crate::ir::ObjectField], additional_properties: Option<&IrType>, ctx: &mut GenerationContext) -> TokenStream {
  if properties.is_empty() {
    return match additional_properties {
      Some(value_ty) => {
        let value = lower(value_ty, ctx);
        quote! { pub type #ident = indexmap::IndexMap<String, #value>; }
      }
      None => quote! { pub type #ident = serde_json::Map<String, serde_json::Value>; },
    };
  }

  let fields = properties.iter().map(|field| {
    let field_ident = FieldIdent::new(&field.name);
    let ident = &field_ident.ident;
    let saved_path = ctx.path.clone();
    ctx.path = format!("{saved_path}.{}", field.name);
    let mut field_ty = lower(&field.ty, ctx);
    ctx.path = saved_path;
    if !field.required && !field.ty.is_nullish() {
      field_ty = quote! { Option<#field_ty> };
    }
    let rename_attr = field_ident.renamed.then(|| {
      let json_name = &field_ident.json_name;
      quote! { #[serde(rename = #json_name)] }
    });
    let deprecated_attr = field.deprecated.then(|| quote! { #[deprecated] });
    let doc = field.description.as_ref().map(|d| quote! { #[doc = #d] });
    quote! {
      #doc
      #rename_attr
      #deprecated_attr
      pub #ident: #field_ty,
    }
  });

  quote! {
    #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
    pub struct #ident {
      #(#fields)*
    }
  }
}

fn render_union_item(ident: &syn::Ident, members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  let (has_null, decision) = union::decide(members);
  match decision {
    union::UnionDecision::OptionOf(inner) => {
      let aliased = lower(&inner, ctx);
      quote! { pub type #ident = Option<#aliased>; }
    }
    union::UnionDecision::ArrayPlusElement(item) => {
      let item_tokens = lower(&item, ctx);
      quote! { pub type #ident = Vec<#item_tokens>; }
    }
    union::UnionDecision::PolymorphicVariant(labels) => {
      let variants = labels.iter().map(|label| {
        let variant_ident = format_ident!("{}", to_rust_type_name(label));
        quote! {
          #[serde(rename = #label)]
          #variant_ident,
        }
      });
      if has_null {
        let inner_ident = format_ident!("{ident}Inner");
        quote! {
          #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
          pub enum #inner_ident {
            #(#variants)*
          }
          pub type #ident = Option<#inner_ident>;
        }
      } else {
        quote! {
          #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
          pub enum #ident {
            #(#variants)*
          }
        }
      }
    }
    union::UnionDecision::UnboxedVariant(branches) => {
      let variants = branches.iter().map(|branch| {
        let variant_ident = format_ident!("{}", branch.label);
        let member_ty = lower(&branch.member, ctx);
        quote! { #variant_ident(#member_ty), }
      });
      if has_null {
        let inner_ident = format_ident!("{ident}Inner");
        quote! {
          #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
          #[serde(untagged)]
          pub enum #inner_ident {
            #(#variants)*
          }
          pub type #ident = Option<#inner_ident>;
        }
      } else {
        quote! {
          #[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
          #[serde(untagged)]
          pub enum #ident {
            #(#variants)*
          }
        }
      }
    }
    union::UnionDecision::Fallback(last) => {
      ctx.warn(WarningKind::ComplexUnionSimplified, "union members have overlapping runtime shapes; falling back to the last member");
      let aliased = lower(&last, ctx);
      quote! { pub type #ident = #aliased; }
    }
  }
}

fn render_intersection_item(ident: &syn::Ident, members: &[IrType], ctx: &mut GenerationContext) -> TokenStream {
  match intersection::decide(members) {
    intersection::IntersectionDecision::AllReferences(last) | intersection::IntersectionDecision::NoObjects(last) => {
      let aliased = lower(&last, ctx);
      quote! { pub type #ident = #aliased; }
    }
    intersection::IntersectionDecision::AllObjects(IrType::Object { properties, additional_properties }) => {
      render_struct(ident, &properties, additional_properties.as_deref(), ctx)
    }
    intersection::IntersectionDecision::Mixed(IrType::Object { properties, additional_properties }) => {
      ctx.warn(WarningKind::IntersectionNotFullySupported, "intersection mixes object and non-object members; only object parts were merged");
      render_struct(ident, &properties, additional_properties.as_deref(), ctx)
    }
    _ => unreachable!("intersection::decide always wraps merged members in IrType::Object"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ir::{NumericConstraints, ObjectField, SchemaContext, StringConstraints};

  fn ctx(schemas: &SchemaContext) -> GenerationContext<'_> {
    GenerationContext::new("Pet", "", schemas)
  }

  #[test]
  fn pet_struct_has_three_fields_with_optional_tag() {
    let schemas = SchemaContext::new();
    let mut generation_ctx = ctx(&schemas);
    let ty = IrType::Object {
      properties: vec![
        ObjectField { name: "id".to_string(), ty: IrType::Integer(NumericConstraints::default()), required: true, description: None, deprecated: false },
        ObjectField { name: "name".to_string(), ty: IrType::String(StringConstraints::default()), required: true, description: None, deprecated: false },
        ObjectField { name: "tag".to_string(), ty: IrType::String(StringConstraints::default()), required: false, description: None, deprecated: false },
      ],
      additional_properties: None,
    };
    let rendered = render_item("Pet", &ty, &mut generation_ctx).to_string();
    assert!(rendered.contains("pub struct Pet"));
    assert!(rendered.contains("pub id : i64"));
    assert!(rendered.contains("pub tag : Option < String >"));
  }

  #[test]
  fn enum_renders_polymorphic_variant() {
    let schemas = SchemaContext::new();
    let mut generation_ctx = GenerationContext::new("Visibility", "", &schemas);
    let ty = IrType::Union(
      ["public", "home", "followers", "specified"].into_iter().map(|s| IrType::Literal(Literal::Str(s.to_string()))).collect(),
    );
    let rendered = render_item("Visibility", &ty, &mut generation_ctx).to_string();
    assert!(rendered.contains("pub enum Visibility"));
    assert!(rendered.contains("Public"));
  }

  #[test]
  fn nullable_reference_does_not_double_option() {
    let schemas = SchemaContext::new();
    let mut generation_ctx = ctx(&schemas);
    let ty = IrType::Option(Box::new(IrType::Reference("Note".to_string())));
    let rendered = lower(&ty, &mut generation_ctx).to_string();
    assert_eq!(rendered, quote! { Option < Note > }.to_string());
  }

  #[test]
  fn self_referential_field_is_boxed() {
    let schemas = SchemaContext::new();
    let mut generation_ctx = GenerationContext::new("Folder", "", &schemas);
    generation_ctx.self_ref_name = Some("Folder".to_string());
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
    let rendered = render_item("Folder", &ty, &mut generation_ctx).to_string();
    assert!(rendered.contains("pub parent : Option < Box < Folder > >"), "self-referential field must be boxed to stay a finite-size type: {rendered}");
  }
}
