//! The endpoint emitter (`spec.md` §4.7): one request type+validator pair,
//! one response type+validator pair, and a handler signature per operation.
//!
//! Operation-name derivation mirrors `cache.rs::infer_name_from_context`'s
//! singularization (`cruet::to_singular`) when no `operationId` is present;
//! the first-of-{200,201,202,204}-with-content response selection and the
//! `()`-marker fallback follow `spec.md` §4.7 directly. Response variant
//! naming and SSE/streaming splitting (`converter/responses.rs`) are not
//! carried forward — out of scope per `spec.md`'s Non-goals on wire
//! transport and runtime execution of generated clients.

use oas3::spec::Operation;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use crate::{
  context::GenerationContext,
  emit::{schema, types},
  ir::{self, SchemaContext},
  naming::{to_rust_field_name, to_rust_type_name},
  warning::{Warning, WarningKind},
};

/// The four success codes the emitter consults, in the order `spec.md`
/// §4.7 names them.
const RESPONSE_CODES: [&str; 4] = ["200", "201", "202", "204"];

pub(crate) struct EmittedEndpoint {
  pub(crate) name: String,
  pub(crate) hash: String,
  pub(crate) method: String,
  pub(crate) path: String,
  /// The OpenAPI tag this endpoint groups under, or `"default"` when
  /// untagged — used for `CodegenConfig::module_per_tag` grouping.
  pub(crate) tag: String,
  pub(crate) summary: Option<String>,
  pub(crate) description: Option<String>,
  pub(crate) type_items: TokenStream,
  pub(crate) schema_items: TokenStream,
  pub(crate) fn_signature: TokenStream,
}

pub(crate) struct EndpointOutput {
  pub(crate) endpoints: Vec<EmittedEndpoint>,
  pub(crate) warnings: Vec<Warning>,
}

/// Walks every HTTP operation in `spec`, emitting one [`EmittedEndpoint`]
/// per operation. Paths and, within a path, methods are sorted
/// lexicographically before emission — `spec.md` §4.6 invariant 6's
/// byte-identical-output guarantee applies to the endpoint emitter too, and
/// `oas3::spec::Paths`/`PathItem` make no ordering guarantee of their own
/// (the teacher's `main.rs` sorts both for the same reason).
pub(crate) fn run(spec: &oas3::Spec, schemas: &SchemaContext) -> EndpointOutput {
  let mut endpoints = Vec::new();
  let mut warnings = Vec::new();

  let Some(paths) = spec.paths.as_ref() else {
    return EndpointOutput { endpoints, warnings };
  };

  let mut path_entries: Vec<_> = paths.iter().collect();
  path_entries.sort_by(|(a, _), (b, _)| a.cmp(b));

  for (path, item) in path_entries {
    let mut methods: Vec<_> = item.methods().into_iter().collect();
    methods.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));

    for (method, operation) in methods {
      let method = method.as_str();
      let name = operation_name(operation, path, method);
      let hash = endpoint_hash(path, method, operation);

      let mut ctx = GenerationContext::new(format!("endpoints.{name}"), String::new(), schemas);

      let request = build_request(spec, operation, path, &name, &mut ctx);
      let response = build_response(spec, operation, path, &name, &mut ctx);

      let fn_signature = render_signature(&name, method, path, request.as_ref(), response.as_ref());

      let mut type_items = TokenStream::new();
      let mut schema_items = TokenStream::new();
      if let Some(body) = &request {
        type_items.extend(body.type_item.clone());
        schema_items.extend(body.schema_item.clone());
      }
      if let Some(body) = &response {
        type_items.extend(body.type_item.clone());
        schema_items.extend(body.schema_item.clone());
      }

      let mut cursor = 0;
      while cursor < ctx.extracted_types().len() {
        let (aux_name, aux_ty) = {
          let extracted = &ctx.extracted_types()[cursor];
          (extracted.name.clone(), extracted.ty.clone())
        };
        type_items.extend(types::render_item(&aux_name, &aux_ty, &mut ctx));
        schema_items.extend(schema::render_item(&aux_name, &aux_ty, &mut ctx));
        cursor += 1;
      }

      let tag = operation.tags.first().cloned().unwrap_or_else(|| "default".to_string());

      warnings.extend(ctx.warnings.drain(..));
      endpoints.push(EmittedEndpoint {
        name,
        hash,
        method: method.to_string(),
        path: path.clone(),
        tag,
        summary: operation.summary.clone(),
        description: operation.description.clone(),
        type_items,
        schema_items,
        fn_signature,
      });
    }
  }

  EndpointOutput { endpoints, warnings }
}

struct Body {
  /// The Rust type name the request/response struct was given.
  type_name: String,
  type_item: TokenStream,
  schema_item: TokenStream,
}

/// Derives an operation name from the explicit `operationId` if present,
/// else from `method + path` with path parameters and separators
/// normalised — `spec.md` §4.7's rule — singularizing the final static
/// path segment the way `cache.rs::infer_name_from_context` does for
/// inline request/response body names.
fn operation_name(operation: &Operation, path: &str, method: &str) -> String {
  if let Some(id) = operation.operation_id.as_deref().filter(|s| !s.is_empty()) {
    return to_rust_field_name(id);
  }

  let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
  let normalized: Vec<String> = segments
    .iter()
    .map(|s| if s.starts_with('{') && s.ends_with('}') { "by".to_string() } else { cruet::to_singular(s) })
    .collect();

  let base = if normalized.is_empty() { method.to_lowercase() } else { format!("{}_{}", method.to_lowercase(), normalized.join("_")) };
  to_rust_field_name(&base)
}

/// A stable 32-bit fingerprint over path + method + operation id + summary +
/// description, hex-formatted (`spec.md` §6), reusing the `blake3`
/// dependency the extracted-type cache already relies on
/// (`converter/hashing.rs`'s canonical-hashing pattern, specialised here to
/// a plain string join since there is no schema to canonicalize).
fn endpoint_hash(path: &str, method: &str, operation: &Operation) -> String {
  let joined = format!(
    "{path}\u{0}{method}\u{0}{}\u{0}{}\u{0}{}",
    operation.operation_id.as_deref().unwrap_or(""),
    operation.summary.as_deref().unwrap_or(""),
    operation.description.as_deref().unwrap_or(""),
  );
  let digest = blake3::hash(joined.as_bytes());
  let truncated = u32::from_be_bytes(digest.as_bytes()[..4].try_into().expect("4 bytes"));
  format!("{truncated:08x}")
}

/// Builds the request type+validator pair, if `operation` declares a
/// request body schema (`converter/requests.rs`'s body-field resolution,
/// minus parameter-struct assembly, which is a Non-goal here).
fn build_request(spec: &oas3::Spec, operation: &Operation, path: &str, op_name: &str, ctx: &mut GenerationContext) -> Option<Body> {
  let body_ref = operation.request_body.as_ref()?;
  let Ok(body) = body_ref.resolve(spec) else {
    ctx.warn(WarningKind::MissingSchema, "request body reference could not be resolved");
    return None;
  };

  let (_, media_type) = body.content.iter().next()?;
  let schema_ref = media_type.schema.as_ref()?;

  let name = to_rust_type_name(&format!("{op_name}_request"));
  let mut warnings = Vec::new();
  let ty = ir::parser::parse_body_schema(schema_ref, &format!("{path}.requestBody"), &mut warnings);
  ctx.warnings.extend(warnings);
  let optimized = ir::optimizer::optimize(ty, ctx.available_schemas);

  let required = body.required.unwrap_or(false);
  let optimized = if required { optimized } else { ir::IrType::option(optimized) };

  ctx.reserve_name(&name);
  let type_item = types::render_item(&name, &optimized, ctx);
  let schema_item = schema::render_item(&name, &optimized, ctx);

  Some(Body { type_name: name, type_item, schema_item })
}

/// Builds the response type+validator pair for the first of
/// {200, 201, 202, 204} declared with content; `None` means the `()`
/// marker applies (`spec.md` §4.7).
fn build_response(spec: &oas3::Spec, operation: &Operation, path: &str, op_name: &str, ctx: &mut GenerationContext) -> Option<Body> {
  let responses = operation.responses.as_ref()?;

  for code in RESPONSE_CODES {
    let Some(resp_ref) = responses.get(code) else { continue };
    let Ok(response) = resp_ref.resolve(spec) else {
      ctx.warn(WarningKind::MissingSchema, format!("response `{code}` could not be resolved"));
      continue;
    };
    let Some((_, media_type)) = response.content.iter().next() else { continue };
    let Some(schema_ref) = media_type.schema.as_ref() else { continue };

    let name = to_rust_type_name(&format!("{op_name}_response"));
    let mut warnings = Vec::new();
    let ty = ir::parser::parse_body_schema(schema_ref, &format!("{path}.responses.{code}"), &mut warnings);
    ctx.warnings.extend(warnings);
    let optimized = ir::optimizer::optimize(ty, ctx.available_schemas);

    ctx.reserve_name(&name);
    let type_item = types::render_item(&name, &optimized, ctx);
    let schema_item = schema::render_item(&name, &optimized, ctx);

    return Some(Body { type_name: name, type_item, schema_item });
  }

  None
}

/// Renders the handler's signature only — no body. The core's Non-goals
/// exclude wire transport and runtime execution of generated clients, so
/// there is nothing this crate could put in the body; callers supply an
/// implementation (see `DESIGN.md`'s endpoint-emitter entry).
fn render_signature(name: &str, method: &str, path: &str, request: Option<&Body>, response: Option<&Body>) -> TokenStream {
  let fn_ident = format_ident!("{}", to_rust_field_name(name));
  let doc = format!("`{method} {path}`");

  let param = request.map(|r| {
    let ty = format_ident!("{}", r.type_name);
    quote! { request: #ty }
  });

  let ret = match response {
    Some(r) => {
      let ty = format_ident!("{}", r.type_name);
      quote! { #ty }
    }
    None => quote! { () },
  };

  match param {
    Some(param) => quote! {
      #[doc = #doc]
      fn #fn_ident(&self, #param) -> #ret;
    },
    None => quote! {
      #[doc = #doc]
      fn #fn_ident(&self) -> #ret;
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn operation_from_json(json: serde_json::Value) -> Operation {
    serde_json::from_value(json).expect("valid Operation fixture")
  }

  #[test]
  fn operation_name_prefers_operation_id() {
    let op = operation_from_json(serde_json::json!({ "operationId": "listPets" }));
    assert_eq!(operation_name(&op, "/pets", "GET"), "list_pets");
  }

  #[test]
  fn operation_name_falls_back_to_method_and_singularized_path() {
    let op = operation_from_json(serde_json::json!({}));
    assert_eq!(operation_name(&op, "/pets/{petId}", "GET"), "get_pet_by");
  }

  #[test]
  fn endpoint_hash_is_stable_for_identical_inputs() {
    let op = operation_from_json(serde_json::json!({ "operationId": "listPets", "summary": "List all pets" }));
    let a = endpoint_hash("/pets", "GET", &op);
    let b = endpoint_hash("/pets", "GET", &op);
    assert_eq!(a, b);
    assert_eq!(a.len(), 8);
  }

  #[test]
  fn endpoint_hash_differs_when_operation_id_changes() {
    let a = operation_from_json(serde_json::json!({ "operationId": "listPets" }));
    let b = operation_from_json(serde_json::json!({ "operationId": "listOwners" }));
    assert_ne!(endpoint_hash("/pets", "GET", &a), endpoint_hash("/pets", "GET", &b));
  }

  #[test]
  fn run_emits_request_and_response_for_a_simple_operation() {
    let spec: oas3::Spec = serde_json::from_value(serde_json::json!({
      "openapi": "3.1.0",
      "info": { "title": "t", "version": "1" },
      "paths": {
        "/pets": {
          "post": {
            "operationId": "createPet",
            "requestBody": {
              "required": true,
              "content": { "application/json": { "schema": { "type": "object", "properties": { "name": { "type": "string" } }, "required": ["name"] } } }
            },
            "responses": {
              "201": {
                "description": "created",
                "content": { "application/json": { "schema": { "type": "object", "properties": { "id": { "type": "integer" } }, "required": ["id"] } } }
              }
            }
          }
        }
      }
    }))
    .expect("valid spec");

    let schemas = SchemaContext::new();
    let output = run(&spec, &schemas);
    assert_eq!(output.endpoints.len(), 1);
    assert_eq!(output.endpoints[0].name, "create_pet");
    assert!(output.warnings.is_empty());
  }
}
