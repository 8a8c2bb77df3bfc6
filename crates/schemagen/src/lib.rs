#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
//! Compiles an OpenAPI 3.1 document into generated Rust source: one typed
//! struct/enum per component schema plus its runtime validator
//! (`spec.md` §3–§4.6), and one request/response type pair plus a handler
//! signature per endpoint (`spec.md` §4.7).
//!
//! The crate is a pure, synchronous library (`spec.md` §5) — [`generate`] is
//! the one entry point; everything else is private to the compilation
//! pipeline it drives.

mod config;
mod context;
mod doc_override;
mod emit;
mod endpoint;
mod error;
mod ir;
mod naming;
mod orchestrator;
mod warning;

use std::path::Path;

use oas3::spec::ObjectOrReference;

pub use config::{BreakingChangeHandling, CodegenConfig, CompositionStrategy, EmitTargets};
pub use error::{CoreError, CoreResult, ErrorContext};
pub use warning::{Warning, WarningKind};

/// One synthesised source file (`spec.md` §6's "list of synthesised file
/// contents").
#[derive(Debug, Clone)]
pub struct GeneratedFile {
  pub name: String,
  pub contents: String,
}

/// Everything a successful run produces: the file list plus every warning
/// accumulated along the way (`spec.md` §6's exit/return shape).
#[derive(Debug, Clone)]
pub struct GenerationOutput {
  pub files: Vec<GeneratedFile>,
  pub warnings: Vec<Warning>,
}

/// The primary entry point (`spec.md` §6): compiles `spec`'s component
/// schemas and endpoints under `config`, returning the synthesised files
/// and accumulated warnings, or a fatal [`CoreError`].
///
/// `spec` is assumed pre-dereferenced (external `$ref`s already inlined);
/// internal `#/components/schemas/Name` references are resolved by name
/// against `spec.components.schemas`.
pub fn generate(spec: &oas3::Spec, config: &CodegenConfig) -> CoreResult<GenerationOutput> {
  if !config.include_tags.is_empty() && config.include_tags.iter().any(|t| config.exclude_tags.contains(t)) {
    return Err(CoreError::InvalidConfigError {
      context: ErrorContext::new().with_operation("include_tags/exclude_tags"),
    });
  }

  let mut warnings = Vec::new();
  let schemas = build_schema_context(spec, &mut warnings);

  let mut files = Vec::new();

  if config.targets.api {
    let schema_output = orchestrator::run(&schemas);
    warnings.extend(schema_output.warnings);
    files.push(render_schema_file(&schema_output));

    let endpoint_output = endpoint::run(spec, &schemas);
    warnings.extend(endpoint_output.warnings);
    files.extend(render_endpoint_files(endpoint_output.endpoints, config, &mut warnings));
  }

  Ok(GenerationOutput { files, warnings })
}

/// Resolves `spec.components.schemas` into the parser's `SchemaContext`,
/// parsing each entry once (`spec.md` §4.1's entry point), the way
/// `schema_registry.rs::new` walks the same map to seed its own registry.
fn build_schema_context(spec: &oas3::Spec, warnings: &mut Vec<crate::warning::Warning>) -> ir::SchemaContext {
  let mut schemas = ir::SchemaContext::new();
  let Some(components) = spec.components.as_ref() else { return schemas };

  for (name, schema_ref) in &components.schemas {
    let ObjectOrReference::Object(schema) = schema_ref else {
      warnings.push(crate::warning::Warning {
        path: name.clone(),
        kind: WarningKind::MissingSchema,
        message: "component schema given as a bare $ref; expected an inline schema object".to_string(),
      });
      continue;
    };
    let mut parse_warnings = Vec::new();
    let mut ctx = ir::parser::ParseCtx::new(name.clone(), &mut parse_warnings);
    let ty = ir::parser::parse(schema, &mut ctx);
    warnings.extend(parse_warnings);
    schemas.insert(name.clone(), ir::NamedSchema { name: name.clone(), description: schema.description.clone(), ty });
  }

  schemas
}

fn render_schema_file(output: &orchestrator::OrchestratorOutput) -> GeneratedFile {
  let type_items = output.schemas.iter().map(|s| &s.type_item);
  let schema_items = output.schemas.iter().map(|s| &s.schema_item);
  let tokens = quote::quote! {
    //! Generated component schema types and validators. Do not edit by hand.
    #(#type_items)*
    #(#schema_items)*
  };
  GeneratedFile { name: "schema.rs".to_string(), contents: render_tokens(tokens) }
}

/// Groups endpoints by `CodegenConfig::module_per_tag` and applies
/// `include_tags`/`exclude_tags` filtering, emitting one file per tag when
/// grouping is enabled or a single flat `api.rs` otherwise.
fn render_endpoint_files(endpoints: Vec<endpoint::EmittedEndpoint>, config: &CodegenConfig, warnings: &mut Vec<Warning>) -> Vec<GeneratedFile> {
  let allowed: Vec<_> = endpoints.into_iter().filter(|e| config.tag_allowed(&e.tag)).collect();

  if !config.module_per_tag {
    return vec![render_endpoint_group("api", &allowed, config, warnings)];
  }

  let mut by_tag: indexmap::IndexMap<String, Vec<endpoint::EmittedEndpoint>> = indexmap::IndexMap::new();
  for endpoint in allowed {
    by_tag.entry(endpoint.tag.clone()).or_default().push(endpoint);
  }
  by_tag.sort_keys();

  by_tag.into_iter().map(|(tag, group)| render_endpoint_group(&naming::to_rust_field_name(&tag), &group, config, warnings)).collect()
}

fn render_endpoint_group(module: &str, endpoints: &[endpoint::EmittedEndpoint], config: &CodegenConfig, warnings: &mut Vec<Warning>) -> GeneratedFile {
  let type_items = endpoints.iter().map(|e| &e.type_items);
  let schema_items = endpoints.iter().map(|e| &e.schema_items);

  let docs: Vec<_> = endpoints
    .iter()
    .map(|e| {
      let default_description = e.description.clone().or_else(|| e.summary.clone()).unwrap_or_default();
      match &config.doc_override_dir {
        Some(dir) => doc_override::resolve_description(dir, module, &e.name, &e.hash, &default_description, warnings),
        None => default_description,
      }
    })
    .collect();

  let fn_signatures = endpoints.iter().zip(&docs).map(|(e, doc)| {
    if doc.is_empty() {
      e.fn_signature.clone()
    } else {
      let doc_attr = quote::quote! { #[doc = #doc] };
      let sig = &e.fn_signature;
      quote::quote! { #doc_attr #sig }
    }
  });

  let trait_ident = syn::Ident::new(&inflections::case::to_pascal_case(&format!("{module}_api")), proc_macro2::Span::call_site());
  let module_doc = format!("Generated endpoint types, validators, and handler trait for the `{module}` tag group. Do not edit by hand.");

  let tokens = quote::quote! {
    #![doc = #module_doc]
    #(#type_items)*
    #(#schema_items)*

    pub trait #trait_ident {
      #(#fn_signatures)*
    }
  };

  GeneratedFile { name: format!("{module}.rs"), contents: render_tokens(tokens) }
}

/// Pretty-prints a token stream the way the orchestrator's file-header note
/// promises: mechanical formatting only, no prose generation
/// (`spec.md` §4.6 invariant 6 / Non-goals).
fn render_tokens(tokens: proc_macro2::TokenStream) -> String {
  match syn::parse2::<syn::File>(tokens.clone()) {
    Ok(file) => prettyplease::unparse(&file),
    Err(_) => tokens.to_string(),
  }
}
