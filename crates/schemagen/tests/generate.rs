//! End-to-end exercises of `schemagen::generate` covering several of
//! spec.md §8's concrete seed scenarios.

use schemagen::CodegenConfig;
use serde_json::json;

fn spec_with_schemas(schemas: serde_json::Value) -> oas3::Spec {
  let spec_json = json!({
    "openapi": "3.1.0",
    "info": { "title": "Test API", "version": "1.0.0" },
    "paths": {},
    "components": { "schemas": schemas }
  });
  serde_json::from_value(spec_json).expect("valid minimal OpenAPI document")
}

fn schema_file(output: &schemagen::GenerationOutput) -> &str {
  &output.files.iter().find(|f| f.name == "schema.rs").expect("schema.rs emitted").contents
}

#[test]
fn pet_object_emits_record_with_optional_tag() {
  let spec = spec_with_schemas(json!({
    "Pet": {
      "type": "object",
      "properties": {
        "id": { "type": "integer" },
        "name": { "type": "string" },
        "tag": { "type": "string" }
      },
      "required": ["id", "name"]
    }
  }));

  let output = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();
  assert!(output.warnings.is_empty(), "unexpected warnings: {:?}", output.warnings);

  let src = schema_file(&output);
  assert!(src.contains("pub struct Pet"), "{src}");
  assert!(src.contains("pub id: i64") || src.contains("pub id: i32"), "{src}");
  assert!(src.contains("pub name: String"), "{src}");
  assert!(src.contains("pub tag: Option<String>"), "{src}");
  assert!(src.contains("field(obj, \"id\""), "{src}");
  assert!(src.contains("field(obj, \"name\""), "{src}");
  assert!(src.contains("field_or(obj, \"tag\""), "{src}");
  assert!(src.contains("nullable_as_option"), "{src}");
}

#[test]
fn string_enum_lowers_to_polymorphic_variant() {
  let spec = spec_with_schemas(json!({
    "Visibility": {
      "enum": ["public", "home", "followers", "specified"]
    }
  }));

  let output = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();
  let src = schema_file(&output);

  assert!(src.contains("pub enum Visibility"), "{src}");
  for tag in ["Public", "Home", "Followers", "Specified"] {
    assert!(src.contains(tag), "missing variant {tag} in: {src}");
  }
}

#[test]
fn nullable_reference_field_is_not_double_optioned() {
  let spec = spec_with_schemas(json!({
    "Note": {
      "type": "object",
      "properties": { "body": { "type": "string" } },
      "required": ["body"]
    },
    "Memo": {
      "type": "object",
      "properties": {
        "note": {
          "oneOf": [
            { "$ref": "#/components/schemas/Note" },
            { "type": "null" }
          ]
        }
      },
      "required": []
    }
  }));

  let output = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();
  let src = schema_file(&output);

  assert!(src.contains("pub note: Option<Note>"), "{src}");
  assert!(!src.contains("Option<Option<"), "double-option leaked: {src}");
  assert!(src.contains("schemagen_support::option("), "{src}");
}

#[test]
fn discriminable_union_emits_unboxed_variant_with_matching_auxiliaries() {
  let spec = spec_with_schemas(json!({
    "Holder": {
      "type": "object",
      "properties": {
        "value": {
          "oneOf": [
            { "type": "string" },
            { "type": "integer" },
            { "type": "boolean" }
          ]
        }
      },
      "required": ["value"]
    }
  }));

  let output = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();
  assert!(output.warnings.iter().all(|w| w.kind != schemagen::WarningKind::ComplexUnionSimplified), "{:?}", output.warnings);

  let src = schema_file(&output);
  assert!(src.contains("shape"), "expected shape-tagged branches: {src}");
}

#[test]
fn self_referential_schema_boxes_field_and_wraps_validator_in_fixed_point() {
  let spec = spec_with_schemas(json!({
    "Folder": {
      "type": "object",
      "properties": {
        "id": { "type": "string" },
        "parent": { "$ref": "#/components/schemas/Folder" }
      },
      "required": ["id"]
    }
  }));

  let output = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();
  let src = schema_file(&output);

  assert!(src.contains("pub struct Folder"), "{src}");
  assert!(src.contains("Option<Box<Folder>>"), "self-reference must be boxed: {src}");
  assert!(src.contains("recursive(\"Folder\""), "validator must be fixed-point wrapped: {src}");
  assert!(src.contains("boxed(folder_self.clone())"), "validator must box to match the Box<Folder> field: {src}");
}

#[test]
fn mutually_cyclic_schemas_still_emit_deterministically_with_a_warning() {
  let spec = spec_with_schemas(json!({
    "A": {
      "type": "object",
      "properties": { "b": { "$ref": "#/components/schemas/B" } },
      "required": ["b"]
    },
    "B": {
      "type": "object",
      "properties": { "a": { "$ref": "#/components/schemas/A" } },
      "required": ["a"]
    }
  }));

  let first = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();
  let second = schemagen::generate(&spec, &CodegenConfig::default()).unwrap();

  assert_eq!(schema_file(&first), schema_file(&second), "generation must be deterministic");
  assert!(first.warnings.iter().any(|w| w.kind == schemagen::WarningKind::CyclicSchema), "{:?}", first.warnings);

  // Neither A nor B is self-referential, but they directly contain each
  // other, so both sides of the cycle must be boxed or the generated
  // structs would be infinite-sized.
  let src = schema_file(&first);
  assert!(src.contains("pub b: Box<B>"), "{src}");
  assert!(src.contains("pub a: Box<A>"), "{src}");
}
