//! The doc-override workflow (`spec.md` §6): a per-endpoint markdown file
//! with a frontmatter block and two sections, letting a human-edited
//! description win over the spec's own `summary`/`description` as long as
//! its recorded hash still matches the endpoint it was written against.
//!
//! No pack example parses this exact frontmatter-plus-sections format (it
//! is bespoke to this spec's external-interface surface), so the line-based
//! parser below is hand-rolled rather than borrowed from a YAML/Markdown
//! crate — the format is a handful of flat `key: value` pairs plus two
//! `##`-headed sections, well short of justifying a parser dependency the
//! rest of the pack never reaches for either.

use std::path::Path;

use crate::warning::{Warning, WarningKind};

const EMPTY_OVERRIDE_PLACEHOLDER: &str = "<!-- Empty - no override -->";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocOverride {
  pub(crate) endpoint: String,
  pub(crate) method: String,
  pub(crate) hash: String,
  pub(crate) host: Option<String>,
  pub(crate) version: Option<String>,
  pub(crate) operation_id: Option<String>,
  pub(crate) default_description: String,
  pub(crate) r#override: Option<String>,
}

/// Parses one doc-override file's contents. Returns `None` if the
/// frontmatter block is missing or doesn't carry the required keys
/// (`endpoint`, `method`, `hash`) — treated as "no override present"
/// rather than a fatal error, matching `spec.md` §7's recoverable slant.
pub(crate) fn parse(contents: &str) -> Option<DocOverride> {
  let rest = contents.strip_prefix("---\n")?;
  let end = rest.find("\n---")?;
  let frontmatter = &rest[..end];
  let body = &rest[end + 4..];

  let mut endpoint = None;
  let mut method = None;
  let mut hash = None;
  let mut host = None;
  let mut version = None;
  let mut operation_id = None;

  for line in frontmatter.lines() {
    let Some((key, value)) = line.split_once(':') else { continue };
    let value = value.trim().to_string();
    match key.trim() {
      "endpoint" => endpoint = Some(value),
      "method" => method = Some(value),
      "hash" => hash = Some(value),
      "host" => host = Some(value),
      "version" => version = Some(value),
      "operationId" => operation_id = Some(value),
      _ => {}
    }
  }

  let default_description = extract_section(body, "## Default Description").unwrap_or_default();
  let override_section = extract_section(body, "## Override");
  let r#override = override_section.and_then(|s| {
    let fenced = strip_fence(&s)?;
    let trimmed = fenced.trim();
    if trimmed.is_empty() || trimmed == EMPTY_OVERRIDE_PLACEHOLDER { None } else { Some(trimmed.to_string()) }
  });

  Some(DocOverride { endpoint: endpoint?, method: method?, hash: hash?, host, version, operation_id, default_description, r#override })
}

/// Pulls the text between a `## Heading` line and the next `##` heading
/// (or end of document).
fn extract_section(body: &str, heading: &str) -> Option<String> {
  let start = body.find(heading)? + heading.len();
  let tail = &body[start..];
  let end = tail[1..].find("\n## ").map(|i| i + 1).unwrap_or(tail.len());
  Some(tail[..end].trim().to_string())
}

/// Strips one fenced code block (```` ``` ````-delimited) from a section's
/// text, returning its inner content.
fn strip_fence(section: &str) -> Option<String> {
  let start = section.find("```")? + 3;
  let after_open = &section[start..];
  let first_newline = after_open.find('\n').unwrap_or(0);
  let inner_start = first_newline + 1;
  let end = after_open.find("\n```")?;
  Some(after_open[inner_start..end].to_string())
}

/// Resolves the description to use for one endpoint: an override wins if
/// its file's hash still matches the endpoint's current hash; otherwise the
/// spec's own default is used and a [`WarningKind::StaleDocOverride`] is
/// recorded.
pub(crate) fn resolve_description(dir: &Path, module: &str, operation: &str, current_hash: &str, default_description: &str, warnings: &mut Vec<Warning>) -> String {
  let path = dir.join(module).join(format!("{operation}.md"));
  let Ok(contents) = std::fs::read_to_string(&path) else {
    return default_description.to_string();
  };
  let Some(doc) = parse(&contents) else {
    return default_description.to_string();
  };

  if doc.hash != current_hash {
    warnings.push(Warning {
      path: format!("{module}/{operation}"),
      kind: WarningKind::StaleDocOverride,
      message: format!("doc override hash `{}` no longer matches current endpoint hash `{current_hash}`; using the default description", doc.hash),
    });
    return default_description.to_string();
  }

  doc.r#override.unwrap_or(default_description.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "---\nendpoint: /pets/{petId}\nmethod: GET\nhash: deadbeef\noperationId: getPet\n---\n## Default Description\nFetch a pet by id.\n\n## Override\n```\nA friendlier description of fetching one pet.\n```\n";

  #[test]
  fn parses_frontmatter_and_both_sections() {
    let doc = parse(SAMPLE).expect("parses");
    assert_eq!(doc.endpoint, "/pets/{petId}");
    assert_eq!(doc.method, "GET");
    assert_eq!(doc.hash, "deadbeef");
    assert_eq!(doc.operation_id.as_deref(), Some("getPet"));
    assert_eq!(doc.default_description, "Fetch a pet by id.");
    assert_eq!(doc.r#override.as_deref(), Some("A friendlier description of fetching one pet."));
  }

  #[test]
  fn empty_override_placeholder_yields_no_override() {
    let sample = "---\nendpoint: /pets\nmethod: GET\nhash: abc\n---\n## Default Description\nList pets.\n\n## Override\n```\n<!-- Empty - no override -->\n```\n";
    let doc = parse(sample).expect("parses");
    assert!(doc.r#override.is_none());
  }

  #[test]
  fn resolve_description_falls_back_and_warns_on_hash_mismatch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let module_dir = dir.path().join("pets");
    std::fs::create_dir_all(&module_dir).expect("mkdir");
    std::fs::write(module_dir.join("get_pet.md"), SAMPLE).expect("write");

    let mut warnings = Vec::new();
    let resolved = resolve_description(dir.path(), "pets", "get_pet", "staleHash", "Fetch a pet by id.", &mut warnings);
    assert_eq!(resolved, "Fetch a pet by id.");
    assert_eq!(warnings.len(), 1);
    assert!(matches!(warnings[0].kind, WarningKind::StaleDocOverride));
  }

  #[test]
  fn resolve_description_uses_override_when_hash_matches() {
    let dir = tempfile::tempdir().expect("tempdir");
    let module_dir = dir.path().join("pets");
    std::fs::create_dir_all(&module_dir).expect("mkdir");
    std::fs::write(module_dir.join("get_pet.md"), SAMPLE).expect("write");

    let mut warnings = Vec::new();
    let resolved = resolve_description(dir.path(), "pets", "get_pet", "deadbeef", "Fetch a pet by id.", &mut warnings);
    assert_eq!(resolved, "A friendlier description of fetching one pet.");
    assert!(warnings.is_empty());
  }
}
