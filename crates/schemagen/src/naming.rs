//! Identifier sanitisation: turning arbitrary JSON-Schema property/schema
//! names into valid, idiomatic Rust identifiers.

use std::{
  char::{ToLowercase, ToUppercase},
  collections::{BTreeSet, HashSet},
  iter::Peekable,
  sync::LazyLock,
};

use any_ascii::any_ascii;
use inflections::Inflect;
use regex::Regex;

pub(crate) static FORBIDDEN_IDENTIFIERS: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  [
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for", "if", "impl", "in",
    "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "async", "await", "dyn", "try", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "gen", "self", "Self",
  ]
  .into_iter()
  .collect()
});

static RESERVED_PASCAL_CASE: LazyLock<HashSet<&str>> = LazyLock::new(|| {
  ["Clone", "Copy", "Display", "Self", "Send", "Sync", "Type", "Vec"].into_iter().collect()
});

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());
static MULTI_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Transliterates to ASCII, replaces invalid characters with underscores,
/// collapses consecutive underscores, and trims leading/trailing underscores.
pub(crate) fn sanitize(input: &str) -> String {
  if input.is_empty() {
    return String::new();
  }

  let ascii = any_ascii(input);
  let replaced = INVALID_CHARS_RE.replace_all(&ascii, "_");
  let collapsed = MULTI_UNDERSCORE_RE.replace_all(&replaced, "_");

  collapsed.trim_matches('_').to_string()
}

/// Ensures a name is unique within a set of already-used names, appending a
/// numeric suffix if needed (rule grounded in the extracted-type cache's
/// collision handling, `spec.md` §4.3).
pub(crate) fn ensure_unique(base_name: &str, used_names: &BTreeSet<String>) -> String {
  if !used_names.contains(base_name) {
    return base_name.to_string();
  }
  let mut i = 2;
  loop {
    let candidate = format!("{base_name}{i}");
    if !used_names.contains(&candidate) {
      return candidate;
    }
    i += 1;
  }
}

/// Converts a string into a valid Rust field name (`snake_case`).
///
/// 1. A leading `-` is stripped and `negative_` prepended.
/// 2. Sanitises, then converts to `snake_case`.
/// 3. `self`, `crate` and `super` get a trailing underscore (they can't be
///    escaped as raw identifiers).
/// 4. Any other keyword gets a raw-identifier prefix (`r#`).
/// 5. A leading digit gets an `_` prefix.
/// 6. An empty result becomes `_`.
pub(crate) fn to_rust_field_name(name: &str) -> String {
  let has_leading_minus = name.starts_with('-');
  let name_without_minus = name.strip_prefix('-').unwrap_or(name);

  let mut ident = sanitize(name_without_minus).to_snake_case();

  if ident.is_empty() {
    return "_".to_string();
  }

  if has_leading_minus {
    ident = format!("negative_{ident}");
  }

  // `self`, `crate` and `super` are strict keywords that rustc refuses to
  // accept as raw identifiers (`r#self`/`r#crate`/`r#super` are all rejected),
  // unlike ordinary keywords such as `fn` or `match`, so these need an actual
  // rename instead of the generic raw-identifier escape below.
  match ident.as_str() {
    "self" => return "self_".to_string(),
    "crate" => return "crate_".to_string(),
    "super" => return "super_".to_string(),
    _ => {}
  }

  if FORBIDDEN_IDENTIFIERS.contains(ident.as_str()) {
    return format!("r#{ident}");
  }

  prefix_if_digit_start(&mut ident, '_');
  ident
}

pub(crate) fn to_rust_const_name(input: &str) -> String {
  let sanitized = sanitize(input);
  if sanitized.is_empty() {
    return "UNNAMED".to_string();
  }

  let mut ident = sanitized.to_constant_case();
  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, '_');
  }
  ident
}

/// Converts a string into a valid Rust type name (`PascalCase`).
///
/// 1. A leading `-` is stripped and `Negative` prepended.
/// 2. Mixed-case input with no separators (e.g. `XMLParser`) keeps its
///    capitalisation rather than being re-cased word-by-word.
/// 3. Otherwise, sanitises and converts to `PascalCase`.
/// 4. A reserved name (`Vec`, `Self`, ...) gets a raw-identifier prefix.
/// 5. A leading digit gets a `T` prefix.
/// 6. An empty result becomes `Unnamed`.
pub(crate) fn to_rust_type_name(name: &str) -> String {
  let has_leading_minus = name.starts_with('-');
  let name_without_minus = name.strip_prefix('-').unwrap_or(name);

  let has_separators = name_without_minus.contains(['-', '_', '.', ' ']);
  let has_upper = name_without_minus.chars().any(|c| c.is_ascii_uppercase());
  let has_lower = name_without_minus.chars().any(|c| c.is_ascii_lowercase());
  let appears_mixed_case = !has_separators && has_upper && has_lower;

  let mut ident = if appears_mixed_case {
    let ascii = any_ascii(name_without_minus);
    let cleaned: String = ascii.chars().filter(char::is_ascii_alphanumeric).collect();

    if cleaned.is_empty() {
      cleaned
    } else {
      let mut chars = cleaned.chars();
      match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
      }
    }
  } else {
    let ascii = any_ascii(name_without_minus);
    ascii.chars().capitalize_words_with_boundaries().filter(char::is_ascii_alphanumeric).collect()
  };

  if ident.is_empty() {
    return "Unnamed".to_string();
  }

  if has_leading_minus {
    ident = format!("Negative{ident}");
  }

  // `Self` is a strict keyword and, unlike `Vec`/`Clone`/etc., cannot be
  // escaped with a raw-identifier prefix (`r#Self` is rejected by rustc);
  // it needs an actual rename instead.
  if ident == "Self" {
    return "SelfSchema".to_string();
  }

  if RESERVED_PASCAL_CASE.contains(ident.as_str()) {
    return format!("r#{ident}");
  }

  prefix_if_digit_start(&mut ident, 'T');
  ident
}

fn prefix_if_digit_start(ident: &mut String, prefix: char) {
  if ident.starts_with(|c: char| c.is_ascii_digit()) {
    ident.insert(0, prefix);
  }
}

/// An extension trait for char iterators to add word capitalisation, used by
/// [`to_rust_type_name`] to PascalCase a sanitized, separator-delimited name.
trait CapitalizeWordsExt: Iterator<Item = char> {
  fn capitalize_words_with_boundaries(self) -> CapitalizeWordsWithBoundaries<Self>
  where
    Self: Sized;
}

impl<I> CapitalizeWordsExt for I
where
  I: Iterator<Item = char>,
{
  fn capitalize_words_with_boundaries(self) -> CapitalizeWordsWithBoundaries<Self>
  where
    Self: Sized,
  {
    CapitalizeWordsWithBoundaries { iter: self.peekable(), capitalize_next: true, prev_was_lower: false, pending_upper: None, pending_lower: None }
  }
}

struct CapitalizeWordsWithBoundaries<I>
where
  I: Iterator<Item = char>,
{
  iter: Peekable<I>,
  capitalize_next: bool,
  prev_was_lower: bool,
  pending_upper: Option<ToUppercase>,
  pending_lower: Option<ToLowercase>,
}

impl<I> Iterator for CapitalizeWordsWithBoundaries<I>
where
  I: Iterator<Item = char>,
{
  type Item = char;

  fn next(&mut self) -> Option<Self::Item> {
    if let Some(ref mut upper_iter) = self.pending_upper {
      if let Some(c) = upper_iter.next() {
        return Some(c);
      }
      self.pending_upper = None;
    }

    if let Some(ref mut lower_iter) = self.pending_lower {
      if let Some(c) = lower_iter.next() {
        return Some(c);
      }
      self.pending_lower = None;
    }

    let c = self.iter.next()?;

    if !c.is_ascii_alphanumeric() {
      self.capitalize_next = self.iter.peek().is_some_and(char::is_ascii_alphanumeric);
      self.prev_was_lower = false;
      return Some(c);
    }

    let is_lower = c.is_ascii_lowercase();
    let is_upper = c.is_ascii_uppercase();

    let should_capitalize =
      self.capitalize_next || (self.prev_was_lower && is_upper) || (is_upper && self.iter.peek().is_some_and(char::is_ascii_lowercase));

    self.prev_was_lower = is_lower;
    self.capitalize_next = false;

    if should_capitalize {
      self.pending_upper = Some(c.to_uppercase());
      self.pending_upper.as_mut().unwrap().next()
    } else {
      self.pending_lower = Some(c.to_lowercase());
      self.pending_lower.as_mut().unwrap().next()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_name_escapes_keywords() {
    assert_eq!(to_rust_field_name("type"), "r#type");
    assert_eq!(to_rust_field_name("self"), "self_");
  }

  #[test]
  fn field_name_renames_crate_and_super_instead_of_raw_escaping() {
    // `r#crate`/`r#super` are rejected by rustc, same as `r#self`.
    assert_eq!(to_rust_field_name("crate"), "crate_");
    assert_eq!(to_rust_field_name("super"), "super_");
  }

  #[test]
  fn field_name_handles_leading_digit() {
    assert_eq!(to_rust_field_name("2fa_enabled"), "_2fa_enabled");
  }

  #[test]
  fn type_name_preserves_existing_mixed_case() {
    assert_eq!(to_rust_type_name("XMLParser"), "XMLParser");
  }

  #[test]
  fn type_name_pascal_cases_snake_input() {
    assert_eq!(to_rust_type_name("pet_category"), "PetCategory");
  }

  #[test]
  fn type_name_escapes_reserved_names() {
    assert_eq!(to_rust_type_name("vec"), "r#Vec");
  }

  #[test]
  fn type_name_renames_self_instead_of_raw_escaping() {
    // `r#Self` is rejected by rustc (`Self` can't be a raw identifier), so
    // this must rename rather than escape.
    assert_eq!(to_rust_type_name("self"), "SelfSchema");
  }

  #[test]
  fn ensure_unique_appends_numeric_suffix() {
    let mut used = BTreeSet::new();
    used.insert("Pet".to_string());
    used.insert("Pet2".to_string());
    assert_eq!(ensure_unique("Pet", &used), "Pet3");
  }
}
