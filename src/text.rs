#![warn(clippy::all)]

//! String helpers used by the `id` and `cap` filters.

/// Number of characters kept by [`truncate_id`].
pub const ID_LEN: usize = 8;

/// Return the first [`ID_LEN`] characters of an identifier.
///
/// Identifiers shorter than that are returned unchanged.
pub fn truncate_id(value: &str) -> String {
  match value.char_indices().nth(ID_LEN) {
    Some((end, _)) => value[..end].to_owned(),
    None => value.to_owned(),
  }
}

/// Uppercase the first character of a string and keep the rest untouched.
pub fn capitalize(value: &str) -> String {
  let mut chars = value.chars();

  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_long() {
    assert_eq!(truncate_id("4ad8c0e1-6d4f-4f1b-a4c1-7a1c0a0cbf10"), "4ad8c0e1");
  }

  #[test]
  fn truncate_exact() {
    assert_eq!(truncate_id("12345678"), "12345678");
  }

  #[test]
  fn truncate_short() {
    assert_eq!(truncate_id("abc"), "abc");
    assert_eq!(truncate_id(""), "");
  }

  #[test]
  fn truncate_multibyte() {
    assert_eq!(truncate_id("éèêëàâäôö"), "éèêëàâäô");
  }

  #[test]
  fn capitalize_lowercase() {
    assert_eq!(capitalize("abc"), "Abc");
  }

  #[test]
  fn capitalize_idempotent() {
    assert_eq!(capitalize("Abc"), "Abc");
    assert_eq!(capitalize(&capitalize("running")), "Running");
  }

  #[test]
  fn capitalize_keeps_tail() {
    assert_eq!(capitalize("kILLED"), "KILLED");
    assert_eq!(capitalize("éte"), "Éte");
    assert_eq!(capitalize(""), "");
  }
}
