//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Values are inserted verbatim and never re-scanned for placeholders.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let replaced = after.find('}').and_then(|close| {
      let key = &after[..close];
      pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| (*v, close))
    });
    match replaced {
      Some((value, close)) => {
        out.push_str(value);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// True when the text has nothing but whitespace.
pub fn is_blank(s: &str) -> bool {
  s.trim().is_empty()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let head: String = s.chars().take(max_chars).collect();
    format!("{}… ({} bytes total)", head, s.len())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fills_known_placeholders_only() {
    let out = fill_template("Hi {name}, answer in {language}. {unknown}", &[("name", "Ana"), ("language", "Portuguese")]);
    assert_eq!(out, "Hi Ana, answer in Portuguese. {unknown}");
  }

  #[test]
  fn inserted_values_are_not_expanded_again() {
    let out = fill_template("Prompt: {user_prompt} / {task}", &[("user_prompt", "use {task} here"), ("task", "T")]);
    assert_eq!(out, "Prompt: use {task} here / T");
  }

  #[test]
  fn json_braces_survive() {
    let out = fill_template("Return {\"score\": number} for {x}", &[("x", "1")]);
    assert_eq!(out, "Return {\"score\": number} for 1");
  }

  #[test]
  fn blank_and_truncation() {
    assert!(is_blank(" \n\t "));
    assert!(!is_blank(" a "));
    assert_eq!(trunc_for_log("abc", 5), "abc");
    assert_eq!(trunc_for_log("ação rápida", 4), "ação… (14 bytes total)");
  }
}
