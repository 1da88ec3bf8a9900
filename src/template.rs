#![warn(clippy::all)]

//! A minimal template renderer for `{{ expression | filter(args) }}` tags.
//!
//! Expressions and filter arguments are JSON literals, single-quoted strings or dotted
//! paths into the render context (`execution.state.current`, `items.0.id`). Anything
//! outside of tags is copied verbatim.

use std::str::FromStr;

use crate::filters::{FilterError, Filters};

use log::trace;
use regex::Regex;
use serde_json::Value;

pub use self::Error as TemplateError;

/// Errors when parsing or rendering a template.
#[derive(Debug, thiserror::Error)]
#[error("Template error")]
pub enum Error {
  /// Thrown if a `{{` is never closed.
  #[error("Unclosed tag at byte {0}")]
  Unclosed(usize),
  /// Thrown if a tag cannot be parsed.
  #[error("Syntax error in `{0}`: {1}")]
  Syntax(String, &'static str),
  /// Errors from the tag regex.
  #[error("Regex error: {0}")]
  Regex(#[from] regex::Error),
  /// Errors raised by filters while rendering.
  #[error("{0}")]
  Filter(#[from] FilterError),
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
  Literal(Value),
  Path(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
struct Call {
  name: String,
  args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
struct Tag {
  expr: Expr,
  calls: Vec<Call>,
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
  Text(String),
  Tag(Tag),
}

/// Split `s` on `separator`, ignoring separators nested in brackets or quotes.
fn split_top_level(s: &str, separator: char) -> Vec<&str> {
  let mut parts = Vec::new();
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut escaped = false;
  let mut start = 0;

  for (i, c) in s.char_indices() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == q {
        quote = None;
      }
      continue;
    }

    match c {
      '\'' | '"' => quote = Some(c),
      '(' | '[' | '{' => depth += 1,
      ')' | ']' | '}' => depth = depth.saturating_sub(1),
      c if c == separator && depth == 0 => {
        parts.push(&s[start..i]);
        start = i + c.len_utf8();
      }
      _ => {}
    }
  }

  parts.push(&s[start..]);
  parts
}

fn is_identifier(s: &str) -> bool {
  !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn parse_expr(s: &str) -> Result<Expr, Error> {
  let s = s.trim();

  if s.is_empty() {
    return Err(Error::Syntax(s.to_owned(), "empty expression"));
  }

  if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
    let inner = &s[1..s.len() - 1];
    return Ok(Expr::Literal(Value::String(inner.replace("\\'", "'"))));
  }

  if let Ok(value) = serde_json::from_str(s) {
    return Ok(Expr::Literal(value));
  }

  let path: Vec<_> = s.split('.').map(str::trim).collect();
  if path.iter().all(|segment| is_identifier(segment)) {
    return Ok(Expr::Path(path.into_iter().map(str::to_owned).collect()));
  }

  Err(Error::Syntax(s.to_owned(), "not a literal or a path"))
}

fn parse_call(s: &str) -> Result<Call, Error> {
  let s = s.trim();

  let (name, args) = match s.find('(') {
    Some(open) => {
      let inner = s[open + 1..]
        .strip_suffix(')')
        .ok_or_else(|| Error::Syntax(s.to_owned(), "missing `)` after filter arguments"))?;

      let args = if inner.trim().is_empty() {
        Vec::new()
      } else {
        split_top_level(inner, ',').into_iter().map(parse_expr).collect::<Result<_, _>>()?
      };

      (s[..open].trim(), args)
    }
    None => (s, Vec::new()),
  };

  if !is_identifier(name) {
    return Err(Error::Syntax(s.to_owned(), "invalid filter name"));
  }

  Ok(Call { name: name.to_owned(), args })
}

fn parse_tag(body: &str) -> Result<Tag, Error> {
  let mut parts = split_top_level(body, '|').into_iter();
  let expr = parse_expr(parts.next().unwrap_or_default())?;
  let calls = parts.map(parse_call).collect::<Result<_, _>>()?;
  Ok(Tag { expr, calls })
}

/// Byte offset of the `}}` closing a tag body, skipping braces nested in arguments or quotes.
fn closing_braces(body: &str) -> Option<usize> {
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut escaped = false;

  for (i, c) in body.char_indices() {
    if let Some(q) = quote {
      if escaped {
        escaped = false;
      } else if c == '\\' {
        escaped = true;
      } else if c == q {
        quote = None;
      }
      continue;
    }

    match c {
      '\'' | '"' => quote = Some(c),
      '(' | '[' | '{' => depth += 1,
      '}' if depth == 0 && body[i + 1..].starts_with('}') => return Some(i),
      ')' | ']' | '}' => depth = depth.saturating_sub(1),
      _ => {}
    }
  }

  None
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
  if !text.is_empty() {
    segments.push(Segment::Text(text.to_owned()));
  }
}

fn lookup<'v>(context: &'v Value, path: &[String]) -> Option<&'v Value> {
  path.iter().try_fold(context, |value, segment| match value {
    Value::Object(map) => map.get(segment),
    Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
    _ => None,
  })
}

fn eval(expr: &Expr, context: &Value) -> Value {
  match expr {
    Expr::Literal(value) => value.clone(),
    Expr::Path(path) => lookup(context, path).cloned().unwrap_or(Value::Null),
  }
}

fn display(value: Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s,
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    structured => structured.to_string(),
  }
}

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
  segments: Vec<Segment>,
}

impl Template {
  /// Parse a template source.
  ///
  /// A tag ends at the first `}}` outside of quotes and brackets, so `{{ 'a}}' | cap }}` and
  /// object arguments such as `{"a": {"b": 1}}` stay inside their tag.
  pub fn parse(src: &str) -> Result<Self, Error> {
    let opener = Regex::new(r"\{\{")?;
    let mut segments = Vec::new();
    let mut last = 0;

    while let Some(open) = opener.find_at(src, last) {
      push_text(&mut segments, &src[last..open.start()]);

      let body = &src[open.end()..];
      let len = closing_braces(body).ok_or(Error::Unclosed(open.start()))?;
      segments.push(Segment::Tag(parse_tag(&body[..len])?));
      last = open.end() + len + 2;
    }

    push_text(&mut segments, &src[last..]);

    trace!("Parsed template into {} segments", segments.len());
    Ok(Self { segments })
  }

  /// Render the template against a JSON context, applying filters from `filters`.
  ///
  /// Paths missing from the context evaluate to `null`.
  pub fn render(&self, filters: &Filters, context: &Value) -> Result<String, Error> {
    let mut out = String::new();

    for segment in &self.segments {
      match segment {
        Segment::Text(text) => out.push_str(text),
        Segment::Tag(tag) => {
          let mut value = eval(&tag.expr, context);

          for call in &tag.calls {
            let args: Vec<_> = call.args.iter().map(|arg| eval(arg, context)).collect();
            value = Value::String(filters.apply(&call.name, &value, &args)?);
          }

          out.push_str(&display(value));
        }
      }
    }

    Ok(out)
  }
}

impl FromStr for Template {
  type Err = Error;

  fn from_str(src: &str) -> Result<Self, Self::Err> {
    Self::parse(src)
  }
}

/// Parse and render `src` in one go.
pub fn render(src: &str, filters: &Filters, context: &Value) -> Result<String, Error> {
  Template::parse(src)?.render(filters, context)
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::sync::Arc;

  use crate::storage::{LANG, MemoryStorage, Storage};

  use indoc::indoc;
  use serde_json::json;

  fn filters() -> (Arc<MemoryStorage>, Filters) {
    let storage = Arc::new(MemoryStorage::new());
    (storage.clone(), Filters::new(storage))
  }

  #[test]
  fn split() {
    assert_eq!(split_top_level("a | b('x|y') | c", '|'), vec!["a ", " b('x|y') ", " c"]);
    assert_eq!(split_top_level(r#"{"a": 1, "b": 2}, 'c, d'"#, ','), vec![r#"{"a": 1, "b": 2}"#, " 'c, d'"]);
  }

  #[test]
  fn expressions() {
    assert_eq!(parse_expr("'full'").unwrap(), Expr::Literal(json!("full")));
    assert_eq!(parse_expr(r"'it\'s'").unwrap(), Expr::Literal(json!("it's")));
    assert_eq!(parse_expr(" 42 ").unwrap(), Expr::Literal(json!(42)));
    assert_eq!(parse_expr("null").unwrap(), Expr::Literal(Value::Null));
    assert_eq!(
      parse_expr("execution.state.current").unwrap(),
      Expr::Path(vec![String::from("execution"), String::from("state"), String::from("current")])
    );
    assert!(matches!(parse_expr("a..b"), Err(Error::Syntax(..))));
    assert!(matches!(parse_expr(""), Err(Error::Syntax(..))));
  }

  #[test]
  fn calls() {
    assert_eq!(parse_call("cap").unwrap(), Call { name: String::from("cap"), args: Vec::new() });
    assert_eq!(parse_call("date()").unwrap(), Call { name: String::from("date"), args: Vec::new() });
    assert_eq!(
      parse_call("date('full')").unwrap(),
      Call { name: String::from("date"), args: vec![Expr::Literal(json!("full"))] }
    );
    assert!(matches!(parse_call("date('full'"), Err(Error::Syntax(..))));
    assert!(matches!(parse_call(""), Err(Error::Syntax(..))));
  }

  #[test]
  fn plain_text() {
    let (_, filters) = filters();
    assert_eq!(render("no tags } here", &filters, &Value::Null).unwrap(), "no tags } here");
  }

  #[test]
  fn interpolation_without_filters() {
    let (_, filters) = filters();
    let context = json!({"name": "flow", "count": 3, "tags": ["a"]});
    assert_eq!(
      render("{{ name }}: {{ count }} {{ missing }}{{ tags }}", &filters, &context).unwrap(),
      r#"flow: 3 ["a"]"#
    );
  }

  #[test]
  fn execution_row() {
    let (storage, filters) = filters();
    let template = Template::parse(indoc! {"
      {{ execution.id | id }} {{ execution.state | cap }}
      started {{ execution.startDate | date('full') }}
      took {{ execution.duration | humanizeDuration }}
      {{ execution.duration | humanizeDuration({\"largest\": 1}) }}
    "})
    .unwrap();

    let context = json!({
      "execution": {
        "id": "5uu2klxKDDRRnYlWPvQwWZ",
        "state": "success",
        "startDate": "2020-01-01T00:00:00Z",
        "duration": 3725.5,
      }
    });

    assert_eq!(
      template.render(&filters, &context).unwrap(),
      indoc! {"
        5uu2klxK Success
        started January 1st 2020, 12: 00: 00
        took 1 hour, 2 minutes, 5.5 seconds
        1 hour
      "}
    );

    storage.set(LANG, "fr").unwrap();
    assert_eq!(
      render("{{ execution.duration | humanizeDuration }}", &filters, &context).unwrap(),
      "1 heure, 2 minutes, 5,5 secondes"
    );
  }

  #[test]
  fn chained_filters_and_path_arguments() {
    let (_, filters) = filters();
    let context = json!({"items": [{"id": "abcdefghijkl", "format": "YYYY"}], "when": "2021-06-01"});
    assert_eq!(render("{{ items.0.id | id | cap }}", &filters, &context).unwrap(), "Abcdefgh");
    assert_eq!(render("{{ when | date(items.0.format) }}", &filters, &context).unwrap(), "2021");
  }

  #[test]
  fn literal_expression() {
    let (_, filters) = filters();
    assert_eq!(render("{{ 'hello' | cap }}", &filters, &Value::Null).unwrap(), "Hello");
    assert_eq!(render("{{ null | id }}|", &filters, &Value::Null).unwrap(), "|");
  }

  #[test]
  fn braces_inside_tags() {
    let (_, filters) = filters();
    assert_eq!(render("{{ 'a}}' | cap }}!", &filters, &Value::Null).unwrap(), "A}}!");
    assert_eq!(render(r#"{{ {"a": {"b": 1}} }}"#, &filters, &Value::Null).unwrap(), r#"{"a":{"b":1}}"#);
    assert_eq!(
      render(r#"{{ 3725.5 | humanizeDuration({"largest": 1})}}."#, &filters, &Value::Null).unwrap(),
      "1 hour."
    );
  }

  #[test]
  fn unclosed() {
    assert!(matches!(Template::parse("ok {{ name }} then {{ broken"), Err(Error::Unclosed(19))));
  }

  #[test]
  fn unknown_filter() {
    let (_, filters) = filters();
    let err = render("{{ name | shout }}", &filters, &json!({"name": "x"})).unwrap_err();
    assert_eq!(err.to_string(), "Unknown filter `shout`");
  }

  #[test]
  fn from_str() {
    let template: Template = "{{ a | cap }}".parse().unwrap();
    let (_, filters) = filters();
    assert_eq!(template.render(&filters, &json!({"a": "b"})).unwrap(), "B");
  }
}
