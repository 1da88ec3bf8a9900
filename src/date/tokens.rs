#![warn(clippy::all)]

//! Moment-style format tokens (`YYYY`, `MMMM`, `Do`, `LLLL`, ...) rendered with chrono.

use std::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use log::trace;

/// Pattern used when the pattern is empty.
pub(crate) const DEFAULT_PATTERN: &str = "YYYY-MM-DDTHH:mm:ssZ";

const MONTHS: [&str; 12] = [
  "January",
  "February",
  "March",
  "April",
  "May",
  "June",
  "July",
  "August",
  "September",
  "October",
  "November",
  "December",
];

const WEEKDAYS: [&str; 7] = ["Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday"];

// Longer tokens come before their prefixes.
const FIELDS: &[&str] = &[
  "LTS", "LT", "LLLL", "LLL", "LL", "L", "llll", "lll", "ll", "l", "YYYY", "YY", "Y", "Q", "MMMM", "MMM", "MM",
  "Mo", "M", "DDDD", "DDD", "DD", "Do", "D", "dddd", "ddd", "dd", "do", "d", "E", "e", "HH", "H", "hh", "h", "kk",
  "k", "mm", "m", "ss", "s", "A", "a", "ZZ", "Z", "X", "x", "WW", "W",
];

#[derive(Debug, PartialEq, Eq)]
enum Token<'a> {
  Literal(&'a str),
  Field(&'a str),
  Fraction(usize),
}

fn next_token(rest: &str) -> (Token<'_>, usize) {
  if let Some(body) = rest.strip_prefix('[') {
    if let Some(end) = body.find(']') {
      return (Token::Literal(&body[..end]), end + 2);
    }
  }

  if let Some(escaped) = rest.strip_prefix('\\') {
    if let Some(c) = escaped.chars().next() {
      return (Token::Literal(&escaped[..c.len_utf8()]), 1 + c.len_utf8());
    }
  }

  let digits = rest.bytes().take_while(|&b| b == b'S').take(9).count();
  if digits > 0 {
    return (Token::Fraction(digits), digits);
  }

  if let Some(field) = FIELDS.iter().find(|field| rest.starts_with(**field)) {
    return (Token::Field(*field), field.len());
  }

  let len = rest.chars().next().map_or(0, char::len_utf8);
  (Token::Literal(&rest[..len]), len)
}

fn tokenize(pattern: &str) -> Vec<Token<'_>> {
  let mut tokens = Vec::new();
  let mut rest = pattern;

  while !rest.is_empty() {
    let (token, len) = next_token(rest);
    tokens.push(token);
    rest = &rest[len..];
  }

  trace!("Tokenized `{pattern}` into {} tokens", tokens.len());
  tokens
}

fn long_date(field: &str) -> Option<&'static str> {
  let expansion = match field {
    "LTS" => "h:mm:ss A",
    "LT" => "h:mm A",
    "L" => "MM/DD/YYYY",
    "LL" => "MMMM D, YYYY",
    "LLL" => "MMMM D, YYYY h:mm A",
    "LLLL" => "dddd, MMMM D, YYYY h:mm A",
    "l" => "M/D/YYYY",
    "ll" => "MMM D, YYYY",
    "lll" => "MMM D, YYYY h:mm A",
    "llll" => "ddd, MMM D, YYYY h:mm A",
    _ => return None,
  };

  Some(expansion)
}

fn ordinal(n: u32) -> String {
  let suffix = match (n % 100, n % 10) {
    (11..=13, _) => "th",
    (_, 1) => "st",
    (_, 2) => "nd",
    (_, 3) => "rd",
    _ => "th",
  };

  format!("{n}{suffix}")
}

fn offset(dt: &DateTime<FixedOffset>, separator: &str) -> String {
  let seconds = dt.offset().local_minus_utc();
  let sign = if seconds < 0 { '-' } else { '+' };
  let minutes = seconds.unsigned_abs() / 60;
  format!("{sign}{:02}{separator}{:02}", minutes / 60, minutes % 60)
}

fn field(dt: &DateTime<FixedOffset>, field: &str) -> String {
  let month0 = dt.month0() as usize;
  let weekday = dt.weekday().num_days_from_sunday();
  let hour12 = match dt.hour() % 12 {
    0 => 12,
    hour => hour,
  };
  let hour24 = match dt.hour() {
    0 => 24,
    hour => hour,
  };

  match field {
    "YYYY" => format!("{:04}", dt.year()),
    "YY" => format!("{:02}", dt.year().rem_euclid(100)),
    "Y" => dt.year().to_string(),
    "Q" => (month0 / 3 + 1).to_string(),
    "MMMM" => MONTHS[month0].to_owned(),
    "MMM" => MONTHS[month0][..3].to_owned(),
    "MM" => format!("{:02}", dt.month()),
    "Mo" => ordinal(dt.month()),
    "M" => dt.month().to_string(),
    "DDDD" => format!("{:03}", dt.ordinal()),
    "DDD" => dt.ordinal().to_string(),
    "DD" => format!("{:02}", dt.day()),
    "Do" => ordinal(dt.day()),
    "D" => dt.day().to_string(),
    "dddd" => WEEKDAYS[weekday as usize].to_owned(),
    "ddd" => WEEKDAYS[weekday as usize][..3].to_owned(),
    "dd" => WEEKDAYS[weekday as usize][..2].to_owned(),
    "do" => ordinal(weekday),
    "d" | "e" => weekday.to_string(),
    "E" => dt.weekday().number_from_monday().to_string(),
    "HH" => format!("{:02}", dt.hour()),
    "H" => dt.hour().to_string(),
    "hh" => format!("{hour12:02}"),
    "h" => hour12.to_string(),
    "kk" => format!("{hour24:02}"),
    "k" => hour24.to_string(),
    "mm" => format!("{:02}", dt.minute()),
    "m" => dt.minute().to_string(),
    "ss" => format!("{:02}", dt.second()),
    "s" => dt.second().to_string(),
    "A" => String::from(if dt.hour() < 12 { "AM" } else { "PM" }),
    "a" => String::from(if dt.hour() < 12 { "am" } else { "pm" }),
    "ZZ" => offset(dt, ""),
    "Z" => offset(dt, ":"),
    "X" => dt.timestamp().to_string(),
    "x" => dt.timestamp_millis().to_string(),
    "WW" => format!("{:02}", dt.iso_week().week()),
    "W" => dt.iso_week().week().to_string(),
    _ => field.to_owned(),
  }
}

/// Render `dt` with a moment-style pattern.
///
/// Text inside `[...]` and characters escaped with `\` are copied verbatim, as are
/// characters that are not part of a token. An empty pattern renders as
/// `YYYY-MM-DDTHH:mm:ssZ`.
pub fn format(dt: &DateTime<FixedOffset>, pattern: &str) -> String {
  let pattern = if pattern.is_empty() { DEFAULT_PATTERN } else { pattern };
  let mut out = String::with_capacity(pattern.len() * 2);

  for token in tokenize(pattern) {
    match token {
      Token::Literal(text) => out.push_str(text),
      Token::Field(name) => match long_date(name) {
        Some(expansion) => out.push_str(&format(dt, expansion)),
        None => out.push_str(&field(dt, name)),
      },
      Token::Fraction(digits) => {
        let millis = format!("{:03}", dt.timestamp_subsec_millis());
        let _ = write!(out, "{millis:0<digits$.digits$}");
      }
    }
  }

  out
}
