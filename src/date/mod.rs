#![warn(clippy::all)]

//! Parse date strings and render them with moment-style patterns.

mod tokens;

pub use self::Error as DateError;
pub use tokens::format;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use derive_more::Display;
use log::debug;

/// Text rendered in place of a date that could not be parsed.
pub const INVALID_DATE: &str = "Invalid date";

/// Errors when parsing dates.
#[derive(Debug, thiserror::Error)]
#[error("Date error")]
pub enum Error {
  /// Thrown if the input is not a recognized date or date-time.
  #[error("`{0}` is not a valid date")]
  Invalid(String),
}

/// A format selector as given to the `date` filter.
#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum DatePattern {
  /// Month, ordinal day, year and time.
  #[display("MMMM Do YYYY, h: mm: ss")]
  Full,
  /// Long localized date and time.
  #[display("LLLL")]
  Human,
  /// Any other pattern, used verbatim.
  #[display("{_0}")]
  Custom(String),
}

impl DatePattern {
  /// The moment-style pattern this selector stands for.
  pub fn pattern(&self) -> &str {
    match self {
      DatePattern::Full => "MMMM Do YYYY, h: mm: ss",
      DatePattern::Human => "LLLL",
      DatePattern::Custom(pattern) => pattern,
    }
  }
}

impl From<&str> for DatePattern {
  fn from(selector: &str) -> Self {
    match selector {
      "full" => DatePattern::Full,
      "human" => DatePattern::Human,
      pattern => DatePattern::Custom(pattern.to_owned()),
    }
  }
}

const ZONED_FORMATS: [&str; 7] = [
  "%Y-%m-%dT%H:%M:%S%.f%z",
  "%Y-%m-%d %H:%M:%S%.f%:z",
  "%Y-%m-%d %H:%M:%S%.f%z",
  "%Y-%m-%dT%H:%M%:z",
  "%Y-%m-%dT%H:%M%z",
  "%Y-%m-%d %H:%M%:z",
  "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parse a date or date-time string.
///
/// Inputs carrying an offset (RFC 3339, ISO 8601 down to minute precision, RFC 2822) are
/// converted to `offset`. Inputs
/// without one, including plain `YYYY-MM-DD` dates, are taken as local time in `offset`.
pub fn parse_date(input: &str, offset: FixedOffset) -> Result<DateTime<FixedOffset>, Error> {
  let input = input.trim();

  if let Ok(dt) = DateTime::parse_from_rfc3339(input).or_else(|_| DateTime::parse_from_rfc2822(input)) {
    return Ok(dt.with_timezone(&offset));
  }

  // `Z` is UTC.
  let zoned_input = match input.strip_suffix(['Z', 'z']) {
    Some(local) => format!("{local}+00:00"),
    None => input.to_owned(),
  };

  for zoned in ZONED_FORMATS {
    if let Ok(dt) = DateTime::parse_from_str(&zoned_input, zoned) {
      return Ok(dt.with_timezone(&offset));
    }
  }

  let naive = NAIVE_FORMATS
    .iter()
    .find_map(|naive| NaiveDateTime::parse_from_str(input, naive).ok())
    .or_else(|| {
      NaiveDate::parse_from_str(input, "%Y-%m-%d").ok().and_then(|date| date.and_hms_opt(0, 0, 0))
    });

  naive
    .and_then(|naive| offset.from_local_datetime(&naive).single())
    .ok_or_else(|| Error::Invalid(input.to_owned()))
}

/// Parse `input` and render it with `pattern`.
pub fn format_date(input: &str, pattern: &DatePattern, offset: FixedOffset) -> Result<String, Error> {
  let dt = parse_date(input, offset)?;
  debug!("Formatting `{input}` with `{pattern}`");
  Ok(format(&dt, pattern.pattern()))
}
