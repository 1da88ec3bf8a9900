#![warn(clippy::all)]

//! The filter registry and the `id`, `humanizeDuration`, `cap` and `date` filters.

use std::sync::Arc;

use crate::date::{self, DatePattern, INVALID_DATE};
use crate::duration::{self, DurationError, Options};
use crate::storage::{LANG, Storage, StorageError};
use crate::text;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use fnv::FnvHashMap;
use log::{debug, warn};
use serde_json::Value;

pub use self::Error as FilterError;

/// Errors raised by filters.
#[derive(Debug, thiserror::Error)]
#[error("Filter error")]
pub enum Error {
  /// Thrown if no filter is registered under a name.
  #[error("Unknown filter `{0}`")]
  UnknownFilter(String),
  /// Thrown if a filter is called with more arguments than it takes.
  #[error("Filter `{0}` takes at most {1} argument(s)")]
  Arity(String, usize),
  /// Thrown if a filter is given a value of a type it cannot handle.
  #[error("Filter `{filter}` does not accept {kind} values")]
  Unsupported {
    /// Name of the filter.
    filter: &'static str,
    /// JSON type of the rejected value.
    kind: &'static str,
  },
  /// Thrown if a duration is not a number.
  #[error("Filter `{filter}` expects a number, got `{value}`")]
  NotANumber {
    /// Name of the filter.
    filter: &'static str,
    /// The rejected value.
    value: String,
  },
  /// Thrown if duration options are not a valid options object.
  #[error("Invalid duration options: {0}")]
  Options(#[source] serde_json::Error),
  /// Errors from the duration humanizer.
  #[error("Duration error: {0}")]
  Duration(#[from] DurationError),
  /// Errors reading the stored language.
  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),
}

/// A filter: turns a value and its arguments into display text.
pub type Filter = Box<dyn Fn(&Value, &[Value]) -> Result<String, Error> + Send + Sync>;

fn kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "object",
  }
}

/// Whether a value counts as false: `null`, `false`, `0` and the empty string.
pub fn is_falsy(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::Bool(b) => !b,
    Value::Number(n) => n.as_f64() == Some(0.0),
    Value::String(s) => s.is_empty(),
    Value::Array(_) | Value::Object(_) => false,
  }
}

/// Whole floats print without a fractional part, so `12.0` reads `12`.
fn number_text(n: &serde_json::Number) -> String {
  match n.as_f64() {
    Some(f) if n.is_f64() => f.to_string(),
    _ => n.to_string(),
  }
}

fn scalar(filter: &'static str, value: &Value) -> Result<String, Error> {
  match value {
    Value::String(s) => Ok(s.clone()),
    Value::Number(n) => Ok(number_text(n)),
    _ => Err(Error::Unsupported { filter, kind: kind(value) }),
  }
}

/// The first 8 characters of an identifier, or nothing when the value is falsy.
pub fn id(value: &Value) -> Result<String, Error> {
  if is_falsy(value) {
    return Ok(String::new());
  }

  Ok(text::truncate_id(&scalar("id", value)?))
}

/// The value with its first character uppercased, or nothing when the value is falsy.
pub fn cap(value: &Value) -> Result<String, Error> {
  if is_falsy(value) {
    return Ok(String::new());
  }

  Ok(text::capitalize(&scalar("cap", value)?))
}

fn seconds(value: &Value) -> Result<f64, Error> {
  const FILTER: &str = "humanizeDuration";

  match value {
    Value::Null => Ok(0.0),
    Value::Number(n) => n.as_f64().ok_or_else(|| Error::NotANumber { filter: FILTER, value: n.to_string() }),
    Value::String(s) => {
      let trimmed = s.trim();
      if trimmed.is_empty() {
        return Ok(0.0);
      }

      trimmed.parse().map_err(|_| Error::NotANumber { filter: FILTER, value: s.clone() })
    }
    _ => Err(Error::Unsupported { filter: FILTER, kind: kind(value) }),
  }
}

/// Spell out a duration given in seconds.
///
/// `options` is a JSON object of duration [`Options`]; `{"maxDecimalPoints": 2}` is used
/// when it is absent or `null`. The language is read from `storage` on every call.
pub fn humanize_duration(value: &Value, options: Option<&Value>, storage: &dyn Storage) -> Result<String, Error> {
  let seconds = seconds(value)?;

  let options = match options {
    None | Some(Value::Null) => None,
    Some(options) => Some(serde_json::from_value::<Options>(options.clone()).map_err(Error::Options)?),
  };

  let language = storage.get(LANG)?;
  debug!("Humanizing {seconds}s with stored language {language:?}");

  Ok(duration::humanize_seconds(seconds, options.as_ref(), language.as_deref())?)
}

fn date_time(value: &Value, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
  match value {
    Value::String(s) => match date::parse_date(s, offset) {
      Ok(dt) => Some(dt),
      Err(e) => {
        warn!("{e}");
        None
      }
    },
    Value::Number(n) => {
      let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
      DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&offset))
    }
    _ => None,
  }
}

/// Format a date string (or epoch milliseconds) with a format selector.
///
/// `full` and `human` select the long patterns of [`DatePattern`], anything else is used
/// as a pattern verbatim. Dates that cannot be parsed render as `Invalid date`.
pub fn date(value: &Value, format: Option<&Value>, offset: FixedOffset) -> Result<String, Error> {
  let pattern = match format {
    None | Some(Value::Null) => DatePattern::Custom(String::new()),
    Some(Value::String(selector)) => DatePattern::from(selector.as_str()),
    Some(other) => return Err(Error::Unsupported { filter: "date", kind: kind(other) }),
  };

  match date_time(value, offset) {
    Some(dt) => Ok(date::format(&dt, pattern.pattern())),
    None => Ok(String::from(INVALID_DATE)),
  }
}

fn arity(name: &str, args: &[Value], max: usize) -> Result<(), Error> {
  if args.len() > max {
    return Err(Error::Arity(name.to_owned(), max));
  }

  Ok(())
}

/// A table of filters, looked up by name.
#[derive(Default)]
pub struct Filters {
  table: FnvHashMap<String, Filter>,
}

impl Filters {
  /// An empty table.
  pub fn empty() -> Self {
    Self::default()
  }

  /// A table with the built-in filters, rendering dates in UTC.
  pub fn new(storage: Arc<dyn Storage>) -> Self {
    Self::with_offset(storage, Utc.fix())
  }

  /// A table with the built-in filters, rendering dates at the given UTC offset.
  ///
  /// `storage` is where `humanizeDuration` reads the `lang` setting from.
  pub fn with_offset(storage: Arc<dyn Storage>, offset: FixedOffset) -> Self {
    let mut filters = Self::empty();

    filters.register("id", |value, args| {
      arity("id", args, 0)?;
      id(value)
    });

    filters.register("humanizeDuration", move |value, args| {
      arity("humanizeDuration", args, 1)?;
      humanize_duration(value, args.first(), storage.as_ref())
    });

    filters.register("cap", |value, args| {
      arity("cap", args, 0)?;
      cap(value)
    });

    filters.register("date", move |value, args| {
      arity("date", args, 1)?;
      date(value, args.first(), offset)
    });

    filters
  }

  /// Register `filter` under `name`, replacing any filter of the same name.
  pub fn register<F>(&mut self, name: impl Into<String>, filter: F)
  where
    F: Fn(&Value, &[Value]) -> Result<String, Error> + Send + Sync + 'static,
  {
    let name = name.into();
    if self.table.insert(name.clone(), Box::new(filter)).is_some() {
      debug!("Replaced filter `{name}`");
    }
  }

  /// Look up the filter registered under `name`.
  pub fn get(&self, name: &str) -> Option<&Filter> {
    self.table.get(name)
  }

  /// Apply the filter registered under `name`.
  pub fn apply(&self, name: &str, value: &Value, args: &[Value]) -> Result<String, Error> {
    let filter = self.get(name).ok_or_else(|| Error::UnknownFilter(name.to_owned()))?;
    filter(value, args)
  }

  /// Names of all registered filters, sorted.
  pub fn names(&self) -> Vec<&str> {
    let mut names: Vec<_> = self.table.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
  }
}
