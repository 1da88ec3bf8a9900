#![warn(clippy::all)]

//! Spell out durations as localized phrases such as `1 day, 3 hours, 2 minutes`.

mod language;
mod unit;

pub use self::Error as DurationError;
pub use language::{DEFAULT as DEFAULT_LANGUAGE, Language, codes as languages, lookup as find_language};
pub use unit::{DEFAULT_UNITS, Unit};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Errors when humanizing a duration.
#[derive(Debug, thiserror::Error)]
#[error("Duration error")]
pub enum Error {
  /// Thrown if neither the language nor any of its fallbacks is supported.
  #[error("No language `{0}`")]
  UnknownLanguage(String),
  /// Thrown if the list of units to use is empty.
  #[error("No units to express the duration in")]
  NoUnits,
  /// Thrown if the duration is NaN or infinite.
  #[error("Duration `{0}` is not a finite number")]
  NotFinite(f64),
  /// Thrown if more decimal points are asked for than [`MAX_DECIMAL_POINTS`].
  #[error("Cannot keep {0} decimal points, at most {MAX_DECIMAL_POINTS} are supported")]
  DecimalPoints(u32),
}

/// Largest accepted `maxDecimalPoints`.
pub const MAX_DECIMAL_POINTS: u32 = 100;

/// Options controlling how a duration is spelled out.
///
/// Field names follow the camelCase keys templates pass in, e.g.
/// `{"largest": 2, "maxDecimalPoints": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
  /// Language code, `en` when absent.
  pub language: Option<String>,
  /// Languages tried in order when `language` is not supported.
  pub fallbacks: Vec<String>,
  /// Separator between pieces, the language's when absent.
  pub delimiter: Option<String>,
  /// Separator between a count and its unit.
  pub spacer: String,
  /// Maximum number of pieces to output.
  pub largest: Option<usize>,
  /// Units to use.
  pub units: Vec<Unit>,
  /// Round the pieces to whole numbers.
  pub round: bool,
  /// Decimal separator, the language's when absent.
  pub decimal: Option<String>,
  /// Word placed before the last piece, e.g. ` and `.
  pub conjunction: Option<String>,
  /// Put a comma before the conjunction when there are more than two pieces.
  pub serial_comma: bool,
  /// Truncate the smallest piece to this many decimals.
  pub max_decimal_points: Option<u32>,
}

impl Default for Options {
  fn default() -> Self {
    Self {
      language: None,
      fallbacks: Vec::new(),
      delimiter: None,
      spacer: String::from(" "),
      largest: None,
      units: DEFAULT_UNITS.to_vec(),
      round: false,
      decimal: None,
      conjunction: None,
      serial_comma: true,
      max_decimal_points: None,
    }
  }
}

impl Options {
  /// Options used by the `humanizeDuration` filter when a template passes none.
  pub fn filter_default() -> Self {
    Self { max_decimal_points: Some(2), ..Self::default() }
  }

  fn resolve_language(&self) -> Result<&'static Language, Error> {
    let code = match &self.language {
      Some(code) => code.as_str(),
      None => DEFAULT_LANGUAGE,
    };

    if let Some(language) = language::lookup(code) {
      return Ok(language);
    }

    for fallback in &self.fallbacks {
      if let Some(found) = language::lookup(fallback) {
        debug!("Language `{code}` is not supported, falling back to `{}`", found.code());
        return Ok(found);
      }

      warn!("Ignoring unsupported fallback language `{fallback}`");
    }

    Err(Error::UnknownLanguage(code.to_owned()))
  }
}

struct Piece {
  unit: Unit,
  count: f64,
}

fn truncate_decimals(value: f64, points: u32) -> f64 {
  let exp = 10f64.powi(points as i32);
  let truncated = (value * exp).floor() / exp;
  // Drop float noise such as 0.30000000000000004.
  format!("{truncated:.prec$}", prec = points as usize).parse().unwrap_or(truncated)
}

fn split(ms: f64, units: &[Unit], max_decimal_points: Option<u32>) -> Vec<Piece> {
  let mut remaining = ms;
  let mut pieces = Vec::with_capacity(units.len());

  for (i, &unit) in units.iter().enumerate() {
    let count = if i + 1 == units.len() {
      let count = remaining / unit.millis();
      match max_decimal_points {
        Some(points) => truncate_decimals(count, points),
        None => count,
      }
    } else {
      (remaining / unit.millis()).floor()
    };

    remaining -= count * unit.millis();
    pieces.push(Piece { unit, count });
  }

  pieces
}

fn round(pieces: &mut [Piece], largest: Option<usize>) {
  let first_occupied = pieces.iter().position(|piece| piece.count != 0.0).unwrap_or(0);

  for i in (0..pieces.len()).rev() {
    pieces[i].count = pieces[i].count.round();

    if i == 0 {
      break;
    }

    let ratio = pieces[i - 1].unit.millis() / pieces[i].unit.millis();
    let beyond_largest = largest.is_some_and(|largest| i > first_occupied && i - first_occupied > largest - 1);

    if pieces[i].count % ratio == 0.0 || beyond_largest {
      let carry = pieces[i].count / ratio;
      pieces[i - 1].count += carry;
      pieces[i].count = 0.0;
    }
  }
}

fn render(count: f64, unit: Unit, language: &Language, options: &Options) -> String {
  let decimal = options.decimal.as_deref().unwrap_or(language.decimal());
  let count_str = count.to_string().replace('.', decimal);
  format!("{count_str}{}{}", options.spacer, language.word(unit, count))
}

fn join(rendered: Vec<String>, delimiter: &str, options: &Options) -> String {
  let conjunction = options.conjunction.as_deref().filter(|conjunction| !conjunction.is_empty());

  match (conjunction, rendered.len()) {
    (None, _) | (_, 0 | 1) => rendered.join(delimiter),
    (Some(conjunction), 2) => rendered.join(conjunction),
    (Some(conjunction), n) => {
      let serial_comma = if options.serial_comma { "," } else { "" };
      format!("{}{serial_comma}{conjunction}{}", rendered[..n - 1].join(delimiter), rendered[n - 1])
    }
  }
}

/// Spell out a duration of `ms` milliseconds.
///
/// The sign of `ms` is ignored. Units are used largest first regardless of the order they
/// are given in. A duration with no non-zero piece is spelled as zero of the smallest unit
/// (`0 seconds`).
pub fn humanize(ms: f64, options: &Options) -> Result<String, Error> {
  if !ms.is_finite() {
    return Err(Error::NotFinite(ms));
  }

  if let Some(points) = options.max_decimal_points.filter(|&points| points > MAX_DECIMAL_POINTS) {
    return Err(Error::DecimalPoints(points));
  }

  let language = options.resolve_language()?;

  let mut units = options.units.clone();
  units.sort();
  units.dedup();
  let smallest = *units.last().ok_or(Error::NoUnits)?;

  let largest = options.largest.filter(|&largest| largest > 0);

  let mut pieces = split(ms.abs(), &units, options.max_decimal_points);
  if options.round {
    round(&mut pieces, largest);
  }

  let mut rendered = Vec::new();
  for piece in pieces.iter().filter(|piece| piece.count != 0.0) {
    rendered.push(render(piece.count, piece.unit, language, options));
    if Some(rendered.len()) == largest {
      break;
    }
  }

  if rendered.is_empty() {
    return Ok(render(0.0, smallest, language, options));
  }

  let delimiter = options.delimiter.as_deref().unwrap_or(language.delimiter());
  Ok(join(rendered, delimiter, options))
}

/// Spell out a duration given in seconds, the way the `humanizeDuration` filter does.
///
/// Without `options`, [`Options::filter_default`] is used. Given options are copied, never
/// modified. `language` replaces whatever language the options carry, so the stored
/// language always wins; `None` means the default language.
pub fn humanize_seconds(seconds: f64, options: Option<&Options>, language: Option<&str>) -> Result<String, Error> {
  let mut options = match options {
    Some(options) => options.clone(),
    None => Options::filter_default(),
  };

  options.language = language.map(str::to_owned);
  humanize(seconds * 1000.0, &options)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn en(ms: f64) -> String {
    humanize(ms, &Options::default()).unwrap()
  }

  #[test]
  fn seconds() {
    assert_eq!(en(5000.0), "5 seconds");
    assert_eq!(en(1000.0), "1 second");
  }

  #[test]
  fn zero() {
    assert_eq!(en(0.0), "0 seconds");
    let options = Options { units: vec![Unit::Hour, Unit::Minute], ..Options::default() };
    assert_eq!(humanize(0.0, &options).unwrap(), "0 minutes");
  }

  #[test]
  fn several_units() {
    assert_eq!(en(97_320_000.0), "1 day, 3 hours, 2 minutes");
    assert_eq!(en(3_600_000.0 + 1500.0), "1 hour, 1.5 seconds");
  }

  #[test]
  fn negative() {
    assert_eq!(en(-3000.0), "3 seconds");
  }

  #[test]
  fn fraction_of_smallest_unit() {
    assert_eq!(en(250.0), "0.25 seconds");
  }

  #[test]
  fn max_decimal_points() {
    let options = Options { max_decimal_points: Some(1), ..Options::default() };
    assert_eq!(humanize(8123.456, &options).unwrap(), "8.1 seconds");
    assert_eq!(humanize(300.0, &options).unwrap(), "0.3 seconds");

    let options = Options { max_decimal_points: Some(0), ..Options::default() };
    assert_eq!(humanize(8999.0, &options).unwrap(), "8 seconds");
  }

  #[test]
  fn too_many_decimal_points() {
    let options = Options { max_decimal_points: Some(MAX_DECIMAL_POINTS + 1), ..Options::default() };
    assert!(matches!(humanize(1500.0, &options), Err(Error::DecimalPoints(101))));

    let options = Options { max_decimal_points: Some(70_000), ..Options::default() };
    assert!(matches!(humanize(1500.0, &options), Err(Error::DecimalPoints(70_000))));

    let options = Options { max_decimal_points: Some(MAX_DECIMAL_POINTS), ..Options::default() };
    assert!(humanize(1500.0, &options).is_ok());
  }

  #[test]
  fn largest() {
    let options = Options { largest: Some(2), ..Options::default() };
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), "1 day, 3 hours");

    let options = Options { largest: Some(0), ..Options::default() };
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), "1 day, 3 hours, 2 minutes");
  }

  #[test]
  fn rounding() {
    let options = Options { round: true, ..Options::default() };
    assert_eq!(humanize(1200.0, &options).unwrap(), "1 second");
    assert_eq!(humanize(1600.0, &options).unwrap(), "2 seconds");
    assert_eq!(humanize(59_600.0, &options).unwrap(), "1 minute");
  }

  #[test]
  fn rounding_with_largest() {
    let options = Options { round: true, largest: Some(2), ..Options::default() };
    assert_eq!(humanize(97_320_000.0 + 45.0 * 60_000.0, &options).unwrap(), "1 day, 4 hours");
  }

  #[test]
  fn units_in_any_order() {
    let options = Options { units: vec![Unit::Minute, Unit::Hour], ..Options::default() };
    assert_eq!(humanize(5_400_000.0, &options).unwrap(), "1 hour, 30 minutes");
  }

  #[test]
  fn no_units() {
    let options = Options { units: Vec::new(), ..Options::default() };
    assert!(matches!(humanize(1.0, &options), Err(Error::NoUnits)));
  }

  #[test]
  fn not_finite() {
    assert!(matches!(humanize(f64::NAN, &Options::default()), Err(Error::NotFinite(_))));
  }

  #[test]
  fn delimiter_and_spacer() {
    let options = Options {
      delimiter: Some(String::from(" / ")),
      spacer: String::from("_"),
      ..Options::default()
    };
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), "1_day / 3_hours / 2_minutes");

    let options = Options { language: Some(String::from("nl")), ..Options::default() };
    let delimiter = find_language("nl").map(Language::delimiter).unwrap();
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), ["1 dag", "3 uur", "2 minuten"].join(delimiter));
  }

  #[test]
  fn conjunction() {
    let options = Options { conjunction: Some(String::from(" and ")), ..Options::default() };
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), "1 day, 3 hours, and 2 minutes");
    assert_eq!(humanize(10_800_000.0 + 120_000.0, &options).unwrap(), "3 hours and 2 minutes");
    assert_eq!(humanize(120_000.0, &options).unwrap(), "2 minutes");

    let options = Options { serial_comma: false, ..options };
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), "1 day, 3 hours and 2 minutes");
  }

  #[test]
  fn localized() {
    let options = Options { language: Some(String::from("fr")), ..Options::default() };
    assert_eq!(humanize(97_320_000.0, &options).unwrap(), "1 jour, 3 heures, 2 minutes");
    assert_eq!(humanize(1500.0, &options).unwrap(), "1,5 seconde");

    let options = Options { language: Some(String::from("de")), ..Options::default() };
    assert_eq!(humanize(7_200_000.0, &options).unwrap(), "2 Stunden");
  }

  #[test]
  fn decimal_override() {
    let options = Options {
      language: Some(String::from("de")),
      decimal: Some(String::from(".")),
      ..Options::default()
    };
    assert_eq!(humanize(2500.0, &options).unwrap(), "2.5 Sekunden");
  }

  #[test]
  fn unknown_language() {
    let options = Options { language: Some(String::from("tlh")), ..Options::default() };
    assert!(matches!(humanize(1000.0, &options), Err(Error::UnknownLanguage(code)) if code == "tlh"));
  }

  #[test]
  fn fallbacks() {
    let options = Options {
      language: Some(String::from("tlh")),
      fallbacks: vec![String::from("xx"), String::from("es")],
      ..Options::default()
    };
    assert_eq!(humanize(3_600_000.0, &options).unwrap(), "1 hora");
  }

  #[test]
  fn options_from_json() {
    let options: Options = serde_json::from_str(r#"{"largest": 1, "maxDecimalPoints": 2, "units": ["h", "m"]}"#).unwrap();
    assert_eq!(options.largest, Some(1));
    assert_eq!(options.max_decimal_points, Some(2));
    assert_eq!(options.units, vec![Unit::Hour, Unit::Minute]);
    assert_eq!(options.spacer, " ");
    assert!(options.serial_comma);
  }

  #[test]
  fn seconds_default_options() {
    assert_eq!(humanize_seconds(5.0, None, None).unwrap(), "5 seconds");
    assert_eq!(humanize_seconds(0.125, None, None).unwrap(), "0.12 seconds");
  }

  #[test]
  fn seconds_given_options_replace_defaults() {
    let options = Options::default();
    assert_eq!(humanize_seconds(0.125, Some(&options), None).unwrap(), "0.125 seconds");
  }

  #[test]
  fn seconds_language_overrides_options() {
    let options = Options { language: Some(String::from("de")), ..Options::default() };
    assert_eq!(humanize_seconds(60.0, Some(&options), Some("it")).unwrap(), "1 minuto");
    assert_eq!(humanize_seconds(60.0, Some(&options), None).unwrap(), "1 minute");
    assert_eq!(options.language.as_deref(), Some("de"));
  }
}
