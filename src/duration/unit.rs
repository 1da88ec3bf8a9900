#![warn(clippy::all)]

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A unit a duration can be expressed in, from largest to smallest.
#[derive(Debug, Display, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Unit {
  /// A Julian year of 365.25 days.
  #[display("y")]
  #[serde(rename = "y")]
  Year = 0,
  /// A twelfth of a year.
  #[display("mo")]
  #[serde(rename = "mo")]
  Month = 1,
  /// Week.
  #[display("w")]
  #[serde(rename = "w")]
  Week = 2,
  /// Day.
  #[display("d")]
  #[serde(rename = "d")]
  Day = 3,
  /// Hour.
  #[display("h")]
  #[serde(rename = "h")]
  Hour = 4,
  /// Minute.
  #[display("m")]
  #[serde(rename = "m")]
  Minute = 5,
  /// Second.
  #[display("s")]
  #[serde(rename = "s")]
  Second = 6,
  /// Millisecond.
  #[display("ms")]
  #[serde(rename = "ms")]
  Millisecond = 7,
}

/// Units used when the caller does not pick any.
pub const DEFAULT_UNITS: [Unit; 7] =
  [Unit::Year, Unit::Month, Unit::Week, Unit::Day, Unit::Hour, Unit::Minute, Unit::Second];

impl Unit {
  /// Length of the unit in milliseconds.
  pub const fn millis(self) -> f64 {
    match self {
      Unit::Year => 31_557_600_000.0,
      Unit::Month => 2_629_800_000.0,
      Unit::Week => 604_800_000.0,
      Unit::Day => 86_400_000.0,
      Unit::Hour => 3_600_000.0,
      Unit::Minute => 60_000.0,
      Unit::Second => 1_000.0,
      Unit::Millisecond => 1.0,
    }
  }

  pub(crate) const fn index(self) -> usize {
    self as usize
  }
}
