#![warn(clippy::all)]

use crate::duration::unit::Unit;

use log::debug;

/// Words and number conventions used to spell out a duration.
pub struct Language {
  code: &'static str,
  decimal: &'static str,
  delimiter: &'static str,
  singular: fn(f64) -> bool,
  words: [(&'static str, &'static str); 8],
}

impl Language {
  /// The language code, e.g. `en`.
  pub fn code(&self) -> &'static str {
    self.code
  }

  /// Decimal separator for fractional counts.
  pub fn decimal(&self) -> &'static str {
    self.decimal
  }

  /// Separator between the pieces of a duration.
  pub fn delimiter(&self) -> &'static str {
    self.delimiter
  }

  /// The singular or plural word for `unit`, depending on `count`.
  pub fn word(&self, unit: Unit, count: f64) -> &'static str {
    let (one, many) = self.words[unit.index()];
    if (self.singular)(count) { one } else { many }
  }
}

fn is_one(count: f64) -> bool {
  count == 1.0
}

fn below_two(count: f64) -> bool {
  count < 2.0
}

/// Language used when none is given.
pub const DEFAULT: &str = "en";

static LANGUAGES: &[Language] = &[
  Language {
    code: "en",
    decimal: ".",
    delimiter: ", ",
    singular: is_one,
    words: [
      ("year", "years"),
      ("month", "months"),
      ("week", "weeks"),
      ("day", "days"),
      ("hour", "hours"),
      ("minute", "minutes"),
      ("second", "seconds"),
      ("millisecond", "milliseconds"),
    ],
  },
  Language {
    code: "de",
    decimal: ",",
    delimiter: ", ",
    singular: is_one,
    words: [
      ("Jahr", "Jahre"),
      ("Monat", "Monate"),
      ("Woche", "Wochen"),
      ("Tag", "Tage"),
      ("Stunde", "Stunden"),
      ("Minute", "Minuten"),
      ("Sekunde", "Sekunden"),
      ("Millisekunde", "Millisekunden"),
    ],
  },
  Language {
    code: "es",
    decimal: ",",
    delimiter: ", ",
    singular: is_one,
    words: [
      ("año", "años"),
      ("mes", "meses"),
      ("semana", "semanas"),
      ("día", "días"),
      ("hora", "horas"),
      ("minuto", "minutos"),
      ("segundo", "segundos"),
      ("milisegundo", "milisegundos"),
    ],
  },
  Language {
    code: "fr",
    decimal: ",",
    delimiter: ", ",
    singular: below_two,
    words: [
      ("an", "ans"),
      ("mois", "mois"),
      ("semaine", "semaines"),
      ("jour", "jours"),
      ("heure", "heures"),
      ("minute", "minutes"),
      ("seconde", "secondes"),
      ("milliseconde", "millisecondes"),
    ],
  },
  Language {
    code: "it",
    decimal: ",",
    delimiter: ", ",
    singular: is_one,
    words: [
      ("anno", "anni"),
      ("mese", "mesi"),
      ("settimana", "settimane"),
      ("giorno", "giorni"),
      ("ora", "ore"),
      ("minuto", "minuti"),
      ("secondo", "secondi"),
      ("millisecondo", "millisecondi"),
    ],
  },
  Language {
    code: "nl",
    decimal: ",",
    delimiter: ", ",
    singular: is_one,
    words: [
      ("jaar", "jaar"),
      ("maand", "maanden"),
      ("week", "weken"),
      ("dag", "dagen"),
      ("uur", "uur"),
      ("minuut", "minuten"),
      ("seconde", "seconden"),
      ("milliseconde", "milliseconden"),
    ],
  },
  Language {
    code: "pt",
    decimal: ",",
    delimiter: ", ",
    singular: is_one,
    words: [
      ("ano", "anos"),
      ("mês", "meses"),
      ("semana", "semanas"),
      ("dia", "dias"),
      ("hora", "horas"),
      ("minuto", "minutos"),
      ("segundo", "segundos"),
      ("milissegundo", "milissegundos"),
    ],
  },
];

/// Find a language by code.
///
/// The code is matched verbatim first and then by its primary subtag, so `fr-CA` and
/// `pt_BR` resolve to `fr` and `pt`.
pub fn lookup(code: &str) -> Option<&'static Language> {
  if let Some(language) = LANGUAGES.iter().find(|language| language.code == code) {
    return Some(language);
  }

  let primary = code.split(['-', '_']).next()?;
  let language = LANGUAGES.iter().find(|language| language.code.eq_ignore_ascii_case(primary))?;
  debug!("Using language `{}` for `{code}`", language.code);
  Some(language)
}

/// Codes of all supported languages.
pub fn codes() -> impl Iterator<Item = &'static str> {
  LANGUAGES.iter().map(|language| language.code)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exact() {
    assert_eq!(lookup("de").map(Language::code), Some("de"));
  }

  #[test]
  fn region_subtag() {
    assert_eq!(lookup("fr-CA").map(Language::code), Some("fr"));
    assert_eq!(lookup("pt_BR").map(Language::code), Some("pt"));
    assert_eq!(lookup("EN").map(Language::code), Some("en"));
  }

  #[test]
  fn unknown() {
    assert!(lookup("tlh").is_none());
    assert!(lookup("").is_none());
  }

  #[test]
  fn plurals() {
    let en = lookup("en").unwrap();
    assert_eq!(en.word(Unit::Day, 1.0), "day");
    assert_eq!(en.word(Unit::Day, 0.0), "days");
    assert_eq!(en.word(Unit::Day, 1.5), "days");

    let fr = lookup("fr").unwrap();
    assert_eq!(fr.word(Unit::Year, 1.5), "an");
    assert_eq!(fr.word(Unit::Year, 2.0), "ans");
    assert_eq!(fr.word(Unit::Month, 3.0), "mois");
  }

  #[test]
  fn delimiters() {
    assert!(codes().filter_map(lookup).all(|language| language.delimiter() == ", "));
  }

  #[test]
  fn default_is_supported() {
    assert!(codes().any(|code| code == DEFAULT));
  }
}
