#![warn(clippy::all)]

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use viewfilters::date::INVALID_DATE;
use viewfilters::duration;
use viewfilters::filters::{FilterError, Filters};
use viewfilters::storage::{FileStorage, LANG, Storage, StorageError};
use viewfilters::template::{Template, TemplateError};

use chrono::{FixedOffset, Local, Offset};
use clap::Parser;
use directories::ProjectDirs;
use humantime::format_duration;
use log::{debug, error, info, warn};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
#[error("viewfilters error")]
enum Error {
  #[error("Cannot find configuration directory")]
  ConfigDir,
  #[error("Invalid duration `{0}`: {1}")]
  Duration(String, #[source] humantime::DurationError),
  #[error("Invalid UTC offset `{0}`, expected e.g. +02:00")]
  Offset(String),
  #[error("Invalid JSON in {0}: {1}")]
  Json(&'static str, #[source] serde_json::Error),
  #[error("IO error: {0}")]
  Io(#[from] io::Error),
  #[error("Storage error: {0}")]
  Storage(#[from] StorageError),
  #[error("Filter error: {0}")]
  Filter(#[from] FilterError),
  #[error("Template error: {0}")]
  Template(#[from] TemplateError),
}

#[derive(Debug, clap::Args)]
struct GeneralOpts {
  /// Verbose output (can be specified multiple times)
  #[clap(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  /// Settings file holding the stored language [default: settings.json in the config directory]
  #[clap(short, long, global = true, value_name = "FILE")]
  storage: Option<PathBuf>,

  /// UTC offset dates are rendered at, e.g. +02:00 [default: local offset]
  #[clap(short, long, global = true, value_name = "OFFSET", allow_hyphen_values = true)]
  utc_offset: Option<String>,
}

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, long_about = None)]
struct Opt {
  #[clap(flatten)]
  general_opts: GeneralOpts,

  #[clap(subcommand)]
  command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
  /// Truncate an identifier to its first 8 characters
  Id {
    /// The identifier
    #[clap(name = "VALUE")]
    value: String,
  },

  /// Uppercase the first character of a string
  Cap {
    /// The string
    #[clap(name = "VALUE")]
    value: String,
  },

  /// Spell out a duration in the stored language
  Duration {
    /// Seconds (e.g. 3725.5) or a duration such as "1h 2m 5s"
    #[clap(name = "DURATION")]
    duration: String,

    /// Options as a JSON object, e.g. '{"largest": 2}'
    #[clap(short, long, value_name = "JSON")]
    options: Option<String>,
  },

  /// Format a date as "full", "human" or with a moment-style pattern
  Date {
    /// Date or date-time, e.g. 2020-01-01T10:00:00Z
    #[clap(name = "DATE")]
    date: String,

    /// "full", "human" or a pattern such as "YYYY-MM-DD"
    #[clap(name = "FORMAT")]
    format: Option<String>,
  },

  /// Render a template file ("-" for stdin) against a JSON context
  Render {
    /// Template file
    #[clap(name = "TEMPLATE")]
    template: PathBuf,

    /// JSON file with the render context
    #[clap(short, long, value_name = "CONTEXT")]
    context: Option<PathBuf>,
  },

  /// Show, set or clear the stored language
  Lang {
    /// Language code to store, e.g. fr
    #[clap(name = "CODE")]
    code: Option<String>,

    /// Remove the stored language
    #[clap(long, conflicts_with = "CODE")]
    clear: bool,
  },

  /// List the registered filters
  Filters,
}

fn get_log_level(verbose: u8) -> log::LevelFilter {
  match verbose {
    0 => log::LevelFilter::Off,
    1 => log::LevelFilter::Error,
    2 => log::LevelFilter::Warn,
    3 => log::LevelFilter::Info,
    4 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  }
}

fn create_project() -> Result<ProjectDirs, Error> {
  ProjectDirs::from("org", "viewfilters", "viewfilters").ok_or(Error::ConfigDir)
}

fn storage_path(general_opts: &GeneralOpts) -> Result<PathBuf, Error> {
  if let Some(path) = &general_opts.storage {
    return Ok(path.clone());
  }

  let project = create_project()?;
  Ok(project.config_dir().join("settings.json"))
}

fn utc_offset(general_opts: &GeneralOpts) -> Result<FixedOffset, Error> {
  match &general_opts.utc_offset {
    Some(offset) => offset.parse().map_err(|_| Error::Offset(offset.clone())),
    None => Ok(Local::now().offset().fix()),
  }
}

fn parse_seconds(input: &str) -> Result<f64, Error> {
  if let Ok(seconds) = input.trim().parse::<f64>() {
    return Ok(seconds);
  }

  let duration = humantime::parse_duration(input).map_err(|e| Error::Duration(input.to_owned(), e))?;
  debug!("Parsed `{input}` as {}", format_duration(duration));
  Ok(duration.as_secs_f64())
}

fn read_source(path: &Path) -> Result<String, Error> {
  if path == Path::new("-") {
    let mut src = String::new();
    io::stdin().read_to_string(&mut src)?;
    return Ok(src);
  }

  Ok(fs::read_to_string(path)?)
}

fn render(filters: &Filters, template: &Path, context: Option<&Path>) -> Result<String, Error> {
  let template = Template::parse(&read_source(template)?)?;

  let context = match context {
    Some(path) => serde_json::from_str(&read_source(path)?).map_err(|e| Error::Json("context", e))?,
    None => Value::Null,
  };

  Ok(template.render(filters, &context)?)
}

fn lang(storage: &dyn Storage, code: Option<&str>, clear: bool) -> Result<Option<String>, Error> {
  if clear {
    storage.remove(LANG)?;
    info!("Cleared stored language");
    return Ok(None);
  }

  if let Some(code) = code {
    if duration::find_language(code).is_none() {
      let supported = duration::languages().collect::<Vec<_>>().join(", ");
      warn!("Durations cannot be spelled out in `{code}` (supported: {supported})");
    }

    storage.set(LANG, code)?;
    info!("Stored language `{code}`");
  }

  Ok(storage.get(LANG)?)
}

macro_rules! fail {
  ($logger:expr, $e:expr) => {
    match $e {
      Ok(v) => v,
      Err(e) => {
        let logger: bool = $logger;
        if logger {
          error!("Error: {e}");
        } else {
          eprintln!("Error: {e}");
        }
        std::process::exit(1);
      }
    }
  };
}

struct Context {
  have_logger: bool,
  storage: Arc<FileStorage>,
  filters: Filters,
}

impl Context {
  fn new(general_opts: &GeneralOpts) -> Self {
    let log_level = get_log_level(general_opts.verbose);
    let logger = env_logger::Builder::new().filter_level(log_level).try_init();
    if let Err(e) = &logger {
      eprintln!("Error initializing logger: {e}");
    }
    let have_logger = logger.is_ok();

    let storage_path = fail!(have_logger, storage_path(general_opts));
    debug!("Storage file: {}", storage_path.display());
    let offset = fail!(have_logger, utc_offset(general_opts));
    debug!("Rendering dates at UTC offset {offset}");

    let storage = Arc::new(FileStorage::new(storage_path));
    let filters = Filters::with_offset(storage.clone(), offset);

    Self { have_logger, storage, filters }
  }

  fn apply(&self, name: &str, value: Value, args: &[Value]) -> String {
    fail!(self.have_logger, self.filters.apply(name, &value, args).map_err(Error::from))
  }
}

fn main() {
  let start_time = Instant::now();
  let args = Opt::parse();
  let context = Context::new(&args.general_opts);

  match args.command {
    Command::Id { value } => println!("{}", context.apply("id", Value::String(value), &[])),
    Command::Cap { value } => println!("{}", context.apply("cap", Value::String(value), &[])),
    Command::Duration { duration, options } => {
      let seconds = fail!(context.have_logger, parse_seconds(&duration));
      let options = match options {
        Some(options) => {
          vec![fail!(context.have_logger, serde_json::from_str::<Value>(&options).map_err(|e| Error::Json("options", e)))]
        }
        None => Vec::new(),
      };
      println!("{}", context.apply("humanizeDuration", Value::from(seconds), &options));
    }
    Command::Date { date, format } => {
      let args: Vec<_> = format.into_iter().map(Value::String).collect();
      let formatted = context.apply("date", Value::String(date.clone()), &args);
      if formatted == INVALID_DATE {
        warn!("Could not parse `{date}` as a date");
      }
      println!("{formatted}");
    }
    Command::Render { template, context: context_path } => {
      let rendered = fail!(context.have_logger, render(&context.filters, &template, context_path.as_deref()));
      print!("{rendered}");
    }
    Command::Lang { code, clear } => {
      let stored = fail!(context.have_logger, lang(context.storage.as_ref(), code.as_deref(), clear));
      match stored {
        Some(code) => println!("{code}"),
        None => println!("No stored language, using `{}`", duration::DEFAULT_LANGUAGE),
      }
    }
    Command::Filters => {
      for name in context.filters.names() {
        println!("{name}");
      }
    }
  }

  debug!("Total time: {}", format_duration(Instant::now().duration_since(start_time)));
}

#[cfg(test)]
mod tests {
  use super::*;

  use tempfile::TempDir;

  #[test]
  fn seconds_or_humantime() {
    assert_eq!(parse_seconds("90").unwrap(), 90.0);
    assert_eq!(parse_seconds("2.5").unwrap(), 2.5);
    assert_eq!(parse_seconds("1h 2m 5s").unwrap(), 3725.0);
    assert!(matches!(parse_seconds("soon"), Err(Error::Duration(..))));
  }

  #[test]
  fn log_levels() {
    assert_eq!(get_log_level(0), log::LevelFilter::Off);
    assert_eq!(get_log_level(3), log::LevelFilter::Info);
    assert_eq!(get_log_level(9), log::LevelFilter::Trace);
  }

  #[test]
  fn offsets() {
    let opts = GeneralOpts { verbose: 0, storage: None, utc_offset: Some(String::from("+02:00")) };
    assert_eq!(utc_offset(&opts).unwrap(), FixedOffset::east_opt(7200).unwrap());

    let opts = GeneralOpts { utc_offset: Some(String::from("later")), ..opts };
    assert!(matches!(utc_offset(&opts), Err(Error::Offset(_))));
  }

  #[test]
  fn lang_set_show_clear() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::new(dir.path().join("settings.json"));

    assert_eq!(lang(&storage, None, false).unwrap(), None);
    assert_eq!(lang(&storage, Some("de"), false).unwrap().as_deref(), Some("de"));
    assert_eq!(lang(&storage, None, false).unwrap().as_deref(), Some("de"));
    assert_eq!(lang(&storage, None, true).unwrap(), None);
  }

  #[test]
  fn render_files() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("row.tpl");
    let context = dir.path().join("row.json");
    fs::write(&template, "{{ id | id }} {{ state | cap }}").unwrap();
    fs::write(&context, r#"{"id": "0123456789abcdef", "state": "running"}"#).unwrap();

    let storage = Arc::new(FileStorage::new(dir.path().join("settings.json")));
    let filters = Filters::new(storage);
    assert_eq!(render(&filters, &template, Some(&context)).unwrap(), "01234567 Running");
  }

  #[test]
  fn render_bad_context() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("row.tpl");
    let context = dir.path().join("row.json");
    fs::write(&template, "{{ id }}").unwrap();
    fs::write(&context, "{").unwrap();

    let filters = Filters::new(Arc::new(FileStorage::new(dir.path().join("settings.json"))));
    assert!(matches!(render(&filters, &template, Some(&context)), Err(Error::Json("context", _))));
  }
}
