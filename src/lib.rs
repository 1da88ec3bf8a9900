#![warn(clippy::all)]
#![warn(missing_docs)]

//! viewfilters is a library of small text-formatting filters for view templates.
//!
//! It provides a registry of named filters (`id`, `humanizeDuration`, `cap` and `date`),
//! the formatting code behind them and a minimal template renderer that looks filters up
//! in that registry.

pub mod date;
pub mod duration;
pub mod filters;
pub mod storage;
pub mod template;
pub mod text;
