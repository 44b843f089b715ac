//! `regiostat` serves regional statistical time-series (GDP, employment)
//! over HTTP, sourced interchangeably from an Excel workbook or a SQLite
//! database and filtered by NUTS level (1/2/3).
//!
//! The heart of the crate is the data-source abstraction in [`source`]: two
//! structurally different backends (a spreadsheet whose sheets carry a
//! 3-row metadata block above the real header, and a plain relational store)
//! are normalized into one access contract ([`source::DataSource`]) producing
//! the shared [`model::DataTable`] representation. The SQLite backend can
//! bootstrap itself once from the workbook at construction time.
//!
//! ```no_run
//! use regiostat::config::DataSourceConfig;
//! use regiostat::source::{AnyDataSource, DataLevel, DataSource};
//!
//! # fn main() -> Result<(), regiostat::DataSourceError> {
//! let config = DataSourceConfig::default(); // sqlite, my_database.db
//! let source = AnyDataSource::from_config(&config)?;
//! let table = source.get_data("1.1", DataLevel::Level1)?;
//! println!("rows={}", table.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`model`]: the in-memory tabular value shared by all components
//! - [`source`]: backends, factory, and the normalization/ingestion logic
//! - [`web`]: axum routes serving the data as JSON
//! - [`config`]: YAML configuration with per-field defaults
//! - [`error`]: error types used across the crate

pub mod config;
pub mod error;
pub mod model;
pub mod source;
pub mod web;

pub use error::{AppError, DataSourceError, SourceResult};
