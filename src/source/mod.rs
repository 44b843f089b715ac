//! Data-source abstraction layer.
//!
//! Two structurally different storage backends, a spreadsheet with a
//! metadata header block and a relational SQLite store, are normalized
//! behind one uniform access contract, [`DataSource`]. The factory on
//! [`AnyDataSource`] is the only place that branches on the backend kind.

pub mod excel;
pub mod sqlite;

use std::str::FromStr;

use thiserror::Error;

use crate::config::DataSourceConfig;
use crate::error::{DataSourceError, SourceResult};
use crate::model::DataTable;

pub use excel::ExcelDataSource;
pub use sqlite::SqliteDataSource;

/// The fixed-length block of descriptive text preceding a sheet's header row.
pub type MetadataBlock = Vec<String>;

/// Administrative granularity of a request, level 1 being the coarsest.
///
/// Each level maps to a `NUTS {level}` filter column; a row belongs to the
/// level when that column equals the level's string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataLevel {
    /// NUTS level 1 (e.g. German federal states).
    Level1,
    /// NUTS level 2 (government regions).
    Level2,
    /// NUTS level 3 (districts).
    Level3,
}

impl DataLevel {
    /// All levels, coarsest first.
    pub const ALL: [DataLevel; 3] = [DataLevel::Level1, DataLevel::Level2, DataLevel::Level3];

    /// String form of the level, also the value rows are filtered on.
    pub fn as_str(self) -> &'static str {
        match self {
            DataLevel::Level1 => "1",
            DataLevel::Level2 => "2",
            DataLevel::Level3 => "3",
        }
    }

    /// Name of the column this level filters on.
    pub fn column_name(self) -> &'static str {
        match self {
            DataLevel::Level1 => "NUTS 1",
            DataLevel::Level2 => "NUTS 2",
            DataLevel::Level3 => "NUTS 3",
        }
    }
}

/// Error returned when a string is not a recognized data level.
///
/// Raised by the routing layer before any backend is consulted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid data level '{0}' (expected 1, 2 or 3)")]
pub struct InvalidDataLevel(pub String);

impl FromStr for DataLevel {
    type Err = InvalidDataLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(DataLevel::Level1),
            "2" => Ok(DataLevel::Level2),
            "3" => Ok(DataLevel::Level3),
            other => Err(InvalidDataLevel(other.to_string())),
        }
    }
}

/// Uniform access contract implemented by both backends.
pub trait DataSource {
    /// Rows of `table` at `level`, with every row's `NUTS {level}` column
    /// equal to the level's string form.
    ///
    /// Fails with [`DataSourceError::DataNotFound`] when the result is empty
    /// or the underlying parse/query fails.
    fn get_data(&self, table: &str, level: DataLevel) -> SourceResult<DataTable>;

    /// The descriptive metadata block of `table`.
    ///
    /// Fails with [`DataSourceError::MetadataNotFound`] when the block is
    /// absent or empty, or [`DataSourceError::Unsupported`] on backends
    /// without a metadata convention.
    fn get_metadata(&self, table: &str) -> SourceResult<MetadataBlock>;
}

/// The closed set of backends.
#[derive(Debug)]
pub enum AnyDataSource {
    /// Workbook-backed source.
    Excel(ExcelDataSource),
    /// SQLite-backed source.
    Sqlite(SqliteDataSource),
}

impl AnyDataSource {
    /// Construct the backend selected by `config`.
    ///
    /// For the sqlite kind this may run the one-shot ingestion bootstrap as a
    /// construction side effect (store absent and ingestion flag set). Fails
    /// with a [`DataSourceError::Backend`] error for an unrecognized kind.
    pub fn from_config(config: &DataSourceConfig) -> SourceResult<Self> {
        match config.kind.as_str() {
            "sqlite" => Ok(Self::Sqlite(SqliteDataSource::open(&config.sqlite)?)),
            "excel" => Ok(Self::Excel(ExcelDataSource::open(&config.excel.file_name)?)),
            other => Err(DataSourceError::backend(format!(
                "unknown data source type: {other}"
            ))),
        }
    }
}

impl DataSource for AnyDataSource {
    fn get_data(&self, table: &str, level: DataLevel) -> SourceResult<DataTable> {
        match self {
            Self::Excel(source) => source.get_data(table, level),
            Self::Sqlite(source) => source.get_data(table, level),
        }
    }

    fn get_metadata(&self, table: &str) -> SourceResult<MetadataBlock> {
        match self {
            Self::Excel(source) => source.get_metadata(table),
            Self::Sqlite(source) => source.get_metadata(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DataLevel;

    #[test]
    fn levels_parse_from_their_string_form() {
        for level in DataLevel::ALL {
            assert_eq!(level.as_str().parse::<DataLevel>(), Ok(level));
        }
    }

    #[test]
    fn out_of_range_levels_are_rejected() {
        assert!("4".parse::<DataLevel>().is_err());
        assert!("0".parse::<DataLevel>().is_err());
        assert!("".parse::<DataLevel>().is_err());
        assert!("one".parse::<DataLevel>().is_err());
    }

    #[test]
    fn each_level_filters_a_distinct_column() {
        let columns: Vec<_> = DataLevel::ALL.iter().map(|l| l.column_name()).collect();
        assert_eq!(columns, vec!["NUTS 1", "NUTS 2", "NUTS 3"]);
    }
}
