use thiserror::Error;

use crate::config::ConfigError;

/// Convenience result type for data-source operations.
pub type SourceResult<T> = Result<T, DataSourceError>;

/// Error type shared by both data-source backends.
///
/// Lower-level failures (file I/O, workbook parsing, SQL engine errors) are
/// caught at the backend boundary and re-wrapped into one of these variants
/// with the original message preserved as context, so callers never see a raw
/// calamine or rusqlite error.
#[derive(Debug, Error)]
pub enum DataSourceError {
    /// The query or parse ran but produced no usable rows, or the underlying
    /// parse/query itself failed.
    #[error("data not found: {message}")]
    DataNotFound { message: String },

    /// The metadata block is absent or empty, or the sheet holding it could
    /// not be read.
    #[error("metadata not found: {message}")]
    MetadataNotFound { message: String },

    /// The backend does not implement the requested operation. Distinct from
    /// [`DataSourceError::DataNotFound`]: the data may well exist, the
    /// operation itself is the gap.
    #[error("not supported: {message}")]
    Unsupported { message: String },

    /// Generic backend failure: misconfiguration, unknown backend kind, or a
    /// broken ingestion precondition.
    #[error("data source error: {message}")]
    Backend { message: String },
}

impl DataSourceError {
    pub(crate) fn data_not_found(message: impl Into<String>) -> Self {
        Self::DataNotFound {
            message: message.into(),
        }
    }

    pub(crate) fn metadata_not_found(message: impl Into<String>) -> Self {
        Self::MetadataNotFound {
            message: message.into(),
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    pub(crate) fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// Top-level application error, used by the server binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or parsed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A data-source backend failed to construct or answer.
    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    /// Server I/O error (e.g. the listener could not bind).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
