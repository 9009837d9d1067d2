use derive_more::Display;
use keysplit_core::{
    config::ConfigError,
    error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Whether retrying the whole call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind, ErrorKind::TransientScan)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match (err.class, err.origin) {
            (ErrorClass::InvalidArgument, _) => ErrorKind::InvalidArgument,
            (ErrorClass::SchemaUnavailable, _) => ErrorKind::SchemaUnavailable,
            (ErrorClass::Transient, _) => ErrorKind::TransientScan,
            (ErrorClass::Unsupported | ErrorClass::Corruption, CoreErrorOrigin::Codec) => {
                ErrorKind::UnsupportedType
            }
            (ErrorClass::Unsupported | ErrorClass::Corruption, CoreErrorOrigin::Partition) => {
                ErrorKind::FatalDecode
            }
            _ => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        InternalError::from(err).into()
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Bad table name, empty key columns, zero batch, or a mutation limit
    /// too small for the table's fanout.
    InvalidArgument,

    /// The catalog could not answer for a table.
    SchemaUnavailable,

    /// A value's type cannot be decoded.
    UnsupportedType,

    /// The scan failed mid-stream; retrying the whole call may succeed.
    TransientScan,

    /// A key column could not be decoded while partitioning.
    FatalDecode,

    /// The caller cannot remediate this.
    Internal,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Budget,
    Catalog,
    Codec,
    Config,
    Partition,
    Scan,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Budget => Self::Budget,
            CoreErrorOrigin::Catalog => Self::Catalog,
            CoreErrorOrigin::Codec => Self::Codec,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Partition => Self::Partition,
            CoreErrorOrigin::Scan => Self::Scan,
        }
    }
}
