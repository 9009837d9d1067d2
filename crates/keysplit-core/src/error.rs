use crate::value::DecodeError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// The public facade maps `class` + `origin` onto its caller-facing taxonomy.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Attach structured detail to an existing error.
    #[must_use]
    pub fn with_detail(mut self, detail: ErrorDetail) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Construct a caller-argument error.
    pub(crate) fn invalid_argument(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::InvalidArgument, origin, message)
    }

    /// Construct a catalog lookup failure for one table.
    pub fn schema_unavailable(table: &str, message: impl Into<String>) -> Self {
        let message = message.into();

        Self::new(
            ErrorClass::SchemaUnavailable,
            ErrorOrigin::Catalog,
            format!("schema unavailable for table '{table}': {message}"),
        )
    }

    /// Construct the standard unknown-table catalog error.
    pub fn table_not_found(table: &str) -> Self {
        Self::schema_unavailable(table, "table not found")
    }

    /// Construct a retryable scan failure.
    pub fn transient_scan(table: &str, message: impl Into<String>) -> Self {
        let message = message.into();

        Self::new(
            ErrorClass::Transient,
            ErrorOrigin::Scan,
            format!("scan of table '{table}' failed: {message}"),
        )
        .with_detail(ErrorDetail::Scan {
            table: table.to_string(),
            column: None,
        })
    }

    /// Construct a scan-origin contract violation (collaborator bug).
    pub(crate) fn scan_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Scan, message)
    }

    /// Construct a scan contract violation: rows out of key order,
    /// repeated, or at or before the resume key.
    pub(crate) fn scan_corruption(table: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Scan, message).with_detail(
            ErrorDetail::Scan {
                table: table.to_string(),
                column: None,
            },
        )
    }

    /// Wrap a codec failure raised while decoding one key column of a scan row.
    pub(crate) fn key_decode(table: &str, column: &str, err: DecodeError) -> Self {
        let class = err.class();

        Self::new(
            class,
            ErrorOrigin::Partition,
            format!("cannot decode key column '{column}' of table '{table}': {err}"),
        )
        .with_detail(ErrorDetail::Decode(err))
    }

    /// Whether retrying the whole call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.class, ErrorClass::Transient)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<DecodeError> for InternalError {
    fn from(err: DecodeError) -> Self {
        Self::new(err.class(), ErrorOrigin::Codec, err.to_string())
            .with_detail(ErrorDetail::Decode(err))
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Decode(DecodeError),

    #[error("scan of '{table}' failed")]
    Scan {
        table: String,
        column: Option<String>,
    },
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    InvalidArgument,
    SchemaUnavailable,
    Unsupported,
    Transient,
    Corruption,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InvalidArgument => "invalid_argument",
            Self::SchemaUnavailable => "schema_unavailable",
            Self::Unsupported => "unsupported",
            Self::Transient => "transient",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Codec,
    Catalog,
    Budget,
    Partition,
    Scan,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Codec => "codec",
            Self::Catalog => "catalog",
            Self::Budget => "budget",
            Self::Partition => "partition",
            Self::Scan => "scan",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}
