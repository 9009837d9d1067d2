use crate::{db::key::KeyValue, error::InternalError, value::RawCell};

///
/// ScanRequest
///
/// One ordered key scan: `columns` ascending (first column major), strictly
/// after `start_after` when set, at most `limit` rows when set.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScanRequest {
    pub table: String,
    pub columns: Vec<String>,
    pub start_after: Option<KeyValue>,
    pub limit: Option<u64>,
}

impl ScanRequest {
    #[must_use]
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
            start_after: None,
            limit: None,
        }
    }

    #[must_use]
    pub fn start_after(mut self, key: KeyValue) -> Self {
        self.start_after = Some(key);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

///
/// ScanRow
///
/// One scanned row: a cell per requested column, in request order.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ScanRow {
    pub cells: Vec<RawCell>,
}

impl ScanRow {
    #[must_use]
    pub const fn new(cells: Vec<RawCell>) -> Self {
        Self { cells }
    }
}

///
/// RowStream
///
/// Pull-based, finite, forward-only row stream. Once it yields `None` or an
/// error it is not polled again.
///

pub trait RowStream {
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError>;
}

impl<T> RowStream for Box<T>
where
    T: RowStream + ?Sized,
{
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError> {
        self.as_mut().next_row()
    }
}

impl<T> RowStream for &mut T
where
    T: RowStream + ?Sized,
{
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError> {
        (**self).next_row()
    }
}

pub type RowStreamBox<'a> = Box<dyn RowStream + 'a>;

///
/// RowScanner
///
/// Query collaborator that opens ordered scans. Backend failures while
/// opening or streaming should surface as retryable (`Transient`) errors.
///

pub trait RowScanner {
    fn scan(&self, request: &ScanRequest) -> Result<RowStreamBox<'_>, InternalError>;
}

impl<T> RowScanner for &T
where
    T: RowScanner + ?Sized,
{
    fn scan(&self, request: &ScanRequest) -> Result<RowStreamBox<'_>, InternalError> {
        (**self).scan(request)
    }
}

///
/// VecRowStream
///
/// Adapter that exposes materialized rows through the `RowStream` interface.
///

#[derive(Debug)]
pub struct VecRowStream {
    rows: std::vec::IntoIter<ScanRow>,
}

impl VecRowStream {
    #[must_use]
    pub fn new(rows: Vec<ScanRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl RowStream for VecRowStream {
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError> {
        Ok(self.rows.next())
    }
}

///
/// BudgetedRowStream
///
/// Caps upstream row production after a fixed number of emitted rows, so a
/// scan limit holds even when the collaborator ignores it. Once the budget
/// is spent the inner stream is polled exactly once more, to tell a stream
/// that ended on the limit apart from one that was cut short.
///

pub struct BudgetedRowStream<S> {
    inner: S,
    remaining: u64,
    truncated: Option<bool>,
}

impl<S> BudgetedRowStream<S>
where
    S: RowStream,
{
    #[must_use]
    pub const fn new(inner: S, remaining: u64) -> Self {
        Self {
            inner,
            remaining,
            truncated: None,
        }
    }

    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// True once the budget is spent and the inner stream still had a row.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        matches!(self.truncated, Some(true))
    }
}

impl<S> RowStream for BudgetedRowStream<S>
where
    S: RowStream,
{
    fn next_row(&mut self) -> Result<Option<ScanRow>, InternalError> {
        if self.remaining == 0 {
            if self.truncated.is_none() {
                self.truncated = Some(self.inner.next_row()?.is_some());
            }

            return Ok(None);
        }

        match self.inner.next_row()? {
            Some(row) => {
                self.remaining = self.remaining.saturating_sub(1);
                Ok(Some(row))
            }
            None => {
                self.truncated = Some(false);
                Ok(None)
            }
        }
    }
}
