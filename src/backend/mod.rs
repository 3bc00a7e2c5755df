pub mod sqlserver;

use crate::error::ReportError;
use crate::model::ConnectionConfig;
use std::future::Future;

/// Metadata for a single result column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    pub type_name: String,
}

/// A single cell value from a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Null,
}

impl CellValue {
    pub fn as_str(&self) -> &str {
        match self {
            CellValue::Text(s) => s,
            CellValue::Null => "",
        }
    }
}

/// Rows returned by a lookup, in the order the database produced them.
/// Each row holds one cell per entry in `columns`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// A verified database handle owned by one session.
///
/// Every call acquires its own connection and releases it before returning.
pub trait Backend: Send + Sync + 'static {
    fn query(
        &self,
        sql: &str,
        params: &[&str],
    ) -> impl Future<Output = Result<QueryResult, ReportError>> + Send;
}

/// Opens and verifies handles from connection form input.
pub trait Connector: Send + Sync + 'static {
    type Handle: Backend;

    /// Open a connection for `config` and confirm it answers `SELECT 1`.
    fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> impl Future<Output = Result<Self::Handle, ReportError>> + Send;
}
