// ABOUTME: Source abstraction over the two databases under comparison
// ABOUTME: Defines the TableSource trait and the pull-based row stream

pub mod postgres;
pub mod sqlite;

pub use postgres::PostgresSource;
pub use sqlite::SqliteSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::mapping::{Side, TableSpec};
use crate::value::ScalarValue;

/// One projected row: one value per mapped column, in column-list order.
pub type ProjectedRow = Vec<ScalarValue>;

/// A database that can count a table and serve projected row pages.
///
/// The comparison engine only ever sees this trait, so it runs unchanged
/// against the real SQLite and PostgreSQL sources or against in-memory
/// fakes in tests. Implementations use the column list for their own
/// side of the mapping and must sort by the table's order column so that
/// page boundaries are deterministic.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Which side of the migration this source serves.
    fn side(&self) -> Side;

    /// `SELECT COUNT(*)` for one table.
    async fn count(&self, table: &TableSpec) -> Result<i64>;

    /// One page of the ordered projection, `limit` rows starting at
    /// `offset`. A page shorter than `limit` means the table is
    /// exhausted.
    async fn fetch_page(
        &self,
        table: &TableSpec,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ProjectedRow>>;
}

/// Pull-based iteration over one table's ordered projection.
///
/// Fetches `batch_size` rows at a time and hands them out one by one, so
/// a table is never materialized in memory. Restartable by constructing
/// a fresh stream.
pub struct RowStream<'a> {
    source: &'a dyn TableSource,
    table: &'a TableSpec,
    batch_size: u64,
    offset: u64,
    buffer: std::collections::VecDeque<ProjectedRow>,
    exhausted: bool,
}

impl<'a> RowStream<'a> {
    pub fn new(source: &'a dyn TableSource, table: &'a TableSpec, batch_size: u64) -> Self {
        // A zero batch would never make progress
        let batch_size = batch_size.max(1);
        Self {
            source,
            table,
            batch_size,
            offset: 0,
            buffer: std::collections::VecDeque::new(),
            exhausted: false,
        }
    }

    /// The next row, or `None` once the projection is exhausted.
    pub async fn next_row(&mut self) -> Result<Option<ProjectedRow>> {
        if self.buffer.is_empty() && !self.exhausted {
            let page = self
                .source
                .fetch_page(self.table, self.offset, self.batch_size)
                .await?;
            if (page.len() as u64) < self.batch_size {
                self.exhausted = true;
            }
            self.offset += page.len() as u64;
            self.buffer.extend(page);
        }
        Ok(self.buffer.pop_front())
    }
}
