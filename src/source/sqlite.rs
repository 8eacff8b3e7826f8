// ABOUTME: Legacy-side table source reading the single-file SQLite database
// ABOUTME: Opens the file read-only and serves ordered projection pages

use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use crate::error::{CheckError, Result};
use crate::mapping::{Side, TableSpec};
use crate::source::{ProjectedRow, TableSource};
use crate::value::ScalarValue;

/// The legacy store: a read-only handle on the SQLite file.
///
/// rusqlite is synchronous; the connection sits behind a
/// `parking_lot::Mutex` so the source satisfies the trait's `Send + Sync`
/// bounds. The guard is never held across an await.
pub struct SqliteSource {
    conn: Mutex<Connection>,
}

impl SqliteSource {
    /// Open the legacy database file.
    ///
    /// The file is opened read-only: the checker never writes, and a
    /// missing file must fail instead of silently creating an empty
    /// database.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::LegacyConnection`] naming the path when the
    /// file is missing or unreadable.
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            CheckError::LegacyConnection {
                path: path.to_path_buf(),
                source: e,
            }
        })?;
        tracing::debug!("opened legacy database at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn query_err(table: &TableSpec, source: rusqlite::Error) -> CheckError {
    CheckError::LegacyQuery {
        table: table.name.to_string(),
        source,
    }
}

fn sqlite_value(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<ScalarValue> {
    let value = match row.get_ref(idx)? {
        ValueRef::Null => ScalarValue::Null,
        ValueRef::Integer(i) => ScalarValue::Int(i),
        ValueRef::Real(f) => ScalarValue::Real(f),
        ValueRef::Text(s) => ScalarValue::Text(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => ScalarValue::Bytes(b.to_vec()),
    };
    Ok(value)
}

#[async_trait]
impl TableSource for SqliteSource {
    fn side(&self) -> Side {
        Side::Legacy
    }

    async fn count(&self, table: &TableSpec) -> Result<i64> {
        let conn = self.conn.lock();
        conn.query_row(&table.count_sql(), [], |row| row.get(0))
            .map_err(|e| query_err(table, e))
    }

    async fn fetch_page(
        &self,
        table: &TableSpec,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ProjectedRow>> {
        let side = self.side();
        let sql = format!("{} LIMIT ?1 OFFSET ?2", table.projection_sql(side));
        let width = table.columns(side).len();

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql).map_err(|e| query_err(table, e))?;
        let mut rows = stmt
            .query(rusqlite::params![limit as i64, offset as i64])
            .map_err(|e| query_err(table, e))?;

        let mut page = Vec::new();
        while let Some(row) = rows.next().map_err(|e| query_err(table, e))? {
            let mut projected = Vec::with_capacity(width);
            for idx in 0..width {
                projected.push(sqlite_value(row, idx).map_err(|e| query_err(table, e))?);
            }
            page.push(projected);
        }
        Ok(page)
    }
}
