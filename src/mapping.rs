// ABOUTME: Static table/column mapping between the legacy and target schemas
// ABOUTME: Builds the count and projection SQL for both sides of the check

use crate::error::{CheckError, Result};

/// Which of the two stores a column list, source or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The SQLite database being migrated from.
    Legacy,
    /// The PostgreSQL database being migrated to.
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Legacy => write!(f, "legacy"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// One logical table present in both stores.
///
/// The two column lists have equal length and equal positional meaning:
/// column `i` of `legacy_columns` is the semantic counterpart of column
/// `i` of `target_columns`, even where the names differ (`created_at`
/// vs `created`). The table name itself is identical on both sides.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub legacy_columns: &'static [&'static str],
    pub target_columns: &'static [&'static str],
    /// Primary-key column both projections sort by.
    pub order_column: &'static str,
}

/// The five movie-catalog tables covered by the check, in check order.
pub const MOVIES_TABLES: &[TableSpec] = &[
    TableSpec {
        name: "film_work",
        legacy_columns: &[
            "id",
            "title",
            "description",
            "creation_date",
            "rating",
            "type",
            "created_at",
            "updated_at",
        ],
        target_columns: &[
            "id",
            "title",
            "description",
            "creation_date",
            "rating",
            "type",
            "created",
            "modified",
        ],
        order_column: "id",
    },
    TableSpec {
        name: "genre",
        legacy_columns: &["id", "name", "description", "created_at", "updated_at"],
        target_columns: &["id", "name", "description", "created", "modified"],
        order_column: "id",
    },
    TableSpec {
        name: "person",
        legacy_columns: &["id", "full_name", "created_at", "updated_at"],
        target_columns: &["id", "full_name", "created", "modified"],
        order_column: "id",
    },
    TableSpec {
        name: "genre_film_work",
        legacy_columns: &["id", "genre_id", "film_work_id", "created_at"],
        target_columns: &["id", "genre_id", "film_work_id", "created"],
        order_column: "id",
    },
    TableSpec {
        name: "person_film_work",
        legacy_columns: &["id", "film_work_id", "person_id", "role", "created_at"],
        target_columns: &["id", "film_work_id", "person_id", "role", "created"],
        order_column: "id",
    },
];

impl TableSpec {
    /// The column list for one side of the check.
    pub fn columns(&self, side: Side) -> &'static [&'static str] {
        match side {
            Side::Legacy => self.legacy_columns,
            Side::Target => self.target_columns,
        }
    }

    /// The row-count query, identical for both sides.
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.name)
    }

    /// The projection query for one side, sorted by the primary key.
    ///
    /// Sorting makes pairwise row comparison well-defined: without it the
    /// two databases may return rows in different physical orders even
    /// when the content matches.
    ///
    /// # Examples
    ///
    /// ```
    /// # use movies_migration_checker::mapping::{Side, MOVIES_TABLES};
    /// let genre = &MOVIES_TABLES[1];
    /// assert_eq!(
    ///     genre.projection_sql(Side::Target),
    ///     "SELECT id, name, description, created, modified FROM genre ORDER BY id"
    /// );
    /// ```
    pub fn projection_sql(&self, side: Side) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.columns(side).join(", "),
            self.name,
            self.order_column
        )
    }

    /// Human-readable label for a column position, e.g. `created_at/created`
    /// when the sides name it differently or just `id` when they agree.
    pub fn column_label(&self, index: usize) -> String {
        let legacy = self.legacy_columns[index];
        let target = self.target_columns[index];
        if legacy == target {
            legacy.to_string()
        } else {
            format!("{}/{}", legacy, target)
        }
    }
}

/// Resolve a user-supplied table list against the mapping.
///
/// Returns the matching specs in mapping order (the order tables are
/// checked in), independent of the order the names were given in.
/// Unknown names are a configuration error listing the valid tables.
pub fn subset(names: &[String]) -> Result<Vec<TableSpec>> {
    for name in names {
        if !MOVIES_TABLES.iter().any(|t| t.name == name) {
            let valid: Vec<&str> = MOVIES_TABLES.iter().map(|t| t.name).collect();
            return Err(CheckError::Config(format!(
                "unknown table '{}' (valid tables: {})",
                name,
                valid.join(", ")
            )));
        }
    }
    Ok(MOVIES_TABLES
        .iter()
        .filter(|t| names.iter().any(|n| n == t.name))
        .copied()
        .collect())
}
