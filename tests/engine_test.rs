// ABOUTME: Comparison-engine tests over in-memory fake sources
// ABOUTME: Exercises the count and data comparators without any real database

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use movies_migration_checker::checker::{compare_counts, compare_table_rows};
use movies_migration_checker::error::{CheckError, Result};
use movies_migration_checker::mapping::{subset, Side, TableSpec, MOVIES_TABLES};
use movies_migration_checker::source::{ProjectedRow, TableSource};
use movies_migration_checker::value::ScalarValue;
use uuid::Uuid;

/// In-memory table source serving fixed rows per table.
///
/// Tables not registered behave as empty, matching a store where the
/// table exists but holds no rows.
struct FakeSource {
    side: Side,
    tables: HashMap<&'static str, Vec<ProjectedRow>>,
}

impl FakeSource {
    fn new(side: Side) -> Self {
        Self {
            side,
            tables: HashMap::new(),
        }
    }

    fn with_table(mut self, name: &'static str, rows: Vec<ProjectedRow>) -> Self {
        self.tables.insert(name, rows);
        self
    }
}

#[async_trait]
impl TableSource for FakeSource {
    fn side(&self) -> Side {
        self.side
    }

    async fn count(&self, table: &TableSpec) -> Result<i64> {
        Ok(self
            .tables
            .get(table.name)
            .map_or(0, |rows| rows.len() as i64))
    }

    async fn fetch_page(
        &self,
        table: &TableSpec,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ProjectedRow>> {
        let rows = match self.tables.get(table.name) {
            Some(rows) => rows,
            None => return Ok(Vec::new()),
        };
        let start = (offset as usize).min(rows.len());
        let end = (start + limit as usize).min(rows.len());
        Ok(rows[start..end].to_vec())
    }
}

fn table(name: &str) -> &'static TableSpec {
    MOVIES_TABLES
        .iter()
        .find(|t| t.name == name)
        .expect("unknown table in test")
}

fn text(s: &str) -> ScalarValue {
    ScalarValue::Text(s.to_string())
}

fn uuid_value(s: &str) -> ScalarValue {
    ScalarValue::Uuid(Uuid::parse_str(s).unwrap())
}

fn timestamp(rfc3339: &str) -> ScalarValue {
    ScalarValue::Timestamp(
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc),
    )
}

const GENRE_IDS: [&str; 3] = [
    "120a21cf-9296-4d22-9d7d-8bcbe22e1b4b",
    "3d8d9bf5-0d90-4353-88ba-4ccc5d2c07ff",
    "6a0a479b-cfec-41ac-b520-41b2b007b611",
];

/// Legacy genre rows the way SQLite returns them: everything TEXT,
/// timestamps with the `+00` suffix the migration source carries.
fn legacy_genre_rows() -> Vec<ProjectedRow> {
    vec![
        vec![
            text(GENRE_IDS[0]),
            text("Adventure"),
            ScalarValue::Null,
            text("2021-06-16 20:14:09.221838+00"),
            text("2021-06-16 20:14:09.221855+00"),
        ],
        vec![
            text(GENRE_IDS[1]),
            text("Action"),
            text("Fast paced"),
            text("2021-06-16 20:14:09.310212+00"),
            text("2021-06-16 20:14:09.310230+00"),
        ],
        vec![
            text(GENRE_IDS[2]),
            text("Comedy"),
            ScalarValue::Null,
            text("2021-06-16 20:14:09.432112+00"),
            text("2021-06-16 20:14:09.432130+00"),
        ],
    ]
}

/// The same three genres as PostgreSQL returns them: typed UUIDs and
/// timestamptz values.
fn target_genre_rows() -> Vec<ProjectedRow> {
    vec![
        vec![
            uuid_value(GENRE_IDS[0]),
            text("Adventure"),
            ScalarValue::Null,
            timestamp("2021-06-16T20:14:09.221838Z"),
            timestamp("2021-06-16T20:14:09.221855Z"),
        ],
        vec![
            uuid_value(GENRE_IDS[1]),
            text("Action"),
            text("Fast paced"),
            timestamp("2021-06-16T20:14:09.310212Z"),
            timestamp("2021-06-16T20:14:09.310230Z"),
        ],
        vec![
            uuid_value(GENRE_IDS[2]),
            text("Comedy"),
            ScalarValue::Null,
            timestamp("2021-06-16T20:14:09.432112Z"),
            timestamp("2021-06-16T20:14:09.432130Z"),
        ],
    ]
}

/// A film_work row on the legacy side; `rating` is the only column the
/// mismatch tests vary.
fn legacy_film_row(rating: f64) -> ProjectedRow {
    vec![
        text("025c58cd-1b7e-43be-9ffb-8571a613579b"),
        text("Star Wars: Episode VI - Return of the Jedi"),
        text("Luke Skywalker battles Jabba the Hutt and Darth Vader"),
        text("1983-05-25"),
        ScalarValue::Real(rating),
        text("movie"),
        text("2021-06-16 20:14:09.221838+00"),
        text("2021-06-16 20:14:09.221855+00"),
    ]
}

fn target_film_row(rating: f64) -> ProjectedRow {
    vec![
        uuid_value("025c58cd-1b7e-43be-9ffb-8571a613579b"),
        text("Star Wars: Episode VI - Return of the Jedi"),
        text("Luke Skywalker battles Jabba the Hutt and Darth Vader"),
        ScalarValue::Date(chrono::NaiveDate::from_ymd_opt(1983, 5, 25).unwrap()),
        ScalarValue::Real(rating),
        text("movie"),
        timestamp("2021-06-16T20:14:09.221838Z"),
        timestamp("2021-06-16T20:14:09.221855Z"),
    ]
}

#[tokio::test]
async fn test_counts_match_across_all_tables() {
    let legacy = FakeSource::new(Side::Legacy)
        .with_table("film_work", vec![legacy_film_row(7.5)])
        .with_table("genre", legacy_genre_rows());
    let target = FakeSource::new(Side::Target)
        .with_table("film_work", vec![target_film_row(7.5)])
        .with_table("genre", target_genre_rows());

    let report = compare_counts(&legacy, &target, MOVIES_TABLES)
        .await
        .unwrap();

    assert!(report.matches());
    assert_eq!(report.legacy, vec![1, 3, 0, 0, 0]);
    assert_eq!(report.target, vec![1, 3, 0, 0, 0]);
    assert!(report.mismatch_error().is_none());
}

#[tokio::test]
async fn test_count_mismatch_cites_sequences_and_first_table() {
    // Ten film_work rows on the legacy side, nine on the target
    let legacy = FakeSource::new(Side::Legacy)
        .with_table("film_work", (0..10).map(|_| legacy_film_row(7.5)).collect());
    let target = FakeSource::new(Side::Target)
        .with_table("film_work", (0..9).map(|_| target_film_row(7.5)).collect());

    let report = compare_counts(&legacy, &target, MOVIES_TABLES)
        .await
        .unwrap();

    assert!(!report.matches());
    let err = report.mismatch_error().unwrap();
    match &err {
        CheckError::CountMismatch {
            legacy,
            target,
            table,
        } => {
            assert_eq!(legacy, &vec![10, 0, 0, 0, 0]);
            assert_eq!(target, &vec![9, 0, 0, 0, 0]);
            assert_eq!(table, "film_work");
        }
        other => panic!("expected CountMismatch, got {:?}", other),
    }

    // The rendered message carries both full sequences
    let msg = err.to_string();
    assert!(msg.contains("[10, 0, 0, 0, 0]"));
    assert!(msg.contains("[9, 0, 0, 0, 0]"));
}

#[tokio::test]
async fn test_genre_data_equality_passes() {
    let legacy = FakeSource::new(Side::Legacy).with_table("genre", legacy_genre_rows());
    let target = FakeSource::new(Side::Target).with_table("genre", target_genre_rows());

    // Batch size 2 forces the streams across a page boundary
    let compared = compare_table_rows(&legacy, &target, table("genre"), 2)
        .await
        .unwrap();
    assert_eq!(compared, 3);
}

#[tokio::test]
async fn test_rating_rounding_divergence_fails_on_that_row() {
    let legacy = FakeSource::new(Side::Legacy)
        .with_table("film_work", vec![legacy_film_row(7.5)]);
    let target = FakeSource::new(Side::Target)
        .with_table("film_work", vec![target_film_row(7.50001)]);

    let err = compare_table_rows(&legacy, &target, table("film_work"), 1000)
        .await
        .unwrap_err();

    match &err {
        CheckError::RowMismatch {
            table,
            row,
            column,
            legacy,
            target,
        } => {
            assert_eq!(table, "film_work");
            assert_eq!(*row, 1);
            assert_eq!(column, "rating");
            assert_eq!(legacy, "7.5");
            assert_eq!(target, "7.50001");
        }
        other => panic!("expected RowMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_data_comparison_aborts_at_first_differing_row() {
    // Both rows diverge; only the first is reported
    let legacy = FakeSource::new(Side::Legacy).with_table(
        "film_work",
        vec![legacy_film_row(7.5), legacy_film_row(8.0)],
    );
    let target = FakeSource::new(Side::Target).with_table(
        "film_work",
        vec![target_film_row(7.4), target_film_row(8.1)],
    );

    let err = compare_table_rows(&legacy, &target, table("film_work"), 1000)
        .await
        .unwrap_err();

    match err {
        CheckError::RowMismatch { row, .. } => assert_eq!(row, 1),
        other => panic!("expected RowMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_renamed_timestamp_columns_are_labeled_with_both_names() {
    let mut legacy_rows = legacy_genre_rows();
    // Perturb created_at on the second row
    legacy_rows[1][3] = text("2021-06-16 20:14:10.000000+00");

    let legacy = FakeSource::new(Side::Legacy).with_table("genre", legacy_rows);
    let target = FakeSource::new(Side::Target).with_table("genre", target_genre_rows());

    let err = compare_table_rows(&legacy, &target, table("genre"), 1000)
        .await
        .unwrap_err();

    match &err {
        CheckError::RowMismatch { row, column, .. } => {
            assert_eq!(*row, 2);
            assert_eq!(column, "created_at/created");
        }
        other => panic!("expected RowMismatch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_trailing_target_rows_are_an_error() {
    let mut extra = target_genre_rows();
    extra.push(vec![
        uuid_value("237fd1e4-c98e-454e-aa13-8a13fb7547b5"),
        text("Drama"),
        ScalarValue::Null,
        timestamp("2021-06-16T20:14:09.532112Z"),
        timestamp("2021-06-16T20:14:09.532130Z"),
    ]);

    let legacy = FakeSource::new(Side::Legacy).with_table("genre", legacy_genre_rows());
    let target = FakeSource::new(Side::Target).with_table("genre", extra);

    let err = compare_table_rows(&legacy, &target, table("genre"), 2)
        .await
        .unwrap_err();

    match err {
        CheckError::TrailingRows {
            table,
            side,
            compared,
        } => {
            assert_eq!(table, "genre");
            assert_eq!(side, Side::Target);
            assert_eq!(compared, 3);
        }
        other => panic!("expected TrailingRows, got {:?}", other),
    }
}

#[tokio::test]
async fn test_trailing_legacy_rows_are_an_error() {
    let legacy = FakeSource::new(Side::Legacy).with_table("genre", legacy_genre_rows());
    let target = FakeSource::new(Side::Target)
        .with_table("genre", target_genre_rows()[..2].to_vec());

    let err = compare_table_rows(&legacy, &target, table("genre"), 1000)
        .await
        .unwrap_err();

    match err {
        CheckError::TrailingRows { side, compared, .. } => {
            assert_eq!(side, Side::Legacy);
            assert_eq!(compared, 2);
        }
        other => panic!("expected TrailingRows, got {:?}", other),
    }
}

#[tokio::test]
async fn test_trailing_rows_name_the_outliving_sources_side() {
    let legacy = FakeSource::new(Side::Legacy).with_table("genre", legacy_genre_rows());
    let short_target =
        FakeSource::new(Side::Target).with_table("genre", target_genre_rows()[..1].to_vec());

    let err = compare_table_rows(&legacy, &short_target, table("genre"), 1000)
        .await
        .unwrap_err();
    match err {
        CheckError::TrailingRows { side, .. } => assert_eq!(side, legacy.side()),
        other => panic!("expected TrailingRows, got {:?}", other),
    }

    let short_legacy =
        FakeSource::new(Side::Legacy).with_table("genre", legacy_genre_rows()[..1].to_vec());
    let full_target = FakeSource::new(Side::Target).with_table("genre", target_genre_rows());

    let err = compare_table_rows(&short_legacy, &full_target, table("genre"), 1000)
        .await
        .unwrap_err();
    match err {
        CheckError::TrailingRows { side, .. } => assert_eq!(side, full_target.side()),
        other => panic!("expected TrailingRows, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_tables_pass_both_phases() {
    let legacy = FakeSource::new(Side::Legacy);
    let target = FakeSource::new(Side::Target);

    let report = compare_counts(&legacy, &target, MOVIES_TABLES)
        .await
        .unwrap();
    assert!(report.matches());
    assert_eq!(report.legacy, vec![0; 5]);

    let compared = compare_table_rows(&legacy, &target, table("person"), 1000)
        .await
        .unwrap();
    assert_eq!(compared, 0);
}

#[tokio::test]
async fn test_verdict_is_idempotent() {
    let legacy = FakeSource::new(Side::Legacy).with_table("genre", legacy_genre_rows());
    let target = FakeSource::new(Side::Target).with_table("genre", target_genre_rows());

    // Same sources, same verdict on every run
    let first = compare_table_rows(&legacy, &target, table("genre"), 2)
        .await
        .unwrap();
    let second = compare_table_rows(&legacy, &target, table("genre"), 2)
        .await
        .unwrap();
    assert_eq!(first, second);

    let diverging = FakeSource::new(Side::Target)
        .with_table("genre", target_genre_rows()[..2].to_vec());
    for _ in 0..2 {
        let err = compare_table_rows(&legacy, &diverging, table("genre"), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, CheckError::TrailingRows { .. }));
    }
}

#[tokio::test]
async fn test_subset_checks_only_selected_tables() {
    // film_work diverges, but a genre-only run never looks at it
    let legacy = FakeSource::new(Side::Legacy)
        .with_table("film_work", vec![legacy_film_row(7.5)])
        .with_table("genre", legacy_genre_rows());
    let target = FakeSource::new(Side::Target).with_table("genre", target_genre_rows());

    let genre_only = subset(&["genre".to_string()]).unwrap();
    let report = compare_counts(&legacy, &target, &genre_only).await.unwrap();
    assert!(report.matches());
    assert_eq!(report.tables, vec!["genre"]);
}
