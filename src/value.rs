// ABOUTME: Scalar value model normalizing what the two database drivers return
// ABOUTME: Defines cross-representation equivalence (SQLite TEXT vs PostgreSQL typed)

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// A single projected column value from either store.
///
/// SQLite has no UUID, date or timestamp storage classes; the legacy
/// store holds those as TEXT while PostgreSQL returns typed values. The
/// comparison rules in [`ScalarValue::matches`] bridge exactly that gap
/// and nothing more.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl ScalarValue {
    /// Compare two values for migration equivalence.
    ///
    /// Rules:
    /// - `Null` equals only `Null`
    /// - same-variant values compare directly; floats require exact
    ///   equality (`7.5` and `7.50001` differ)
    /// - `Int` vs `Real`: equal iff the integer converts exactly
    ///   (SQLite stores `5` where PostgreSQL returns `5.0`)
    /// - `Text` vs `Uuid`: equal iff the text parses as the same UUID
    /// - `Text` vs `Timestamp`: equal iff the text parses as the same
    ///   instant (SQLite timestamp text, with or without offset)
    /// - `Text` vs `Date`: equal iff the text is the same `%Y-%m-%d` day
    /// - every other cross-type pair is unequal; in particular numeric
    ///   text never coerces to a number
    ///
    /// # Examples
    ///
    /// ```
    /// # use movies_migration_checker::value::ScalarValue;
    /// assert!(ScalarValue::Real(7.5).matches(&ScalarValue::Real(7.5)));
    /// assert!(!ScalarValue::Real(7.5).matches(&ScalarValue::Real(7.50001)));
    /// assert!(ScalarValue::Int(7).matches(&ScalarValue::Real(7.0)));
    /// ```
    #[allow(clippy::float_cmp)]
    pub fn matches(&self, other: &ScalarValue) -> bool {
        use ScalarValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Real(a), Real(b)) => a == b,
            (Int(a), Real(b)) | (Real(b), Int(a)) => int_matches_real(*a, *b),
            (Text(a), Text(b)) => a == b,
            (Bytes(a), Bytes(b)) => a == b,
            (Uuid(a), Uuid(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (Text(t), v) | (v, Text(t)) => text_matches(t, v),
            _ => false,
        }
    }

    /// True when the value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::Int(v) => write!(f, "{}", v),
            ScalarValue::Real(v) => write!(f, "{}", v),
            ScalarValue::Text(v) => write!(f, "'{}'", v),
            ScalarValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            ScalarValue::Uuid(v) => write!(f, "{}", v),
            ScalarValue::Date(v) => write!(f, "{}", v),
            ScalarValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

/// `Int` vs `Real` equivalence without precision loss.
///
/// The comparison runs in the integer domain: casting the integer to
/// `f64` rounds above 2^53 and would call two different numbers equal.
#[allow(clippy::float_cmp)]
fn int_matches_real(int: i64, real: f64) -> bool {
    // Integral doubles in [-2^63, 2^63) convert to i64 exactly
    const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;
    real.fract() == 0.0 && real >= -I64_LIMIT && real < I64_LIMIT && (real as i64) == int
}

fn text_matches(text: &str, other: &ScalarValue) -> bool {
    match other {
        ScalarValue::Uuid(u) => Uuid::parse_str(text).map(|p| p == *u).unwrap_or(false),
        ScalarValue::Timestamp(ts) => parse_timestamp_text(text)
            .map(|p| p == *ts)
            .unwrap_or(false),
        ScalarValue::Date(d) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|p| p == *d)
            .unwrap_or(false),
        _ => false,
    }
}

/// Parse the timestamp text forms SQLite actually holds.
///
/// Accepts `%Y-%m-%d %H:%M:%S[.f][+hh[:mm]]` (e.g.
/// `2021-06-16 20:14:09.221838+00`), RFC 3339, and the naive form
/// interpreted as UTC.
fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    None
}
