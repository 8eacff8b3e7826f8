// ABOUTME: Target-side table source over the migrated PostgreSQL database
// ABOUTME: Handles TLS setup, connection lifecycle, and typed row extraction

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::{Client, Row};

use crate::config::TargetConfig;
use crate::error::{CheckError, Result};
use crate::mapping::{Side, TableSpec};
use crate::source::{ProjectedRow, TableSource};
use crate::value::ScalarValue;

/// The target store: a client on the migrated PostgreSQL database.
pub struct PostgresSource {
    client: Client,
}

impl PostgresSource {
    /// Connect to the target database described by the config struct.
    ///
    /// The session search path is set via connection options (default
    /// `content`, where the migrated tables live), so queries use bare
    /// table names exactly like the legacy side.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::TargetConnection`] with an operator hint
    /// classifying the failure (bad credentials, unreachable host,
    /// missing database, TLS, pg_hba), or [`CheckError::Tls`] when the
    /// TLS connector itself cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use movies_migration_checker::config::TargetConfig;
    /// # use movies_migration_checker::source::PostgresSource;
    /// # async fn example(target: &TargetConfig) -> movies_migration_checker::error::Result<()> {
    /// let source = PostgresSource::connect(target).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: &TargetConfig) -> Result<Self> {
        let session_options = format!("-c search_path={}", config.search_path);
        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .dbname(&config.dbname)
            .user(&config.user)
            .password(&config.password)
            .host(&config.host)
            .port(config.port)
            .options(&session_options);

        let tls_connector = TlsConnector::builder()
            .danger_accept_invalid_certs(false)
            .build()?;
        let tls = MakeTlsConnector::new(tls_connector);

        let (client, connection) =
            pg_config
                .connect(tls)
                .await
                .map_err(|e| CheckError::TargetConnection {
                    hint: connection_hint(&e.to_string()),
                    source: e,
                })?;

        // The connection object drives the socket; it resolves once the
        // client is dropped.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Connection error: {}", e);
            }
        });

        tracing::debug!(
            "connected to target database '{}' at {}:{}",
            config.dbname,
            config.host,
            config.port
        );
        Ok(Self { client })
    }
}

/// Classify a connection failure into an operator hint.
fn connection_hint(message: &str) -> String {
    if message.contains("password authentication failed") {
        "authentication failed: verify DB_USER and DB_PASSWORD".to_string()
    } else if message.contains("database") && message.contains("does not exist") {
        format!("database does not exist, check DB_NAME ({})", message)
    } else if message.contains("Connection refused") || message.contains("could not connect") {
        format!(
            "connection refused, is PostgreSQL listening on the configured DB_HOST and DB_PORT? ({})",
            message
        )
    } else if message.contains("timeout") || message.contains("timed out") {
        format!("connection timed out ({})", message)
    } else if message.contains("SSL") || message.contains("TLS") {
        format!("TLS negotiation failed ({})", message)
    } else if message.contains("no pg_hba.conf entry") {
        format!("access denied by pg_hba.conf ({})", message)
    } else {
        message.to_string()
    }
}

fn query_err(table: &TableSpec, source: tokio_postgres::Error) -> CheckError {
    CheckError::TargetQuery {
        table: table.name.to_string(),
        source,
    }
}

fn postgres_value(row: &Row, idx: usize, table: &TableSpec) -> Result<ScalarValue> {
    let column = &row.columns()[idx];
    let type_name = column.type_().name();
    let value = match type_name {
        "bool" => row
            .try_get::<_, Option<bool>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Bool),
        "int2" => row
            .try_get::<_, Option<i16>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(|v| ScalarValue::Int(i64::from(v))),
        "int4" => row
            .try_get::<_, Option<i32>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(|v| ScalarValue::Int(i64::from(v))),
        "int8" => row
            .try_get::<_, Option<i64>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(|v| ScalarValue::Real(f64::from(v))),
        "float8" => row
            .try_get::<_, Option<f64>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Real),
        "text" | "varchar" | "bpchar" => row
            .try_get::<_, Option<String>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Text),
        "uuid" => row
            .try_get::<_, Option<uuid::Uuid>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Uuid),
        "date" => row
            .try_get::<_, Option<NaiveDate>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Date),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(|v| ScalarValue::Timestamp(v.and_utc())),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Timestamp),
        "bytea" => row
            .try_get::<_, Option<Vec<u8>>>(idx)
            .map_err(|e| query_err(table, e))?
            .map(ScalarValue::Bytes),
        other => {
            return Err(CheckError::UnsupportedColumn {
                table: table.name.to_string(),
                column: column.name().to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(value.unwrap_or(ScalarValue::Null))
}

#[async_trait]
impl TableSource for PostgresSource {
    fn side(&self) -> Side {
        Side::Target
    }

    async fn count(&self, table: &TableSpec) -> Result<i64> {
        let row = self
            .client
            .query_one(&table.count_sql(), &[])
            .await
            .map_err(|e| query_err(table, e))?;
        row.try_get(0).map_err(|e| query_err(table, e))
    }

    async fn fetch_page(
        &self,
        table: &TableSpec,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ProjectedRow>> {
        let side = self.side();
        let sql = format!("{} LIMIT $1 OFFSET $2", table.projection_sql(side));
        let rows = self
            .client
            .query(&sql, &[&(limit as i64), &(offset as i64)])
            .await
            .map_err(|e| query_err(table, e))?;

        let width = table.columns(side).len();
        let mut page = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut projected = Vec::with_capacity(width);
            for idx in 0..width {
                projected.push(postgres_value(row, idx, table)?);
            }
            page.push(projected);
        }
        Ok(page)
    }
}
