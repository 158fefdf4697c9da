use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};
use std::str::FromStr;
use tracing::instrument;

use crate::domain::{ports::DatabaseReader, Document, DocumentSource, DomainError};
use crate::infrastructure::config::DatabaseConfig;

const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Reads every row of a SQLite database as one text document.
pub struct SqliteDatabaseReader {
    pool: SqlitePool,
    query: Option<String>,
}

impl SqliteDatabaseReader {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(Self::options(&config.url)?)
            .await?;

        tracing::info!(url = %config.url, "database connected");

        Ok(Self {
            pool,
            query: config.query.clone(),
        })
    }

    /// Defers opening the database to the first load, so a missing file fails
    /// that load instead of startup.
    pub fn lazy(config: &DatabaseConfig) -> Result<Self, DomainError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(Self::options(&config.url)?);

        Ok(Self {
            pool,
            query: config.query.clone(),
        })
    }

    fn options(url: &str) -> Result<SqliteConnectOptions, DomainError> {
        Ok(SqliteConnectOptions::from_str(url)
            .map_err(|e| DomainError::database(format!("invalid database url: {e}")))?
            .create_if_missing(false)
            .read_only(true))
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool, query: None }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    async fn table_names(&self) -> Result<Vec<String>, DomainError> {
        let rows = sqlx::query(LIST_TABLES).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    async fn read_rows(
        &self,
        sql: &str,
        source: impl Fn(usize) -> DocumentSource,
    ) -> Result<Vec<Document>, DomainError> {
        let mut rows = sqlx::query(sql).fetch(&self.pool);
        let mut documents = Vec::new();

        while let Some(row) = rows.try_next().await? {
            documents.push(Document::new(row_to_text(&row)?, source(documents.len())));
        }

        Ok(documents)
    }
}

#[async_trait]
impl DatabaseReader for SqliteDatabaseReader {
    #[instrument(skip(self))]
    async fn load_documents(&self) -> Result<Vec<Document>, DomainError> {
        if let Some(query) = &self.query {
            let documents = self.read_rows(query, DocumentSource::query).await?;
            tracing::info!(rows = documents.len(), "custom query loaded");
            return Ok(documents);
        }

        let tables = self.table_names().await?;
        let mut documents = Vec::new();

        for table in &tables {
            let sql = format!("SELECT * FROM {}", quote_identifier(table));
            let rows = self
                .read_rows(&sql, |row| DocumentSource::table(table.as_str(), row))
                .await?;
            tracing::debug!(table = %table, rows = rows.len(), "table loaded");
            documents.extend(rows);
        }

        tracing::info!(
            tables = tables.len(),
            documents = documents.len(),
            "database loaded"
        );
        Ok(documents)
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `column: value` pairs joined by `", "`.
fn row_to_text(row: &SqliteRow) -> Result<String, DomainError> {
    let mut fields = Vec::with_capacity(row.columns().len());

    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;

        let value = if raw.is_null() {
            "NULL".to_string()
        } else {
            let type_name = raw.type_info().name().to_ascii_uppercase();
            match type_name.as_str() {
                "INTEGER" | "BOOLEAN" => row.try_get_unchecked::<i64, _>(index)?.to_string(),
                "REAL" => row.try_get_unchecked::<f64, _>(index)?.to_string(),
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                    format!("<blob {} bytes>", bytes.len())
                }
                _ => row.try_get_unchecked::<String, _>(index)?,
            }
        };

        fields.push(format!("{}: {}", column.name(), value));
    }

    Ok(fields.join(", "))
}
