use crate::config::ConnectionConfig;
use crate::error::{Error, Result};
use crate::loader::TableStore;
use crate::query_builder::{ColumnTypes, InsertBuilder, QueryBuilder};
use crate::schema::{TableSchema, create_table_sql};
use crate::value::{JsonRow, bind_all, row_to_json};
use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use serde_json::Value;
use sqlx::Connection;
use sqlx::postgres::{PgConnection, PgRow};
use tracing::{debug, info, warn};

/// How many result rows `execute` pulls back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchMode {
    #[default]
    None,
    One,
    Many(usize),
    All,
}

/// What `execute` returned, shaped by the [`FetchMode`] it was given.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    Nothing,
    Row(Option<JsonRow>),
    Rows(Vec<JsonRow>),
}

impl Fetched {
    pub fn into_row(self) -> Option<JsonRow> {
        match self {
            Fetched::Nothing => None,
            Fetched::Row(row) => row,
            Fetched::Rows(rows) => rows.into_iter().next(),
        }
    }

    pub fn into_rows(self) -> Vec<JsonRow> {
        match self {
            Fetched::Nothing => Vec::new(),
            Fetched::Row(row) => row.into_iter().collect(),
            Fetched::Rows(rows) => rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Fetched::Nothing | Fetched::Row(None) => true,
            Fetched::Row(Some(_)) => false,
            Fetched::Rows(rows) => rows.is_empty(),
        }
    }
}

/// A single PostgreSQL session.
///
/// Statements run inside an implicit transaction that the first statement
/// opens and a statement executed with `commit = true` closes.
pub struct PostgresDatabase {
    config: ConnectionConfig,
    connection: Option<PgConnection>,
    in_transaction: bool,
}

impl PostgresDatabase {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connection: None,
            in_transaction: false,
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub async fn connect(&mut self) -> Result<()> {
        self.config.validate()?;
        if self.connection.is_some() {
            self.disconnect().await?;
        }

        let connection = PgConnection::connect_with(&self.config.connect_options())
            .await
            .map_err(|source| Error::Connection { source })?;
        self.connection = Some(connection);
        self.in_transaction = false;

        info!(
            database = %self.config.dbname,
            host = %self.config.host,
            port = self.config.port,
            "connected to database"
        );
        Ok(())
    }

    /// Closes the session. Does nothing when not connected.
    pub async fn disconnect(&mut self) -> Result<()> {
        let Some(connection) = self.connection.take() else {
            return Ok(());
        };
        if std::mem::take(&mut self.in_transaction) {
            debug!("closing session with an open transaction; uncommitted work is discarded");
        }

        connection
            .close()
            .await
            .map_err(|source| Error::Connection { source })?;
        info!(database = %self.config.dbname, "disconnected from database");
        Ok(())
    }

    // -------- Execute a statement --------
    pub async fn execute(
        &mut self,
        sql: &str,
        params: &[Value],
        fetch: FetchMode,
        commit: bool,
    ) -> Result<Fetched> {
        let conn = self.connection.as_mut().ok_or(Error::NotConnected)?;

        if !self.in_transaction {
            sqlx::raw_sql("BEGIN")
                .execute(&mut *conn)
                .await
                .map_err(|e| Error::query("BEGIN", e))?;
            self.in_transaction = true;
        }

        debug!(sql, params = params.len(), ?fetch, commit, "executing statement");
        match run(&mut *conn, sql, params, fetch).await {
            Ok(fetched) => {
                if commit {
                    let committed = sqlx::raw_sql("COMMIT").execute(&mut *conn).await;
                    self.in_transaction = false;
                    committed.map_err(|e| Error::query("COMMIT", e))?;
                }
                Ok(fetched)
            }
            Err(source) => {
                // The server refuses everything after an error until the
                // transaction ends.
                if let Err(e) = sqlx::raw_sql("ROLLBACK").execute(&mut *conn).await {
                    warn!(error = %e, "rollback after failed statement did not succeed");
                }
                self.in_transaction = false;
                Err(Error::query(sql, source))
            }
        }
    }

    // -------- Catalog lookups --------
    // Table names are matched the way the server folds unquoted identifiers.
    pub async fn has_table(&mut self, name: &str) -> Result<bool> {
        let sql = "SELECT EXISTS(SELECT 1 FROM information_schema.tables \
                   WHERE table_schema = current_schema() AND table_name::text = lower($1)) AS present";
        let row = self
            .execute(sql, &[Value::from(name)], FetchMode::One, false)
            .await?
            .into_row();
        Ok(row
            .and_then(|r| r.get("present").and_then(Value::as_bool))
            .unwrap_or(false))
    }

    /// Column name to `udt_name` for every column of `table`.
    pub async fn column_types(&mut self, table: &str) -> Result<ColumnTypes> {
        let sql = "SELECT column_name::text AS column_name, udt_name::text AS udt_name \
                   FROM information_schema.columns \
                   WHERE table_schema = current_schema() AND table_name::text = lower($1)";
        let rows = self
            .execute(sql, &[Value::from(table)], FetchMode::All, false)
            .await?
            .into_rows();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let column = row.get("column_name")?.as_str()?.to_string();
                let ty = row.get("udt_name")?.as_str()?.to_string();
                Some((column, ty))
            })
            .collect())
    }

    // -------- Create tables --------
    pub async fn create_table<S>(&mut self, name: &str, columns: &[S]) -> Result<()>
    where
        S: AsRef<str> + Sync,
    {
        if self.has_table(name).await? {
            return Err(Error::DuplicateTable {
                table: name.to_string(),
            });
        }
        let sql = create_table_sql(name, columns);
        self.execute(&sql, &[], FetchMode::None, true).await?;
        Ok(())
    }

    pub async fn create_schema(&mut self, schema: &TableSchema) -> Result<()> {
        self.create_table(schema.name, schema.columns).await
    }

    // -------- Check if record exists --------
    pub async fn record_exists<S>(
        &mut self,
        table: &str,
        columns: &[S],
        values: &[Value],
    ) -> Result<bool>
    where
        S: AsRef<str> + Sync,
    {
        check_shape(table, columns, values)?;
        let types = self.column_types(table).await?;
        self.exists_with(&types, table, columns, values).await
    }

    async fn exists_with<S>(
        &mut self,
        types: &ColumnTypes,
        table: &str,
        columns: &[S],
        values: &[Value],
    ) -> Result<bool>
    where
        S: AsRef<str> + Sync,
    {
        let query = QueryBuilder::new(table)
            .with_types(types)
            .where_eq(columns, values)
            .limit(1);
        let fetched = self
            .execute(&query.build_sql(), query.params(), FetchMode::One, false)
            .await?;
        Ok(!fetched.is_empty())
    }

    // -------- Insert a record --------
    pub async fn insert<S>(&mut self, table: &str, columns: &[S], values: &[Value]) -> Result<()>
    where
        S: AsRef<str> + Sync,
    {
        check_shape(table, columns, values)?;
        let types = self.column_types(table).await?;

        if self.exists_with(&types, table, columns, values).await? {
            return Err(Error::DuplicateRecord {
                table: table.to_string(),
                values: values.to_vec(),
            });
        }

        let insert = InsertBuilder::new(table)
            .with_types(&types)
            .values(columns, values);
        self.execute(&insert.build_sql(), insert.params(), FetchMode::None, true)
            .await?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl TableStore for PostgresDatabase {
    async fn create_table(&mut self, schema: &TableSchema) -> Result<()> {
        self.create_schema(schema).await
    }

    async fn insert(&mut self, table: &str, columns: &[String], values: &[Value]) -> Result<()> {
        PostgresDatabase::insert(self, table, columns, values).await
    }
}

async fn run(
    conn: &mut PgConnection,
    sql: &str,
    params: &[Value],
    fetch: FetchMode,
) -> sqlx::Result<Fetched> {
    let query = bind_all(sqlx::query(sql), params);
    let fetched = match fetch {
        FetchMode::None => {
            query.execute(&mut *conn).await?;
            Fetched::Nothing
        }
        FetchMode::One => Fetched::Row(
            query
                .fetch_optional(&mut *conn)
                .await?
                .as_ref()
                .map(row_to_json),
        ),
        // Nothing to pull back, but the statement still has to run.
        FetchMode::Many(0) => {
            query.execute(&mut *conn).await?;
            Fetched::Rows(Vec::new())
        }
        FetchMode::Many(n) => {
            let rows: Vec<PgRow> = query.fetch(&mut *conn).take(n).try_collect().await?;
            Fetched::Rows(rows.iter().map(row_to_json).collect())
        }
        FetchMode::All => {
            let rows = query.fetch_all(&mut *conn).await?;
            Fetched::Rows(rows.iter().map(row_to_json).collect())
        }
    };
    Ok(fetched)
}

fn check_shape<S: AsRef<str>>(table: &str, columns: &[S], values: &[Value]) -> Result<()> {
    if columns.is_empty() || columns.len() != values.len() {
        return Err(Error::RowShape {
            table: table.to_string(),
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            values: values.to_vec(),
        });
    }
    Ok(())
}
