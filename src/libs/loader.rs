use crate::error::{Error, Result};
use crate::schema::TableSchema;
use async_trait::async_trait;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// The two write operations a load needs from a database.
///
/// Loads run on one connection, one statement at a time, so the futures are
/// not required to be `Send`.
#[async_trait(?Send)]
pub trait TableStore {
    /// Create `schema`, or fail with [`Error::DuplicateTable`] if it exists.
    async fn create_table(&mut self, schema: &TableSchema) -> Result<()>;

    /// Insert one row, or fail with [`Error::DuplicateRecord`] if a row with
    /// exactly these values is already there.
    async fn insert(&mut self, table: &str, columns: &[String], values: &[Value]) -> Result<()>;
}

/// Header and rows of a CSV file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Outcome of loading one file into one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub table: String,
    pub path: PathBuf,
    pub rows: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

/// Reads the whole file: header first, then one string value per column.
pub fn read_source(path: &Path) -> Result<SourceData> {
    let file = File::open(path).map_err(|source| Error::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let malformed = |source| Error::MalformedSource {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let columns: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let name = if i == 0 { name.trim_start_matches('\u{feff}') } else { name };
            name.to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(Value::from).collect());
    }

    debug!(path = %path.display(), ?columns, ?rows, "read source file");
    Ok(SourceData { columns, rows })
}

/// Fills tables from CSV files through a [`TableStore`].
pub struct TableLoader<'a, S: TableStore> {
    store: &'a mut S,
}

impl<'a, S: TableStore> TableLoader<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Inserts every row of `path` into `table`.
    ///
    /// Rows already present are logged and skipped; any other error stops
    /// the load.
    pub async fn load_file(&mut self, path: impl AsRef<Path>, table: &str) -> Result<LoadReport> {
        let path = path.as_ref();
        let source = read_source(path)?;

        let mut report = LoadReport {
            table: table.to_string(),
            path: path.to_path_buf(),
            rows: source.rows.len(),
            inserted: 0,
            duplicates: 0,
        };

        for values in &source.rows {
            match self.store.insert(table, &source.columns, values).await {
                Ok(()) => {
                    report.inserted += 1;
                    let params = Value::from(values.clone());
                    info!(table, params = %params, "inserted record");
                }
                Err(err @ Error::DuplicateRecord { .. }) => {
                    report.duplicates += 1;
                    warn!(table, "{}", err);
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            table,
            path = %path.display(),
            inserted = report.inserted,
            duplicates = report.duplicates,
            "loaded source file"
        );
        Ok(report)
    }
}
