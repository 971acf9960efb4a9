use crate::error::Result;
use crate::loader::{LoadReport, TableLoader, TableStore};
use crate::schema::TableSchema;
use std::path::Path;
use tracing::{error, info, warn};

/// Creates every table that is missing. An existing table is logged and left
/// alone; any other failure ends the run.
pub async fn ensure_tables<S: TableStore>(store: &mut S, schemas: &[TableSchema]) -> Result<()> {
    for schema in schemas {
        match store.create_table(schema).await {
            Ok(()) => info!(table = schema.name, "created table"),
            Err(err) if err.is_duplicate() => warn!(table = schema.name, "{}", err),
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

/// Loads `<data_dir>/<table>_data.csv` into each table.
///
/// A missing or unreadable file skips that table only. Reports are returned
/// for the files that were loaded.
pub async fn load_all<S: TableStore>(
    store: &mut S,
    schemas: &[TableSchema],
    data_dir: &Path,
) -> Result<Vec<LoadReport>> {
    let mut reports = Vec::with_capacity(schemas.len());
    let mut loader = TableLoader::new(store);

    for schema in schemas {
        let path = data_dir.join(schema.source_file());
        match loader.load_file(&path, schema.name).await {
            Ok(report) => reports.push(report),
            Err(err) if err.is_source() => error!(table = schema.name, "{}", err),
            Err(err) => return Err(err),
        }
    }
    Ok(reports)
}

pub async fn run<S: TableStore>(
    store: &mut S,
    schemas: &[TableSchema],
    data_dir: &Path,
) -> Result<Vec<LoadReport>> {
    ensure_tables(store, schemas).await?;
    load_all(store, schemas, data_dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::loader::tests::MemoryStore;
    use crate::schema::{CUSTOMERS, EMPLOYEES, NORTH_TABLES, ORDERS};
    use std::fs;

    fn data_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn existing_tables_do_not_stop_the_run() {
        let mut store = MemoryStore::default();
        store.create_table(&CUSTOMERS).await.unwrap();

        ensure_tables(&mut store, &NORTH_TABLES).await.unwrap();

        for schema in NORTH_TABLES {
            assert!(store.tables.contains_key(schema.name));
        }
    }

    #[tokio::test]
    async fn missing_file_skips_only_that_table() {
        let dir = data_dir(&[
            (
                "employees_data.csv",
                "first_name,last_name,title,birth_date,notes\n\
                 Nancy,Davolio,Sales Representative,1948-12-08,Education includes a BA\n",
            ),
            (
                "orders_data.csv",
                "order_id,customer_id,employee_id,order_date,ship_city\n\
                 10248,VINET,1,1996-07-04,Reims\n\
                 10249,TOMSP,1,1996-07-05,Münster\n",
            ),
        ]);
        let mut store = MemoryStore::default();

        let reports = run(&mut store, &NORTH_TABLES, dir.path()).await.unwrap();

        let loaded: Vec<&str> = reports.iter().map(|r| r.table.as_str()).collect();
        assert_eq!(loaded, vec![EMPLOYEES.name, ORDERS.name]);
        assert_eq!(store.count("employees"), 1);
        assert_eq!(store.count("customers"), 0);
        assert_eq!(store.count("orders"), 2);
    }

    #[tokio::test]
    async fn second_run_reports_only_duplicates() {
        let dir = data_dir(&[(
            "customers_data.csv",
            "customer_id,company_name,contact_name\nALFKI,Alfreds Futterkiste,Maria Anders\n",
        )]);
        let mut store = MemoryStore::default();

        run(&mut store, &[CUSTOMERS], dir.path()).await.unwrap();
        let reports = run(&mut store, &[CUSTOMERS], dir.path()).await.unwrap();

        assert_eq!(reports[0].inserted, 0);
        assert_eq!(reports[0].duplicates, 1);
        assert_eq!(store.count("customers"), 1);
    }

    #[tokio::test]
    async fn query_errors_end_the_run() {
        let dir = data_dir(&[(
            "customers_data.csv",
            "customer_id,company_name,contact_name\nALFKI,Alfreds Futterkiste,Maria Anders\n",
        )]);
        let mut store = MemoryStore {
            poison: Some(serde_json::json!("ALFKI")),
            ..Default::default()
        };

        let err = run(&mut store, &[CUSTOMERS, ORDERS], dir.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Query { .. }));
    }
}
