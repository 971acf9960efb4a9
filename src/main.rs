use anyhow::Context;
use clap::Parser;
use northloader::{ConnectionConfig, NORTH_TABLES, PostgresDatabase, seed};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Create the north tables and seed them from CSV files.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(flatten)]
    db: ConnectionConfig,

    /// Directory holding employees_data.csv, customers_data.csv and orders_data.csv
    #[arg(long, env = "NORTH_DATA_DIR", default_value = "north_data")]
    data_dir: PathBuf,

    /// Log filter used when RUST_LOG is not set (e.g. `debug`, `northloader=trace`)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut db = PostgresDatabase::new(cli.db);
    connect(&mut db).await?;

    let outcome = seed::run(&mut db, &NORTH_TABLES, &cli.data_dir).await;
    db.disconnect().await?;

    let reports = outcome.context("seeding the north tables")?;
    for report in &reports {
        info!(
            table = %report.table,
            rows = report.rows,
            inserted = report.inserted,
            duplicates = report.duplicates,
            "summary"
        );
    }
    Ok(())
}

// The caller reports the error; nothing is logged here.
async fn connect(db: &mut PostgresDatabase) -> anyhow::Result<()> {
    let target = db.config().to_string();
    db.connect()
        .await
        .with_context(|| format!("connecting to {}", target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_failure_names_target_and_cause_once() {
        let mut db = PostgresDatabase::new(ConnectionConfig::new(
            "north", "postgres", "", "127.0.0.1", 1,
        ));

        let report = format!("{:#}", connect(&mut db).await.unwrap_err());
        assert!(report.starts_with("connecting to postgres@127.0.0.1:1/north: "));
        assert_eq!(report.matches("could not connect to the database").count(), 1);
    }
}
