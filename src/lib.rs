//! Creates the north tables (`employees`, `customers`, `orders`) in
//! PostgreSQL and fills them from CSV files, skipping rows that are already
//! there.
//!
//! ```no_run
//! use northloader::{ConnectionConfig, NORTH_TABLES, PostgresDatabase, seed};
//! use std::path::Path;
//!
//! # async fn demo() -> northloader::Result<()> {
//! let mut db = PostgresDatabase::new(ConnectionConfig::default());
//! db.connect().await?;
//! let reports = seed::run(&mut db, &NORTH_TABLES, Path::new("north_data")).await;
//! db.disconnect().await?;
//! for report in reports? {
//!     println!("{}: {} inserted", report.table, report.inserted);
//! }
//! # Ok(())
//! # }
//! ```

pub mod libs;

pub use libs::*;
