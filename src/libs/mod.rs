pub mod config;
pub mod database;
pub mod error;
pub mod loader;
pub mod query_builder;
pub mod schema;
pub mod seed;
pub mod value;

// Re-export them for easier access from main.rs
pub use config::*;
pub use database::*;
pub use error::*;
pub use loader::*;
pub use query_builder::*;
pub use schema::*;
pub use value::*;
