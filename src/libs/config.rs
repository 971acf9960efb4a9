use crate::error::{Error, Result};
use clap::Args;
use sqlx::postgres::PgConnectOptions;
use std::fmt;

/// Where and as whom to connect.
///
/// Every field can come from a flag or from the matching `NORTH_DB_*`
/// environment variable (a `.env` file is read by the binary first).
#[derive(Args, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Database name
    #[arg(long, env = "NORTH_DB_NAME", default_value = "north")]
    pub dbname: String,

    /// Login role
    #[arg(long, env = "NORTH_DB_USER", default_value = "postgres")]
    pub user: String,

    /// Password for the login role
    #[arg(long, env = "NORTH_DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// Host name or IP address of the server
    #[arg(long, env = "NORTH_DB_HOST", default_value = "localhost")]
    pub host: String,

    /// Port the server listens on
    #[arg(long, env = "NORTH_DB_PORT", default_value_t = 5432)]
    pub port: u16,
}

impl ConnectionConfig {
    pub fn new(
        dbname: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            dbname: dbname.into(),
            user: user.into(),
            password: password.into(),
            host: host.into(),
            port,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("port must not be 0"));
        }
        if self.dbname.trim().is_empty() {
            return Err(Error::config("dbname must not be empty"));
        }
        if self.user.trim().is_empty() {
            return Err(Error::config("user must not be empty"));
        }
        Ok(())
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.dbname);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("north", "postgres", "", "localhost", 5432)
    }
}

// Password stays out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

impl fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}/{}", self.user, self.host, self.port, self.dbname)
    }
}
