//! Database model

use crate::error::Error;
use crate::handler::{handler_for, ConnectionParams, TypeHandler};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported database engine families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL and compatible engines
    Mysql,
    /// PostgreSQL and compatible engines
    Postgres,
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(handler_for(*self).name())
    }
}

impl FromStr for DbType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(DbType::Mysql),
            "postgres" | "postgresql" => Ok(DbType::Postgres),
            other => Err(Error::UnknownType {
                value: other.to_string(),
            }),
        }
    }
}

/// One database within an environment's configuration
///
/// The hostname is the database server as addressed from the environment's
/// hosts, so `localhost` is the common case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    /// Engine family
    #[serde(rename = "type")]
    db_type: DbType,
    /// Database name
    name: String,
    /// Database user
    username: String,
    /// Database password
    password: String,
    /// Database server hostname (`localhost` when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hostname: Option<String>,
    /// Database server port (engine default when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    port: Option<u16>,
}

impl Database {
    /// Create a new database entry
    pub fn new(
        db_type: DbType,
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            db_type,
            name: name.into(),
            username: username.into(),
            password: password.into(),
            hostname: None,
            port: None,
        }
    }

    /// Set the database server hostname
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Set the database server port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Get the engine family
    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    /// Get the database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the database server hostname
    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().unwrap_or("localhost")
    }

    /// Get the database server port
    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.handler().default_port())
    }

    /// Get the engine-specific handler
    pub fn handler(&self) -> &'static dyn TypeHandler {
        handler_for(self.db_type)
    }

    /// Resolve connection parameters
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            username: self.username.clone(),
            password: self.password.clone(),
            hostname: self.hostname().to_string(),
            database: self.name.clone(),
            port: self.port(),
        }
    }

    /// Command opening this database's interactive shell
    pub fn shell_command(&self) -> String {
        self.handler().shell_command(&self.connection_params())
    }

    /// Command dumping this database to stdout
    pub fn dump_command(&self) -> String {
        self.handler().dump_command(&self.connection_params())
    }

    /// Command emptying this database
    pub fn empty_db_command(&self) -> String {
        self.handler().empty_db_command(&self.connection_params())
    }

    /// Connection URL for diagnostics
    pub fn connection_url(&self) -> String {
        self.handler().connection_url(&self.connection_params())
    }

    /// One-line description used in logs and shell banners
    pub fn summary(&self) -> String {
        format!("{} database {} on {}:{}", self.db_type, self.name, self.hostname(), self.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_falls_back_to_engine_default() {
        let db = Database::new(DbType::Postgres, "app", "app", "pw");
        assert_eq!(db.port(), 5432);

        let db = db.with_port(5433);
        assert_eq!(db.port(), 5433);
    }

    #[test]
    fn test_db_type_parsing() {
        assert_eq!("mysql".parse::<DbType>().unwrap(), DbType::Mysql);
        assert_eq!("postgresql".parse::<DbType>().unwrap(), DbType::Postgres);
        assert!("oracle".parse::<DbType>().is_err());
    }

    #[test]
    fn test_summary() {
        let db = Database::new(DbType::Mysql, "app", "app", "pw").with_hostname("db.internal");
        assert_eq!(db.summary(), "mysql database app on db.internal:3306");
    }

    #[test]
    fn test_deserializes_from_config() {
        let yaml = "type: postgres\nname: app\nusername: app\npassword: pw\n";
        let db: Database = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(db.db_type(), DbType::Postgres);
        assert_eq!(db.hostname(), "localhost");
        assert_eq!(db.port(), 5432);
    }
}
