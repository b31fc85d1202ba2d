//! Engine-specific command assembly behind one trait

use crate::database::DbType;
use crate::mysql::MysqlHandler;
use crate::postgres::PostgresHandler;

/// Connection parameters resolved from a [`Database`](crate::Database)
///
/// The hostname is the database server as seen from the host the client
/// command runs on, which is usually `localhost`.
#[derive(Debug, Clone)]
pub struct ConnectionParams {
    /// Database user
    pub username: String,
    /// Database password
    pub password: String,
    /// Database server hostname
    pub hostname: String,
    /// Database name
    pub database: String,
    /// Database server port
    pub port: u16,
}

/// Per-engine strategy for database plumbing
///
/// Every engine implements all six operations; callers are written entirely
/// against this trait. Command assembly is pure string composition, no I/O
/// happens here.
pub trait TypeHandler: Send + Sync {
    /// Engine identifier (e.g. `mysql`, `postgres`)
    fn name(&self) -> &'static str;

    /// Port the engine listens on when none is configured
    fn default_port(&self) -> u16;

    /// Connection URL for client libraries and diagnostics
    fn connection_url(&self, params: &ConnectionParams) -> String;

    /// Command opening the engine's interactive shell
    fn shell_command(&self, params: &ConnectionParams) -> String;

    /// Command dumping the database to stdout
    fn dump_command(&self, params: &ConnectionParams) -> String;

    /// Command emptying the database so a restore starts from scratch
    fn empty_db_command(&self, params: &ConnectionParams) -> String;
}

/// Look up the handler for an engine type
pub fn handler_for(db_type: DbType) -> &'static dyn TypeHandler {
    match db_type {
        DbType::Mysql => &MysqlHandler,
        DbType::Postgres => &PostgresHandler,
    }
}
