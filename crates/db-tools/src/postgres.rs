//! PostgreSQL-family handler

use crate::handler::{ConnectionParams, TypeHandler};
use ssh_tunnel::shell_escape;

/// Handler for PostgreSQL and compatible engines
#[derive(Debug, Clone, Copy)]
pub struct PostgresHandler;

impl TypeHandler for PostgresHandler {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn default_port(&self) -> u16 {
        5432
    }

    fn connection_url(&self, params: &ConnectionParams) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            params.username, params.password, params.hostname, params.port, params.database
        )
    }

    fn shell_command(&self, params: &ConnectionParams) -> String {
        format!(
            "PGPASSWORD={} psql {} {}",
            shell_escape(&params.password),
            client_args(params),
            shell_escape(&params.database)
        )
    }

    fn dump_command(&self, params: &ConnectionParams) -> String {
        // --no-owner/--no-privileges keep dumps restorable by a different
        // role on the target environment.
        format!(
            "PGPASSWORD={} pg_dump {} --no-owner --no-privileges {}",
            shell_escape(&params.password),
            client_args(params),
            shell_escape(&params.database)
        )
    }

    fn empty_db_command(&self, params: &ConnectionParams) -> String {
        format!(
            "PGPASSWORD={} psql {} --command={} {}",
            shell_escape(&params.password),
            client_args(params),
            shell_escape("DROP SCHEMA public CASCADE; CREATE SCHEMA public;"),
            shell_escape(&params.database)
        )
    }
}

fn client_args(params: &ConnectionParams) -> String {
    format!(
        "--username={} --host={} --port={}",
        shell_escape(&params.username),
        shell_escape(&params.hostname),
        params.port
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ConnectionParams {
        ConnectionParams {
            username: "app".to_string(),
            password: "hunter2".to_string(),
            hostname: "localhost".to_string(),
            database: "app_production".to_string(),
            port: 5432,
        }
    }

    #[test]
    fn test_shell_command() {
        assert_eq!(
            PostgresHandler.shell_command(&params()),
            "PGPASSWORD=hunter2 psql --username=app --host=localhost --port=5432 app_production"
        );
    }

    #[test]
    fn test_dump_command_strips_ownership() {
        let command = PostgresHandler.dump_command(&params());
        assert!(command.contains("pg_dump"));
        assert!(command.contains("--no-owner"));
        assert!(command.contains("--no-privileges"));
    }

    #[test]
    fn test_empty_db_recreates_public_schema() {
        let command = PostgresHandler.empty_db_command(&params());
        assert!(command.contains("DROP SCHEMA public CASCADE"));
        assert!(command.contains("CREATE SCHEMA public"));
    }
}
