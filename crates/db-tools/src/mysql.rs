//! MySQL-family handler

use crate::handler::{ConnectionParams, TypeHandler};
use ssh_tunnel::shell_escape;

/// Handler for MySQL and compatible engines
#[derive(Debug, Clone, Copy)]
pub struct MysqlHandler;

impl TypeHandler for MysqlHandler {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn default_port(&self) -> u16 {
        3306
    }

    fn connection_url(&self, params: &ConnectionParams) -> String {
        format!(
            "mysql://{}:{}@{}:{}/{}",
            params.username, params.password, params.hostname, params.port, params.database
        )
    }

    fn shell_command(&self, params: &ConnectionParams) -> String {
        format!(
            "mysql {} {}",
            client_args(params),
            shell_escape(&params.database)
        )
    }

    fn dump_command(&self, params: &ConnectionParams) -> String {
        format!(
            "mysqldump {} --opt {}",
            client_args(params),
            shell_escape(&params.database)
        )
    }

    fn empty_db_command(&self, params: &ConnectionParams) -> String {
        // Drop every table rather than the database itself, since the
        // deployment user often lacks CREATE DATABASE rights.
        let db = shell_escape(&params.database);
        format!(
            "mysqldump {args} --add-drop-table --no-data {db} | grep ^DROP | mysql {args} {db}",
            args = client_args(params),
            db = db
        )
    }
}

fn client_args(params: &ConnectionParams) -> String {
    format!(
        "--user={} --password={} --host={} --port={}",
        shell_escape(&params.username),
        shell_escape(&params.password),
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
            password: "s3cret word".to_string(),
            hostname: "localhost".to_string(),
            database: "app_production".to_string(),
            port: 3306,
        }
    }

    #[test]
    fn test_shell_command() {
        assert_eq!(
            MysqlHandler.shell_command(&params()),
            "mysql --user=app --password='s3cret word' --host=localhost --port=3306 app_production"
        );
    }

    #[test]
    fn test_dump_command() {
        let command = MysqlHandler.dump_command(&params());
        assert!(command.starts_with("mysqldump "));
        assert!(command.contains("--opt"));
        assert!(command.ends_with("app_production"));
    }

    #[test]
    fn test_empty_db_drops_tables_only() {
        let command = MysqlHandler.empty_db_command(&params());
        assert!(command.contains("--add-drop-table"));
        assert!(command.contains("| grep ^DROP |"));
    }

    #[test]
    fn test_connection_url() {
        assert_eq!(
            MysqlHandler.connection_url(&params()),
            "mysql://app:s3cret word@localhost:3306/app_production"
        );
    }
}
