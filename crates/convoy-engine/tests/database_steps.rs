//! Tests for database discovery and restore steps

use convoy_engine::{
    DatabaseSelector, Environment, FindDatabases, RestoreDatabase, Script, Status,
};
use db_tools::{Database, DbType};
use ssh_tunnel::Host;
use std::sync::Arc;

fn environment_with_databases() -> Environment {
    Environment::new("staging")
        .with_host(Host::new("web1.example.com").with_user("deploy"))
        .with_database(Database::new(DbType::Mysql, "app", "app", "pw"))
        .with_database(
            Database::new(DbType::Postgres, "reporting", "report", "pw")
                .with_hostname("db2.internal"),
        )
}

#[test]
fn test_find_databases_discovers_all_entries() {
    futures::executor::block_on(async {
        let find = Arc::new(FindDatabases::new());

        let script = Script::new("db-scripts", "")
            .with_step(Arc::clone(&find))
            .with_environment(environment_with_databases());

        let results = script.run().await.unwrap();

        assert!(results[0].is_success());
        assert_eq!(find.databases().len(), 2);

        let types: Vec<DbType> = find.databases().iter().map(|db| db.db_type()).collect();
        assert!(types.contains(&DbType::Mysql));
        assert!(types.contains(&DbType::Postgres));
    });
}

#[test]
fn test_selection_by_hostname_narrows_to_one() {
    futures::executor::block_on(async {
        let find = Arc::new(FindDatabases::new());

        let script = Script::new("db-scripts", "")
            .with_step(Arc::clone(&find))
            .with_environment(environment_with_databases());
        script.run().await.unwrap();

        let selected = find
            .selected_database(&DatabaseSelector::any().with_hostname("db2.internal"))
            .unwrap();
        assert_eq!(selected.name(), "reporting");

        // Without a selector, two candidates is a hard error
        assert!(find.selected_database(&DatabaseSelector::any()).is_err());
    });
}

#[test]
fn test_restore_fails_fast_on_missing_dump_file() {
    futures::executor::block_on(async {
        let env = environment_with_databases();
        let ports = env.tunnel_ports();
        let database = Database::new(DbType::Postgres, "app", "app", "pw");

        let script = Script::new("db-restore", "")
            .with_step(RestoreDatabase::new(database, "/nonexistent/dump.sql"))
            .with_environment(env);

        let results = script.run().await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status(), Status::Failure);
        assert!(results[0].message().contains("Could not read dump file"));
        // The tunnel was never set up
        assert_eq!(ports.active_count(), 0);
    });
}

#[test]
fn test_restore_step_name() {
    let database = Database::new(DbType::Mysql, "app_production", "app", "pw");
    let step = RestoreDatabase::new(database, "/tmp/dump.sql");

    let script = Script::new("db-restore", "").with_step(step);
    assert_eq!(script.step_names(), vec!["restore-app-production-database"]);
}
