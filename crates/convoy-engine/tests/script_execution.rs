//! Tests for script sequencing, gating, and result aggregation

use convoy_engine::{
    Callable, Environment, Error, RunScript, Script, ShellCommand, Status, StepError,
};
use ssh_tunnel::Host;

fn staging() -> Environment {
    Environment::new("staging").with_host(Host::new("web1.example.com").with_user("deploy"))
}

#[test]
fn test_stop_on_failure_halts_remaining_steps() {
    futures::executor::block_on(async {
        let script = Script::new("deploy", "Deploy the application.")
            .with_step(ShellCommand::new("exit 0").with_name("a"))
            .with_step(ShellCommand::new("exit 1").with_name("b"))
            .with_step(ShellCommand::new("exit 0").with_name("c"))
            .with_environment(staging());

        let results = script.run().await.unwrap();

        // c never runs, not even as a skipped entry
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status(), Status::Success);
        assert_eq!(results[1].status(), Status::Failure);
        assert_eq!(results[1].exit_code(), Some(1));
    });
}

#[test]
fn test_run_continues_when_stop_on_failure_disabled() {
    futures::executor::block_on(async {
        let mut script = Script::new("deploy", "Deploy the application.")
            .with_step(ShellCommand::new("exit 1").with_name("a"))
            .with_step(ShellCommand::new("exit 0").with_name("b"))
            .with_environment(staging());
        script.set_stop_on_failure(false);

        let results = script.run().await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_failure());
        assert!(results[1].is_success());
    });
}

#[test]
fn test_dry_run_skips_unsupported_steps() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");

        let mut script = Script::new("deploy", "Deploy the application.")
            .with_step(
                ShellCommand::new(format!("touch {}", marker.display())).with_name("destructive"),
            )
            .with_environment(staging());
        script.set_dry_run(true);

        let results = script.run().await.unwrap();

        assert_eq!(results[0].status(), Status::Skipped);
        assert_eq!(results[0].message(), "no dry-run support");
        // The real side effect never happened
        assert!(!marker.exists());
    });
}

#[test]
fn test_dry_run_runs_the_alternate_command() {
    futures::executor::block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        let alternate = dir.path().join("alternate");

        let mut script = Script::new("deploy", "Deploy the application.")
            .with_step(
                ShellCommand::new(format!("touch {}", real.display()))
                    .with_name("guarded")
                    .with_dry_run_command(format!("touch {}", alternate.display())),
            )
            .with_environment(staging());
        script.set_dry_run(true);

        let results = script.run().await.unwrap();

        assert!(results[0].is_success());
        assert!(!real.exists());
        assert!(alternate.exists());
    });
}

#[test]
fn test_environment_gating() {
    futures::executor::block_on(async {
        let step = || {
            ShellCommand::new("exit 0")
                .with_name("staging-only")
                .only_in_environment("staging")
        };

        let dev_env = Environment::new("joe-dev")
            .with_dev(true)
            .with_host(Host::new("dev.local"));
        let on_dev = Script::new("deploy", "")
            .with_step(step())
            .with_environment(dev_env);
        let results = on_dev.run().await.unwrap();
        assert_eq!(results[0].status(), Status::Skipped);
        assert!(results[0].message().contains("environment mismatch"));

        let on_staging = Script::new("deploy", "")
            .with_step(step())
            .with_environment(staging());
        let results = on_staging.run().await.unwrap();
        assert_eq!(results[0].status(), Status::Success);
    });
}

#[test]
fn test_callable_errors_become_failure_results() {
    futures::executor::block_on(async {
        let script = Script::new("deploy", "")
            .with_step(
                Callable::new(|| Err(StepError::Failed("git tree is dirty".to_string())))
                    .with_name("check-git"),
            )
            .with_environment(staging());

        let results = script.run().await.unwrap();

        assert!(results[0].is_failure());
        assert_eq!(results[0].message(), "git tree is dirty");
    });
}

#[test]
fn test_skip_step_by_request() {
    futures::executor::block_on(async {
        let mut script = Script::new("deploy", "")
            .with_step(ShellCommand::new("exit 1").with_name("flaky"))
            .with_step(ShellCommand::new("exit 0").with_name("solid"))
            .with_environment(staging());
        script.skip_step("flaky");

        let results = script.run().await.unwrap();

        assert_eq!(results[0].status(), Status::Skipped);
        assert_eq!(results[0].message(), "skipped by request");
        assert!(results[1].is_success());
    });
}

#[test]
fn test_step_names_do_not_execute_anything() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("ran");

    let script = Script::new("deploy", "")
        .with_step(ShellCommand::new(format!("touch {}", marker.display())).with_name("one"))
        .with_step(ShellCommand::new("exit 0"));

    assert_eq!(script.step_names(), vec!["one", "shell-exit"]);
    assert!(!marker.exists());
}

#[test]
fn test_run_without_environment_is_a_configuration_error() {
    futures::executor::block_on(async {
        let script = Script::new("deploy", "").with_step(ShellCommand::new("exit 0"));

        assert!(matches!(
            script.run().await,
            Err(Error::NoEnvironment { .. })
        ));
    });
}

#[test]
fn test_reporting_step_still_runs_after_failure() {
    futures::executor::block_on(async {
        use convoy_engine::{ConsoleNotifier, LogAndNotify};
        use std::sync::Arc;

        let script = Script::new("deploy", "")
            .with_step(ShellCommand::new("exit 1").with_name("broken"))
            .with_step(ShellCommand::new("exit 0").with_name("never-runs"))
            .with_step(LogAndNotify::new(Arc::new(ConsoleNotifier)))
            .with_environment(staging());

        let results = script.run().await.unwrap();

        // The ordinary step between the failure and the reporting step
        // produces no result at all
        assert_eq!(results.len(), 2);
        assert!(results[0].is_failure());
        assert_eq!(results[1].step(), "log-and-notify");
        assert!(results[1].is_success());
    });
}

#[test]
fn test_composite_rolls_up_embedded_results() {
    futures::executor::block_on(async {
        let clean = Script::new("inner-ok", "")
            .with_step(ShellCommand::new("exit 0").with_name("a"))
            .with_step(ShellCommand::new("exit 0").with_name("b"));

        let broken = Script::new("inner-broken", "")
            .with_step(ShellCommand::new("exit 1").with_name("a"));

        let script = Script::new("outer", "")
            .with_step(RunScript::new(clean))
            .with_step(RunScript::new(broken))
            .with_environment(staging());

        let results = script.run().await.unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].is_success());
        assert!(results[1].is_failure());
        assert!(results[1].message().contains("1 of 1 steps failed"));
    });
}

#[test]
fn test_shell_output_is_captured_verbatim() {
    futures::executor::block_on(async {
        let script = Script::new("deploy", "")
            .with_step(ShellCommand::new("echo one; echo two").with_name("echo"))
            .with_environment(staging());

        let results = script.run().await.unwrap();

        assert_eq!(results[0].output(), &["one", "two"]);
    });
}
