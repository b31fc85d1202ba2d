//! CLI subcommand implementations

pub mod db;
pub mod run;
pub mod scripts;

use convoy_engine::StepResult;

/// Print a run's results to stdout
pub(crate) fn print_results(results: &[StepResult]) {
    for result in results {
        println!("[{}] {}: {}", result.status(), result.step(), result.message());
        for line in result.output() {
            println!("    {}", line);
        }
    }
}
