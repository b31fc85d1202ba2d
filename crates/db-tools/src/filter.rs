//! Restore-output filtering
//!
//! Restoring a dump into an environment where roles and ownership differ
//! from the source produces a stream of expected-benign complaints. The
//! filter removes those so the reported output only contains lines worth a
//! human's attention. Exit status, not filtered output, decides success.

use crate::database::DbType;
use regex::Regex;

/// Filter the captured output of a restore command for the given engine
///
/// PostgreSQL restores drop ownership/role errors, the `setval` result
/// blocks emitted by sequence-reset statements (the header line and the two
/// lines following it), and blank lines. Other engines pass through
/// unchanged.
pub fn filter_restore_output(db_type: DbType, output: &[String]) -> Vec<String> {
    match db_type {
        DbType::Postgres => filter_postgres(output),
        DbType::Mysql => output.to_vec(),
    }
}

fn filter_postgres(output: &[String]) -> Vec<String> {
    let benign = Regex::new(r"^ERROR:\s+(must be|role)").unwrap();

    let mut filtered = Vec::new();
    let mut skip_until = None;

    for (index, line) in output.iter().enumerate() {
        if let Some(end) = skip_until {
            if index <= end {
                continue;
            }
            skip_until = None;
        }

        if benign.is_match(line) {
            continue;
        }

        if line.trim() == "setval" {
            skip_until = Some(index + 2);
            continue;
        }

        if !line.trim().is_empty() {
            filtered.push(line.clone());
        }
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_ownership_errors_are_dropped() {
        let output = lines(&[
            "ERROR:  must be owner of extension plpgsql",
            "ERROR:  role \"admin\" does not exist",
            "CREATE TABLE",
        ]);

        assert_eq!(
            filter_restore_output(DbType::Postgres, &output),
            lines(&["CREATE TABLE"])
        );
    }

    #[test]
    fn test_setval_block_is_dropped() {
        let output = lines(&[
            "CREATE TABLE",
            " setval",
            "--------",
            "     42",
            "INSERT 0 1",
        ]);

        assert_eq!(
            filter_restore_output(DbType::Postgres, &output),
            lines(&["CREATE TABLE", "INSERT 0 1"])
        );
    }

    #[test]
    fn test_blank_lines_are_dropped() {
        let output = lines(&["", "ALTER TABLE", "   ", "COMMENT"]);

        assert_eq!(
            filter_restore_output(DbType::Postgres, &output),
            lines(&["ALTER TABLE", "COMMENT"])
        );
    }

    #[test]
    fn test_real_errors_survive() {
        let output = lines(&[
            "ERROR:  relation \"users\" already exists",
            "ERROR:  must be owner of table users",
        ]);

        assert_eq!(
            filter_restore_output(DbType::Postgres, &output),
            lines(&["ERROR:  relation \"users\" already exists"])
        );
    }

    #[test]
    fn test_mysql_output_passes_through() {
        let output = lines(&["", "Warning: something"]);
        assert_eq!(filter_restore_output(DbType::Mysql, &output), output);
    }
}
