/// Escape a string for safe inclusion in a shell command
///
/// Used when composing remote command lines that pass through a local shell
/// and the remote login shell.
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    if s.contains(|c: char| c.is_whitespace() || "\"'\\$`!*?<>|&;()[]{}".contains(c)) {
        // Use single quotes and escape any single quotes in the string
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_escape() {
        assert_eq!(shell_escape("simple"), "simple");
        assert_eq!(shell_escape("with space"), "'with space'");
        assert_eq!(shell_escape("with'quote"), "'with'\"'\"'quote'");
        assert_eq!(shell_escape("$variable"), "'$variable'");
        assert_eq!(shell_escape("path/to/file"), "path/to/file");
        assert_eq!(shell_escape(""), "''");
    }
}
