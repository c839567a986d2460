//! CI run annotations
//!
//! Warnings that must stay visible in the run summary are printed as GitHub
//! Actions workflow commands on stdout, and mirrored to `tracing`.

const WARNING: &str = "warning";

/// Escape a message body for a workflow command.
fn escape_data(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Escape a property value (`title=...`) for a workflow command.
fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

pub fn format_command(kind: &str, title: &str, message: &str) -> String {
    format!("::{kind} title={}::{}", escape_property(title), escape_data(message))
}

/// Non-fatal warning annotation; the run continues. Returns the command
/// line as printed.
pub fn warning(title: &str, message: &str) -> String {
    tracing::warn!("{title}: {message}");
    let command = format_command(WARNING, title, message);
    println!("{command}");
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_command_shape() {
        assert_eq!(
            format_command(WARNING, "No digest", "mt_digest_2024-03-06.md not found"),
            "::warning title=No digest::mt_digest_2024-03-06.md not found"
        );
    }

    #[test]
    fn warning_returns_printed_command() {
        assert_eq!(warning("No digest", "nothing today"), "::warning title=No digest::nothing today");
    }

    #[test]
    fn escapes_newlines_and_percent() {
        assert_eq!(
            format_command(WARNING, "a:b,c", "100%\nline2"),
            "::warning title=a%3Ab%2Cc::100%25%0Aline2"
        );
    }
}
