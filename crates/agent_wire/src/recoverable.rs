use std::sync::OnceLock;

use regex::Regex;

/// Structured error codes that mean the server no longer knows the session.
const RECOVERABLE_CODES: &[&str] = &["session_not_found", "session_expired", "session_invalid"];

fn recoverable_text_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(
            r"(?i)no conversation found with session|session (was )?(not found|expired|is invalid)|resume failed|exited with code 1",
        )
        .expect("recoverable-error regex must compile")
    })
}

/// Classifies a server error as a recoverable session invalidation.
///
/// A structured `code` wins when the server provides one; the text heuristics
/// only back-fill servers that still report invalid sessions as prose.
pub fn is_recoverable_session_error(code: Option<&str>, message: &str) -> bool {
    if let Some(code) = code {
        let code = code.trim();
        if !code.is_empty() {
            return RECOVERABLE_CODES
                .iter()
                .any(|known| code.eq_ignore_ascii_case(known));
        }
    }

    recoverable_text_regex().is_match(message)
}
