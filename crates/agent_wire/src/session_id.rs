use std::sync::OnceLock;

use regex::Regex;

fn session_id_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(
            r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
        )
        .expect("session id regex must compile")
    })
}

/// Returns true when `candidate` has the exact UUID shape the server accepts.
pub fn is_valid_session_id(candidate: &str) -> bool {
    session_id_regex().is_match(candidate)
}

/// Boundary gate for session identifiers placed on the wire.
///
/// A valid identifier is normalized to lowercase; anything else (including
/// locally minted placeholder ids) is treated as absent, never forwarded raw.
pub fn sanitize_session_id(candidate: Option<&str>) -> Option<String> {
    let candidate = candidate?.trim();
    if is_valid_session_id(candidate) {
        Some(candidate.to_ascii_lowercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_session_id, sanitize_session_id};

    #[test]
    fn uuid_shape_is_accepted_case_insensitively() {
        assert!(is_valid_session_id("6f2a9c1e-3d4b-4a5c-8e7f-0123456789ab"));
        assert!(is_valid_session_id("6F2A9C1E-3D4B-4A5C-8E7F-0123456789AB"));
    }

    #[test]
    fn non_uuid_shapes_are_rejected() {
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("local-draft-1"));
        assert!(!is_valid_session_id("6f2a9c1e3d4b4a5c8e7f0123456789ab"));
        assert!(!is_valid_session_id("6f2a9c1e-3d4b-4a5c-8e7f-0123456789ab "));
        assert!(!is_valid_session_id("6f2a9c1e-3d4b-4a5c-8e7f-0123456789abcd"));
    }

    #[test]
    fn sanitize_lowercases_valid_ids_and_drops_the_rest() {
        assert_eq!(
            sanitize_session_id(Some("6F2A9C1E-3D4B-4A5C-8E7F-0123456789AB")),
            Some("6f2a9c1e-3d4b-4a5c-8e7f-0123456789ab".to_string())
        );
        assert_eq!(sanitize_session_id(Some("placeholder")), None);
        assert_eq!(sanitize_session_id(None), None);
    }

    #[test]
    fn sanitize_trims_surrounding_whitespace() {
        assert_eq!(
            sanitize_session_id(Some("  6f2a9c1e-3d4b-4a5c-8e7f-0123456789ab\n")),
            Some("6f2a9c1e-3d4b-4a5c-8e7f-0123456789ab".to_string())
        );
    }
}
