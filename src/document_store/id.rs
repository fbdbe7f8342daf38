//! # Document Identifiers
//!
//! Random identifier generation and sanitization of caller-supplied ids.

use rand::{distributions::Alphanumeric, Rng};

use super::record::final_component;

/// Length of every generated document id
pub const ID_LENGTH: usize = 20;

/// Default cap on collision retries before giving up
pub const DEFAULT_MAX_ID_ATTEMPTS: usize = 4096;

/// Draw one random candidate id.
///
/// Ids are lower-cased so stored filenames stay distinct on case-insensitive
/// file systems.
pub fn random_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LENGTH)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Reduce a caller-supplied id to its trusted base name.
///
/// Everything up to the last `/` or `\` is dropped, then any trailing
/// `.extension`. An id containing NUL sanitizes to the empty string, which
/// never matches a record.
pub fn sanitize_id(raw: &str) -> String {
    if raw.contains('\0') {
        return String::new();
    }

    let base = final_component(raw);
    match base.rfind('.') {
        Some(pos) => base[..pos].to_string(),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_id_shape() {
        for _ in 0..100 {
            let id = random_id();
            assert_eq!(id.len(), ID_LENGTH);
            assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
            assert_eq!(id, id.to_lowercase());
        }
    }

    #[test]
    fn test_random_ids_differ() {
        let ids: HashSet<String> = (0..1000).map(|_| random_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_sanitize_plain_id_unchanged() {
        assert_eq!(sanitize_id("25isfunnierthan24lol"), "25isfunnierthan24lol");
    }

    #[test]
    fn test_sanitize_traversal() {
        assert_eq!(sanitize_id("../secret"), "secret");
        assert_eq!(sanitize_id("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_id("..\\..\\windows\\win.ini"), "win");
        assert_eq!(sanitize_id("/absolute/path/abc"), "abc");
    }

    #[test]
    fn test_sanitize_strips_extension() {
        assert_eq!(sanitize_id("abc.jpg"), "abc");
        assert_eq!(sanitize_id(".."), ".");
        assert_eq!(sanitize_id("."), "");
    }

    #[test]
    fn test_sanitize_edge_cases() {
        assert_eq!(sanitize_id(""), "");
        assert_eq!(sanitize_id("dir/"), "");
        assert_eq!(sanitize_id("abc\0def"), "");
    }
}
