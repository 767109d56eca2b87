use thiserror::Error;

pub const MAX_THREAD_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid thread id {id:?}: {reason}")]
pub struct InvalidThreadId {
    pub id: String,
    pub reason: &'static str,
}

/// Fresh thread token, `thread-<uuid v4>`
pub fn generate_thread_id() -> String {
    format!("thread-{}", uuid::Uuid::new_v4())
}

/// Thread ids double as storage keys and file names, so they must not
/// contain separators, traversal sequences, whitespace or control chars.
pub fn validate_thread_id(id: &str) -> Result<(), InvalidThreadId> {
    let fail = |reason| {
        Err(InvalidThreadId {
            id: id.to_string(),
            reason,
        })
    };

    if id.is_empty() {
        return fail("empty");
    }
    if id.len() > MAX_THREAD_ID_LEN {
        return fail("too long");
    }
    if id.contains('/') || id.contains('\\') {
        return fail("contains a path separator");
    }
    if id.contains("..") {
        return fail("contains '..'");
    }
    if id.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return fail("contains whitespace or control characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = generate_thread_id();
        let b = generate_thread_id();
        assert!(a.starts_with("thread-"));
        assert_ne!(a, b);
        assert!(validate_thread_id(&a).is_ok());
    }

    #[test]
    fn test_rejects_unsafe_ids() {
        let long = "x".repeat(MAX_THREAD_ID_LEN + 1);
        for bad in ["", "../etc", "a/b", "a\\b", "has space", "nul\0", long.as_str()] {
            assert!(validate_thread_id(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_accepts_opaque_tokens() {
        for ok in ["t1", "thread-1234", "user_42.session", "ÇaVa"] {
            assert!(validate_thread_id(ok).is_ok(), "rejected {:?}", ok);
        }
    }
}
