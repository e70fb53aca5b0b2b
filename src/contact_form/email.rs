use std::sync::LazyLock;

use crate::pattern::Pattern;

// Simplified RFC 5322 shape. The domain must have at least one dot.
const EMAIL_PATTERN: &str = concat!(
    r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+",
    r"@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?",
    r"(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
);

static EMAIL: LazyLock<Option<Pattern>> = LazyLock::new(|| match Pattern::new(EMAIL_PATTERN) {
    Ok(pattern) => Some(pattern),
    Err(err) => {
        tracing::error!("email pattern failed to compile: {err}");
        None
    }
});

/// Format check for an already-trimmed email address.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value).unwrap_or(false))
}
