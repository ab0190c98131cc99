use std::collections::HashMap;

/// Maximum length of a response body kept in error messages.
pub const MAX_BODY_LENGTH: usize = 4000;

/// Truncates `s` to at most `max_len` bytes on a char boundary.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}

/// Copy of `options` with secret-looking values replaced by `***`, for logging.
pub fn redact_options(options: &HashMap<String, String>) -> HashMap<String, String> {
    options
        .iter()
        .map(|(key, value)| {
            let lower = key.to_lowercase();
            let sensitive = lower.contains("password")
                || lower.contains("token")
                || lower.contains("secret")
                || lower.contains("api_key");
            let value = if sensitive { "***".to_string() } else { value.clone() };
            (key.clone(), value)
        })
        .collect()
}
