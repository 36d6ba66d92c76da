//! Small shared helpers.

/// Truncate a string to `max_len` characters, appending an ellipsis when
/// content was cut. Used to keep notification bodies readable.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }

    let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{truncated}...")
}
