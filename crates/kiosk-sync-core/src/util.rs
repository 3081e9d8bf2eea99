//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://` (case-insensitive).
pub fn is_http_url(value: &str) -> bool {
    let lowered = value.to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

/// Turn an operator-entered server address into a base URL.
///
/// Addresses without a scheme default to `https://`. Trailing slashes are removed.
pub fn normalize_server_address(value: &str) -> Option<String> {
    let value = normalize_text_option(Some(value.to_string()))?;
    let url = if is_http_url(&value) {
        value
    } else {
        format!("https://{value}")
    };
    Some(url.trim_end_matches('/').to_string())
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn unix_millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
