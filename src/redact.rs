/// Credential redaction for logging
///
/// The TimeZoneDB key travels in the query string, so any URL that reaches a
/// log line goes through here first.

/// Redact a secret, keeping only the first 3 characters visible.
/// Example: "ABCDEF123456" -> "ABC*********"
pub fn secret(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        // Too short to show any of it
        return "*".repeat(count);
    }

    let visible: String = value.chars().take(3).collect();
    format!("{}{}", visible, "*".repeat(count - 3))
}
