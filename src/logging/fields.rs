//! Field helpers for structured logging

use uuid::Uuid;

/// Characters of user content included in a preview.
const PREVIEW_CHARS: usize = 100;

/// Generate a new request ID using UUID v4
///
/// ```
/// use llm_router::logging::generate_request_id;
///
/// let request_id = generate_request_id();
/// assert_eq!(request_id.len(), 36);
/// ```
pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

/// Privacy-safe preview of a message for logs.
///
/// Returns `None` unless content logging is enabled. Long messages are cut
/// at a character boundary and suffixed with `...`.
pub fn preview_message(message: Option<&str>, enable_content_logging: bool) -> Option<String> {
    if !enable_content_logging {
        return None;
    }
    let message = message?.trim();
    if message.is_empty() {
        return None;
    }

    let mut chars = message.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        Some(format!("{}...", head))
    } else {
        Some(head)
    }
}
