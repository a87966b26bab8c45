//! Content types accepted for outbound mail and broker payloads.

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";
pub const APPLICATION_JSON: &str = "application/json";

/// Content types an [`Email`](crate::Email) body may carry.
pub const SUPPORTED_BODY_TYPES: [&str; 2] = [TEXT_PLAIN, TEXT_HTML];

/// Returns `true` if `content_type` is one of [`SUPPORTED_BODY_TYPES`].
///
/// Parameters such as `; charset=utf-8` are ignored and the comparison is
/// case-insensitive.
pub fn is_supported_body_type(content_type: &str) -> bool {
    let essence = content_type
        .split_once(';')
        .map_or(content_type, |(essence, _)| essence)
        .trim();

    SUPPORTED_BODY_TYPES
        .iter()
        .any(|supported| supported.eq_ignore_ascii_case(essence))
}
