use axum::http::StatusCode;

/// Standard reason phrase for an HTTP status code.
///
/// Unknown or out-of-range codes map to an empty string.
pub fn reason_phrase(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("")
}

/// Whether a status code counts as an error response (4xx and 5xx)
pub fn is_error_status(code: u16) -> bool {
    code >= 400
}
