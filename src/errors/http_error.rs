use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::payload::Payload;
use super::status::{is_error_status, reason_phrase};

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

fn next_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// An HTTP status code paired with its JSON response payload.
///
/// Values built with an error marker behave as genuine errors: they implement
/// [`std::error::Error`], propagate through `?` and `anyhow`, and display their
/// message. Values without the marker (2xx/3xx results from [`HttpError::new`])
/// flow through the same type so handlers can project every outcome uniformly.
///
/// Equality is identity: two values are equal only when one was cloned from
/// the other. Separately constructed values never compare equal, even with the
/// same status and message, so dynamic errors cannot alias the sentinels.
#[derive(Debug, Clone)]
pub struct HttpError {
    identity: u64,
    status: u16,
    payload: Payload,
    is_error: bool,
}

impl HttpError {
    /// Build a value whose message is the reason phrase for `code`.
    ///
    /// Marked as an error only for codes >= 400.
    pub fn new(code: u16, result: Option<Value>) -> Self {
        Self {
            identity: next_identity(),
            status: code,
            payload: Payload {
                message: reason_phrase(code).to_string(),
                result,
            },
            is_error: is_error_status(code),
        }
    }

    /// Wrap an underlying error, or return `None` when there is none.
    pub fn from_error<E: fmt::Display>(
        code: u16,
        err: Option<E>,
        result: Option<Value>,
    ) -> Option<Self> {
        err.map(|err| Self::with_message(code, err.to_string(), result))
    }

    /// Build a value with an explicit message. Always marked as an error.
    pub fn with_message(code: u16, message: impl Into<String>, result: Option<Value>) -> Self {
        Self {
            identity: next_identity(),
            status: code,
            payload: Payload {
                message: message.into(),
                result,
            },
            is_error: true,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.payload.message
    }

    pub fn result(&self) -> Option<&Value> {
        self.payload.result.as_ref()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Error text: the message when marked as an error, otherwise empty
    pub fn text(&self) -> &str {
        if self.is_error {
            &self.payload.message
        } else {
            ""
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Identity check: true only for the same value or a clone of it
    pub fn is(&self, other: &HttpError) -> bool {
        self.identity == other.identity
    }

    /// `Err(self)` when marked as an error, `Ok(self)` otherwise
    pub fn into_result(self) -> Result<Self, Self> {
        if self.is_error {
            Err(self)
        } else {
            Ok(self)
        }
    }

    /// Status code and body to write. 204 never carries a body.
    pub fn http_response(&self) -> (u16, Option<&Payload>) {
        if self.status == StatusCode::NO_CONTENT.as_u16() {
            (self.status, None)
        } else {
            (self.status, Some(&self.payload))
        }
    }
}

impl PartialEq for HttpError {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl Eq for HttpError {}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl StdError for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.http_response().1.is_none() {
            return status.into_response();
        }

        (status, Json(self.payload)).into_response()
    }
}

/// Narrow a generic error to an [`HttpError`] if that is its concrete type
pub fn as_http_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a HttpError> {
    err.downcast_ref::<HttpError>()
}

/// Narrow an [`anyhow::Error`] to an [`HttpError`] if that is its concrete type
pub fn as_http_error_anyhow(err: &anyhow::Error) -> Option<&HttpError> {
    err.downcast_ref::<HttpError>()
}

/// Map foreign errors into [`HttpError`] at the `?` site
pub trait HttpResultExt<T> {
    /// Replace the error with an [`HttpError`] carrying its message
    fn or_http(self, code: u16) -> Result<T, HttpError>;

    /// Same as [`HttpResultExt::or_http`], attaching a result payload
    fn or_http_with(self, code: u16, result: Value) -> Result<T, HttpError>;
}

impl<T, E: fmt::Display> HttpResultExt<T> for Result<T, E> {
    fn or_http(self, code: u16) -> Result<T, HttpError> {
        self.map_err(|err| HttpError::with_message(code, err.to_string(), None))
    }

    fn or_http_with(self, code: u16, result: Value) -> Result<T, HttpError> {
        self.map_err(|err| HttpError::with_message(code, err.to_string(), Some(result)))
    }
}
