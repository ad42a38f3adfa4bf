//! HTTP-aware error values shared by handlers and upstream calls

pub mod http_error;
pub mod payload;
pub mod remote;
pub mod sentinels;
pub mod status;

pub use http_error::{as_http_error, as_http_error_anyhow, HttpError, HttpResultExt};
pub use payload::Payload;
pub use remote::{
    classify_response, fetch_api_result, fetch_api_result_with_limit, DEFAULT_MAX_BODY_BYTES,
};
pub use sentinels::{
    init_sentinels, JoinedErrors, ERRS, ERR_BAD_REQUEST, ERR_CONFLICT, ERR_FORBIDDEN, ERR_GONE,
    ERR_INTERNAL_SERVER_ERROR, ERR_NOT_FOUND, ERR_SERVICE_UNAVAILABLE, ERR_UNAUTHORIZED,
    ERR_UNPROCESSABLE_ENTITY,
};
pub use status::reason_phrase;
