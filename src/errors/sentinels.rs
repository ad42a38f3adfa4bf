use axum::http::StatusCode;
use lazy_static::lazy_static;
use std::fmt;

use super::http_error::HttpError;

lazy_static! {
    pub static ref ERR_BAD_REQUEST: HttpError =
        HttpError::new(StatusCode::BAD_REQUEST.as_u16(), None);
    pub static ref ERR_UNAUTHORIZED: HttpError =
        HttpError::new(StatusCode::UNAUTHORIZED.as_u16(), None);
    pub static ref ERR_FORBIDDEN: HttpError =
        HttpError::new(StatusCode::FORBIDDEN.as_u16(), None);
    pub static ref ERR_NOT_FOUND: HttpError =
        HttpError::new(StatusCode::NOT_FOUND.as_u16(), None);
    pub static ref ERR_CONFLICT: HttpError =
        HttpError::new(StatusCode::CONFLICT.as_u16(), None);
    pub static ref ERR_GONE: HttpError = HttpError::new(StatusCode::GONE.as_u16(), None);
    pub static ref ERR_UNPROCESSABLE_ENTITY: HttpError =
        HttpError::new(StatusCode::UNPROCESSABLE_ENTITY.as_u16(), None);
    pub static ref ERR_SERVICE_UNAVAILABLE: HttpError =
        HttpError::new(StatusCode::SERVICE_UNAVAILABLE.as_u16(), None);
    pub static ref ERR_INTERNAL_SERVER_ERROR: HttpError =
        HttpError::new(StatusCode::INTERNAL_SERVER_ERROR.as_u16(), None);

    /// Every sentinel, for membership checks only
    pub static ref ERRS: JoinedErrors = JoinedErrors::new(vec![
        ERR_BAD_REQUEST.clone(),
        ERR_UNAUTHORIZED.clone(),
        ERR_FORBIDDEN.clone(),
        ERR_NOT_FOUND.clone(),
        ERR_CONFLICT.clone(),
        ERR_GONE.clone(),
        ERR_UNPROCESSABLE_ENTITY.clone(),
        ERR_SERVICE_UNAVAILABLE.clone(),
        ERR_INTERNAL_SERVER_ERROR.clone(),
    ]);
}

/// Build the sentinel table up front instead of on first use
pub fn init_sentinels() {
    lazy_static::initialize(&ERRS);
}

/// A group of errors matched by identity.
///
/// `contains` is true when the target is one of the members (or a clone of one).
#[derive(Debug, Clone, Default)]
pub struct JoinedErrors {
    errors: Vec<HttpError>,
}

impl JoinedErrors {
    pub fn new(errors: Vec<HttpError>) -> Self {
        Self { errors }
    }

    pub fn contains(&self, target: &HttpError) -> bool {
        self.errors.iter().any(|err| err.is(target))
    }

    /// The member matching `target`, if any
    pub fn find(&self, target: &HttpError) -> Option<&HttpError> {
        self.errors.iter().find(|err| err.is(target))
    }

    pub fn iter(&self) -> impl Iterator<Item = &HttpError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for JoinedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}
