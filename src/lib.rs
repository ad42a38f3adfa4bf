// Library exports for testing
pub mod api;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod upstream;

pub use errors::{HttpError, HttpResultExt, Payload};
