use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::http_error::HttpError;
use super::payload::{Payload, PayloadUpdate};

/// Largest upstream body [`fetch_api_result`] will buffer
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Decode an upstream JSON response into `payload` and classify it.
///
/// The response is consumed; its body is released on every return path.
/// Returns an internal-error value when the body cannot be read or decoded,
/// a local 503 carrying the upstream message when the upstream answered with
/// a 5xx, and `None` otherwise.
pub async fn fetch_api_result<T: DeserializeOwned>(
    response: reqwest::Response,
    payload: &mut Payload<T>,
) -> Option<HttpError> {
    fetch_api_result_with_limit(response, payload, DEFAULT_MAX_BODY_BYTES).await
}

/// [`fetch_api_result`] with an explicit cap on the buffered body size
pub async fn fetch_api_result_with_limit<T: DeserializeOwned>(
    response: reqwest::Response,
    payload: &mut Payload<T>,
    max_body_bytes: usize,
) -> Option<HttpError> {
    let status = response.status().as_u16();

    match read_body(response, max_body_bytes).await {
        Ok(body) => classify_response(status, &body, payload),
        Err(e) => {
            debug!(status, "Failed to read upstream response body: {}", e);
            HttpError::from_error(
                StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                Some(e),
                None,
            )
        }
    }
}

async fn read_body(
    mut response: reqwest::Response,
    max_body_bytes: usize,
) -> anyhow::Result<Vec<u8>> {
    if let Some(length) = response.content_length() {
        if length > max_body_bytes as u64 {
            anyhow::bail!(
                "upstream body of {} bytes exceeds limit of {} bytes",
                length,
                max_body_bytes
            );
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_body_bytes {
            anyhow::bail!("upstream body exceeds limit of {} bytes", max_body_bytes);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Classify an upstream response that has already been read into memory.
///
/// Only the first JSON value in `body` is decoded; anything after it is
/// ignored. Fields absent from the body (or a `null` message) keep the values
/// already in `payload`.
pub fn classify_response<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
    payload: &mut Payload<T>,
) -> Option<HttpError> {
    let decoded = serde_json::Deserializer::from_slice(body)
        .into_iter::<PayloadUpdate<T>>()
        .next();

    match decoded {
        Some(Ok(update)) => update.apply_to(payload),
        Some(Err(e)) => {
            debug!(status, "Failed to decode upstream response: {}", e);
            return HttpError::from_error(
                StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                Some(e),
                None,
            );
        }
        None => {
            debug!(status, "Upstream response body is empty");
            return HttpError::from_error(
                StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                Some("EOF"),
                None,
            );
        }
    }

    if status >= StatusCode::INTERNAL_SERVER_ERROR.as_u16() {
        warn!(
            upstream_status = status,
            upstream_message = %payload.message,
            "Upstream server error, reporting service unavailable"
        );
        return Some(HttpError::with_message(
            StatusCode::SERVICE_UNAVAILABLE.as_u16(),
            payload.message.clone(),
            None,
        ));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::sentinels::ERR_INTERNAL_SERVER_ERROR;
    use serde_json::json;

    fn upstream(status: u16, body: &'static str) -> reqwest::Response {
        let response = axum::http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        reqwest::Response::from(response)
    }

    #[tokio::test]
    async fn test_upstream_5xx_becomes_local_503() {
        let mut payload: Payload = Payload::default();
        let err = fetch_api_result(upstream(503, r#"{"message":"down"}"#), &mut payload)
            .await
            .unwrap();

        assert_eq!(err.status_code(), 503);
        assert_eq!(err.text(), "down");
        assert!(err.is_error());
        assert!(err.result().is_none());
    }

    #[tokio::test]
    async fn test_upstream_500_is_not_forwarded() {
        let mut payload: Payload = Payload::default();
        let err = fetch_api_result(upstream(500, r#"{"message":"db exploded"}"#), &mut payload)
            .await
            .unwrap();

        assert_eq!(err.status_code(), 503);
        assert_eq!(err.text(), "db exploded");
    }

    #[tokio::test]
    async fn test_success_populates_payload() {
        let mut payload: Payload = Payload::default();
        let err = fetch_api_result(
            upstream(200, r#"{"message":"ok","result":{"id":42}}"#),
            &mut payload,
        )
        .await;

        assert!(err.is_none());
        assert_eq!(payload.message, "ok");
        assert_eq!(payload.result, Some(json!({ "id": 42 })));
    }

    #[tokio::test]
    async fn test_client_error_is_left_to_caller() {
        let mut payload: Payload = Payload::default();
        let err = fetch_api_result(upstream(404, r#"{"message":"no such card"}"#), &mut payload)
            .await;

        assert!(err.is_none());
        assert_eq!(payload.message, "no such card");
    }

    #[tokio::test]
    async fn test_unparsable_body_is_internal_error() {
        let mut payload: Payload = Payload::default();
        let err = fetch_api_result(upstream(200, "<html>oops</html>"), &mut payload)
            .await
            .unwrap();

        assert_eq!(err.status_code(), 500);
        assert_eq!(err.text(), "expected value at line 1 column 1");
        assert!(!err.is(&ERR_INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_decode_failure_wins_over_upstream_status() {
        let mut payload: Payload = Payload::default();
        let err = classify_response(502, b"", &mut payload).unwrap();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_classify_blocking_on_fetch() {
        let mut payload: Payload = Payload::default();
        let err = tokio_test::block_on(fetch_api_result(
            upstream(201, r#"{"message":"Created"}"#),
            &mut payload,
        ));
        assert!(err.is_none());
        assert_eq!(payload.message, "Created");
        assert!(payload.result.is_none());
    }

    #[test]
    fn test_null_message_is_accepted() {
        let mut payload: Payload = Payload::default();
        let err = classify_response(200, br#"{"message":null,"result":1}"#, &mut payload);
        assert!(err.is_none());
        assert_eq!(payload.message, "");
        assert_eq!(payload.result, Some(json!(1)));

        let mut payload: Payload = Payload::default();
        let err = classify_response(502, br#"{"message":null,"result":1}"#, &mut payload).unwrap();
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.text(), "");
    }

    #[tokio::test]
    async fn test_decode_keeps_preset_fields() {
        let mut payload = Payload::new(Some(json!({ "preset": true })));
        let err = fetch_api_result(upstream(200, r#"{"message":"ok"}"#), &mut payload).await;

        assert!(err.is_none());
        assert_eq!(payload.message, "ok");
        assert_eq!(payload.result, Some(json!({ "preset": true })));
    }

    #[test]
    fn test_decode_fills_typed_result() {
        #[derive(Debug, PartialEq, serde::Deserialize)]
        struct Card {
            id: u32,
            name: String,
        }

        let mut payload: Payload<Card> = Payload {
            message: "pending".to_string(),
            result: None,
        };
        let err = classify_response(
            200,
            br#"{"result":{"id":7,"name":"Sol Ring"}}"#,
            &mut payload,
        );

        assert!(err.is_none());
        assert_eq!(payload.message, "pending");
        assert_eq!(
            payload.result,
            Some(Card {
                id: 7,
                name: "Sol Ring".to_string()
            })
        );
    }

    #[test]
    fn test_trailing_data_after_first_value_is_ignored() {
        let mut payload: Payload = Payload::default();
        let err = classify_response(200, br#"{"message":"ok"} {"x":1}"#, &mut payload);
        assert!(err.is_none());
        assert_eq!(payload.message, "ok");
    }

    #[test]
    fn test_empty_body_is_internal_error() {
        let mut payload: Payload = Payload::default();
        let err = classify_response(200, b"  ", &mut payload).unwrap();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.text(), "EOF");
    }

    #[tokio::test]
    async fn test_oversized_body_is_internal_error() {
        let mut payload: Payload = Payload::default();
        let err = fetch_api_result_with_limit(
            upstream(200, r#"{"message":"far too long for the limit"}"#),
            &mut payload,
            8,
        )
        .await
        .unwrap();

        assert_eq!(err.status_code(), 500);
        assert!(err.text().contains("exceeds limit of 8 bytes"));
        assert_eq!(payload.message, "");
    }
}
