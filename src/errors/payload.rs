use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON body carried by every response: `{"message": ..., "result"?: ...}`
///
/// `T` is the result type; untyped payloads use [`serde_json::Value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Payload<T = Value> {
    /// Human-readable description (`null` decodes as empty)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    /// Structured data attached to the response (omitted when absent)
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> Payload<T> {
    /// Create a payload with an empty message and the given result
    pub fn new(result: Option<T>) -> Self {
        Self {
            message: String::new(),
            result,
        }
    }
}

impl<T> Default for Payload<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

fn none<T>() -> Option<T> {
    None
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Fields present in a decoded body.
///
/// Missing or `null` message leaves the target untouched; a missing result
/// leaves it untouched, an explicit `null` clears it.
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub(crate) struct PayloadUpdate<T> {
    #[serde(default)]
    message: Option<String>,
    #[serde(default = "none", deserialize_with = "present")]
    result: Option<Option<T>>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl<T> PayloadUpdate<T> {
    pub(crate) fn apply_to(self, payload: &mut Payload<T>) {
        if let Some(message) = self.message {
            payload.message = message;
        }
        if let Some(result) = self.result {
            payload.result = result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_key_omitted_when_absent() {
        let payload: Payload = Payload {
            message: "Not Found".to_string(),
            result: None,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json, json!({ "message": "Not Found" }));
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_empty_message_still_serialized() {
        let payload = Payload::new(Some(json!([1, 2, 3])));
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, r#"{"message":"","result":[1,2,3]}"#);
    }

    #[test]
    fn test_missing_message_decodes_as_empty() {
        let payload: Payload = serde_json::from_str(r#"{"result":{"id":7}}"#).unwrap();
        assert_eq!(payload.message, "");
        assert_eq!(payload.result, Some(json!({ "id": 7 })));
    }

    #[test]
    fn test_null_message_decodes_as_empty() {
        let payload: Payload = serde_json::from_str(r#"{"message":null,"result":1}"#).unwrap();
        assert_eq!(payload.message, "");
        assert_eq!(payload.result, Some(json!(1)));
    }

    #[test]
    fn test_typed_result() {
        #[derive(Debug, PartialEq, Deserialize)]
        struct Card {
            id: u32,
        }

        let payload: Payload<Card> =
            serde_json::from_str(r#"{"message":"ok","result":{"id":3}}"#).unwrap();
        assert_eq!(payload.result, Some(Card { id: 3 }));
    }

    #[test]
    fn test_update_keeps_fields_missing_from_body() {
        let mut payload = Payload {
            message: "preset".to_string(),
            result: Some(json!({ "preset": true })),
        };

        let update: PayloadUpdate<Value> = serde_json::from_str(r#"{"message":null}"#).unwrap();
        update.apply_to(&mut payload);
        assert_eq!(payload.message, "preset");
        assert_eq!(payload.result, Some(json!({ "preset": true })));

        let update: PayloadUpdate<Value> = serde_json::from_str(r#"{"result":null}"#).unwrap();
        update.apply_to(&mut payload);
        assert!(payload.result.is_none());
    }
}
