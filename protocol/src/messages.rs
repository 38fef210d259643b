use serde::{Deserialize, Serialize};

use engine::{Message, Metadata, Value};

fn default_duration_secs() -> f64 {
    30.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduceRequest {
    pub log_id: String,
    pub payload: Value,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProduceResponse {
    pub message_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireNextRequest {
    pub log_id: String,
    pub group_id: String,
    pub client_id: String,
    #[serde(default = "default_duration_secs")]
    pub duration: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireNextResponse {
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettleRequest {
    pub log_id: String,
    pub group_id: String,
    pub message_id: u64,
    pub client_id: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettleResponse {
    pub status: &'static str,
}

impl SettleResponse {
    pub fn settled() -> Self {
        Self { status: "settled" }
    }
}

impl<'de> Deserialize<'de> for SettleResponse {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            status: String,
        }

        let helper = Helper::deserialize(deserializer)?;
        match helper.status.as_str() {
            "settled" => Ok(SettleResponse::settled()),
            other => Err(serde::de::Error::custom(format!("unknown status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode_body, encode_body};
    use serde_json::json;

    #[test]
    fn produce_request_round_trips_through_messagepack() {
        let request = ProduceRequest {
            log_id: "orders".to_owned(),
            payload: json!({"x": 1}),
            metadata: None,
        };
        let encoded = encode_body(&request).unwrap();
        let decoded: ProduceRequest = decode_body(&encoded).unwrap();
        assert_eq!(decoded.log_id, "orders");
        assert_eq!(decoded.payload, json!({"x": 1}));
        assert_eq!(decoded.metadata, None);
    }

    #[test]
    fn acquire_next_request_defaults_duration_when_absent() {
        let encoded = encode_body(&json!({
            "log_id": "orders",
            "group_id": "workers",
            "client_id": "c1",
        }))
        .unwrap();
        let decoded: AcquireNextRequest = decode_body(&encoded).unwrap();
        assert_eq!(decoded.duration, 30.0);
    }
}
