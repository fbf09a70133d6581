use serde::Serialize;
use serde_json::{Map, Value};

/// Keys some callers wrap the send arguments in, checked in this order.
const WRAPPER_KEYS: [&str; 4] = ["args", "arguments", "payload", "data"];

/// Fields of a send request, before any validation.
#[derive(Debug, Default, PartialEq)]
pub struct SendRequest {
    pub to: Option<String>,
    pub body: Option<String>,
    pub metadata: Value,
}

impl SendRequest {
    /// Builds a request from the raw JSON body.
    ///
    /// The first wrapper key holding an object is unwrapped; otherwise the
    /// top-level object is used. A `to` given as a JSON number is accepted.
    pub fn from_json(raw: &Value) -> Self {
        let fields = WRAPPER_KEYS
            .iter()
            .find_map(|key| raw.get(key).filter(|v| v.is_object()))
            .unwrap_or(raw);

        let to = match fields.get("to") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        let body = fields
            .get("body")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let metadata = fields
            .get("metadata")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        Self { to, body, metadata }
    }
}

#[derive(Serialize)]
pub struct SendResponse {
    pub ok: bool,
    pub sid: String,
    pub to: String,
    pub message_status: String,
    pub metadata: Value,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

#[derive(Serialize)]
pub struct PingResponse {
    pub ok: bool,
    pub time: String,
}
