use serde::{Deserialize, Serialize};

#[derive(Serialize, Debug)]
pub struct Health {
    pub status: &'static str,
    pub message: &'static str,
}

impl Health {
    pub fn healthy() -> Self {
        Self { status: "healthy", message: "farm game save server is running" }
    }
}

/// Success envelope returned by register/login/save: a short confirmation
/// plus the document as it is stored.
#[derive(Serialize, Debug)]
pub struct SaveResponse {
    pub message: &'static str,
    pub data: serde_json::Value,
}

/// Failure envelope. `error` is the stable kind name, `code` the numeric code.
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub code: u16,
    pub message: String,
}
