use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Reply from `POST /chat/message`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub context_used: bool,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Body of `GET /chat/suggestions`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
}
