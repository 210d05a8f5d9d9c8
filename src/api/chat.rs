use super::{ApiClient, ApiResult};
use crate::models::{ChatReply, ChatRequest, Suggestions};

impl ApiClient {
    pub async fn send_chat_message(&self, message: &str) -> ApiResult<ChatReply> {
        let request = ChatRequest {
            message: message.to_string(),
        };
        self.post("/chat/message", &request).await
    }

    pub async fn chat_suggestions(&self) -> ApiResult<Vec<String>> {
        let suggestions: Option<Suggestions> = self.get("/chat/suggestions", &[]).await?;
        Ok(suggestions.unwrap_or_default().suggestions)
    }
}
