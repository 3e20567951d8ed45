use serde::Serialize;

/// Request body sent to every route: a single-turn streaming chat completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatPayload {
    pub model: String,
    pub max_tokens: u32,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatPayload {
    #[must_use]
    pub fn user_prompt(model: &str, max_tokens: u32, content: &str) -> Self {
        Self {
            model: model.to_owned(),
            max_tokens,
            stream: true,
            messages: vec![ChatMessage {
                role: "user".to_owned(),
                content: content.to_owned(),
            }],
        }
    }
}
