use serde::{Deserialize, Serialize};

/// Message role in conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of one chat-completion call. Serialises to the wire payload as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

impl CompletionRequest {
    /// Create a streaming request.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: true,
        }
    }

    /// The fixed greeting exchange used by the demo.
    pub fn greeting() -> Self {
        Self::new(
            "gpt-3.5-turbo",
            vec![
                Message::system("You are a helpful assistant."),
                Message::user("Hello!"),
            ],
        )
    }
}

/// Response metadata carried by the first protocol line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub id: String,
    pub model: String,
}

/// Classification of one line after the metadata line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    /// Incremental text; empty when the delta carries no content.
    ContentDelta(String),
    /// `finish_reason == "stop"`; the sentinel line(s) follow.
    Terminal,
    /// Blank keep-alive line.
    Skip,
    /// Not JSON. Forwarded as an empty token.
    Malformed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_payload() {
        let body = serde_json::to_value(CompletionRequest::greeting()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "Hello!"}
                ],
                "stream": true
            })
        );
    }
}
