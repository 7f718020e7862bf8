//! Chat Completions wire types
//!
//! Only the fields the coach sends and reads are modelled.

use bestself_application::ChatRequest;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> From<&'a ChatRequest> for ChatCompletionRequest<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            model: request.model.as_str(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`, when it has any non-blank text
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// Pull the provider's message out of an error body, falling back to the raw text
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bestself_domain::{Message, Model};

    #[test]
    fn test_request_keeps_turn_order() {
        let request = ChatRequest {
            model: Model::Gpt4oMini,
            messages: vec![
                Message::system("You are a coach"),
                Message::user("Hi"),
                Message::assistant("Hello!"),
                Message::user("Help me"),
            ],
            temperature: 0.7,
            max_tokens: 1000,
        };
        let json = serde_json::to_value(ChatCompletionRequest::from(&request)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        let roles: Vec<_> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(json["messages"][3]["content"], "Help me");
        assert_eq!(json["max_tokens"], 1000);
    }

    #[test]
    fn test_reply_text() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.into_text().as_deref(), Some("Hi there"));

        let empty: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":"  "}}]}"#).unwrap();
        assert_eq!(empty.into_text(), None);

        let none: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(none.into_text(), None);
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error":{"message":"Incorrect API key","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
