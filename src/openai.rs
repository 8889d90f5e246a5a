use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::error::{BotError, Result};
use crate::types::MessageRole;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig, client: reqwest::Client) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            client,
        }
    }

    /// Ask a single question and return the trimmed answer.
    pub async fn ask(&self, question: &str) -> Result<String> {
        debug!("Sending question to {} ({} chars)", self.model, question.len());

        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: MessageRole::User,
                content: Some(question.to_string()),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::OpenAiApi { status, message });
        }

        let body = response.text().await?;
        let answer = extract_answer(&body)?;
        debug!("Received answer ({} chars)", answer.len());
        Ok(answer)
    }
}

fn extract_answer(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)?;
    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BotError::OpenAiResponse("No choices in response".to_string()))?
        .message;

    Ok(message.content.unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_chat_completion_shape() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![Message {
                role: MessageRole::User,
                content: Some("hi".to_string()),
            }],
        };
        let value = serde_json::to_value(&request).expect("serializable");
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
    }

    #[test]
    fn answer_is_trimmed_first_choice() {
        let body = r#"{"choices":[
            {"message":{"role":"assistant","content":"  Hello there.\n"}},
            {"message":{"role":"assistant","content":"ignored"}}
        ]}"#;
        assert_eq!(extract_answer(body).expect("answer"), "Hello there.");
    }

    #[test]
    fn missing_choices_is_a_response_error() {
        let result = extract_answer(r#"{"choices":[]}"#);
        assert!(matches!(result, Err(BotError::OpenAiResponse(_))));
    }

    #[test]
    fn null_content_becomes_empty_answer() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(extract_answer(body).expect("answer"), "");
    }
}
