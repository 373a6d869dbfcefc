use async_trait::async_trait;
use coach_core::error::GatewayError;
use coach_core::gateway::CompletionGateway;
use coach_core::message::Message;
use coach_core::model::ModelId;
use reqwest::Client;
use std::time::Duration;

/// Chat completions over an OpenAI-compatible `/v1/chat/completions`
/// endpoint. One request per call, no retries.
pub struct OpenAiGateway {
    client: Client,
    api_key: String,
    model: ModelId,
    base_url: String,
}

impl OpenAiGateway {
    pub fn new(api_key: String, model: ModelId, base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("falling back to default HTTP client: {e}");
                Client::new()
            });
        Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    fn request_body(&self, messages: &[Message], temperature: f32) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        serde_json::json!({
            "model": self.model.0,
            "messages": messages,
            "temperature": temperature,
        })
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[Message],
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let body = self.request_body(messages, temperature);
        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            temperature,
            "chat completion request"
        );

        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = api_error_message(&text);
            return Err(if status == 429 {
                GatewayError::RateLimited { message }
            } else {
                GatewayError::Api { status, message }
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
        parse_completion(&json)
    }

    fn model(&self) -> &ModelId {
        &self.model
    }
}

/// Pull `error.message` out of an API error body, else return it as-is.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn parse_completion(json: &serde_json::Value) -> Result<String, GatewayError> {
    let choice = json["choices"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| GatewayError::MalformedResponse("no choices in response".into()))?;

    if let Some(usage) = json.get("usage") {
        tracing::debug!(
            prompt_tokens = usage["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens = usage["completion_tokens"].as_u64().unwrap_or(0),
            "provider reported usage"
        );
    }

    choice["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| GatewayError::MalformedResponse("choice has no text content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> OpenAiGateway {
        OpenAiGateway::new(
            "sk-test".into(),
            ModelId("gpt-4.1-mini".into()),
            "https://api.example.com/".into(),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_request_body_shape() {
        let messages = vec![
            Message::system("be an interviewer".into()),
            Message::user("ready".into()),
            Message::assistant("First question?".into()),
        ];
        let body = gateway().request_body(&messages, 0.5);

        assert_eq!(body["model"], "gpt-4.1-mini");
        assert_eq!(body["temperature"], 0.5);
        assert_eq!(
            body["messages"],
            serde_json::json!([
                {"role": "system", "content": "be an interviewer"},
                {"role": "user", "content": "ready"},
                {"role": "assistant", "content": "First question?"},
            ])
        );
        assert!(body.get("stream").is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            gateway().endpoint(),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_completion_text() {
        let json = serde_json::json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Tell me about indexes."},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 7}
        });
        assert_eq!(parse_completion(&json).unwrap(), "Tell me about indexes.");
    }

    #[test]
    fn test_parse_completion_malformed() {
        let empty = serde_json::json!({"choices": []});
        assert!(matches!(
            parse_completion(&empty),
            Err(GatewayError::MalformedResponse(_))
        ));

        let no_text = serde_json::json!({"choices": [{"message": {"content": null}}]});
        assert!(matches!(
            parse_completion(&no_text),
            Err(GatewayError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(api_error_message(body), "Incorrect API key provided");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_model_accessor() {
        assert_eq!(gateway().model().0, "gpt-4.1-mini");
    }
}
