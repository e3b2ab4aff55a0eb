//! Google Gemini `generateContent` reply provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ReplyError, ReplyProvider};
use crate::error::ChatError;
use crate::types::{Role, Turn};

/// Header carrying the API credential.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Connection settings for [`GeminiReplyProvider`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    pub model: String,
    /// `None` means every request fails with [`ReplyError::Configuration`].
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

/// Remote reply provider backed by Gemini.
#[derive(Debug, Clone)]
pub struct GeminiReplyProvider {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

// =============================================================================
// Provider
// =============================================================================

impl GeminiReplyProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChatError::Config(format!("failed to create HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model,
            api_key: config.api_key,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

/// Gemini's name for each conversation role.
fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "model",
    }
}

fn build_request(turns: &[Turn]) -> GenerateRequest<'_> {
    GenerateRequest {
        contents: turns
            .iter()
            .map(|turn| Content {
                role: wire_role(turn.role),
                parts: vec![Part {
                    text: &turn.content,
                }],
            })
            .collect(),
    }
}

/// Pull the reply text out of a success body.
fn extract_reply(body: &str) -> Result<String, ReplyError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ReplyError::Protocol(format!("malformed response body: {}", e)))?;

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| ReplyError::Protocol("response has no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ReplyError::Protocol(
            "first candidate carries no text".to_string(),
        ));
    }
    Ok(text)
}

/// Best-effort error message from a failure body.
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
}

#[async_trait]
impl ReplyProvider for GeminiReplyProvider {
    #[instrument(skip(self, turns), fields(component = "gemini", model = %self.model, turns = turns.len()))]
    async fn get_reply(&self, turns: &[Turn]) -> Result<String, ReplyError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ReplyError::Configuration("no API key available for the Gemini provider".to_string())
        })?;

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, api_key)
            .json(&build_request(turns))
            .send()
            .await
            .map_err(|e| ReplyError::Transport(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ReplyError::Transport(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = error_message(&body).unwrap_or(body);
            return Err(ReplyError::Transport(format!(
                "Gemini returned {}: {}",
                status, detail
            )));
        }

        let reply = extract_reply(&body)?;
        debug!(
            reply_len = reply.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Gemini reply received"
        );
        Ok(reply)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisResult, TopicTag};

    fn config(api_key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            base_url: "https://example.invalid/v1beta/".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let p = GeminiReplyProvider::new(config(Some("k"))).unwrap();
        assert_eq!(
            p.endpoint(),
            "https://example.invalid/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(p.has_credential());
    }

    #[test]
    fn test_request_maps_roles() {
        let turns = vec![
            Turn::assistant("Hello!"),
            Turn::user(
                "hi",
                AnalysisResult {
                    expanded_query: "hi".to_string(),
                    topic: TopicTag::new("General", "Chitchat"),
                },
            ),
        ];
        let json = serde_json::to_value(build_request(&turns)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [
                    {"role": "model", "parts": [{"text": "Hello!"}]},
                    {"role": "user", "parts": [{"text": "hi"}]}
                ]
            })
        );
    }

    #[test]
    fn test_extract_reply_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]}}]}"#;
        assert_eq!(extract_reply(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_reply_missing_path_is_protocol_error() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#,
            "not json",
        ] {
            let err = extract_reply(body).unwrap_err();
            assert!(matches!(err, ReplyError::Protocol(_)), "{}", body);
        }
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body).as_deref(), Some("API key not valid"));
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let p = GeminiReplyProvider::new(config(None)).unwrap();
        let err = p.get_reply(&[Turn::assistant("hi")]).await.unwrap_err();
        assert!(matches!(err, ReplyError::Configuration(_)));
    }
}
