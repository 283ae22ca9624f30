//! Gemini `generateContent` client.

use crate::{
    error::{ReportError, Result},
    narrative::NarrativeService,
};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
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
    message: String,
}

/// Concatenated text of every part of every candidate.
fn response_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();
    if text.is_empty() {
        return Err(ReportError::EmptyResponse);
    }
    Ok(text)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(GeminiClient {
            client,
            base_url: GEMINI_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl NarrativeService for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.generate_url();
        debug!("POST {}", url);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };
        // The key travels as a header so it never shows up in error URLs.
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| text.trim().to_string());
            return Err(ReportError::Service {
                status: status.as_u16(),
                message,
            });
        }
        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| ReportError::ResponseParse(e.to_string()))?;
        response_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_concatenates_parts() {
        let body = r###"{
            "candidates": [
                {"content": {"parts": [{"text": "## Executive Summary\n"}, {"text": "Vegetation is stable."}], "role": "model"}}
            ],
            "usageMetadata": {"totalTokenCount": 42}
        }"###;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            response_text(parsed).unwrap(),
            "## Executive Summary\nVegetation is stable."
        );
    }

    #[test]
    fn test_blocked_response_is_empty() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(response_text(parsed), Err(ReportError::EmptyResponse)));
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"parts": [{"text": "hello"}]}]})
        );
    }

    #[test]
    fn test_generate_url() {
        let client = GeminiClient::new("key", DEFAULT_GEMINI_MODEL).unwrap();
        assert_eq!(
            client.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_connection_error_hides_api_key() {
        // Nothing listens on the discard port.
        let client = GeminiClient::new("AIzaSECRETKEY123", DEFAULT_GEMINI_MODEL)
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, ReportError::HttpRequest(_)));
        let report = crate::narrative::NarrativeReport::Failed(err.to_string()).text();
        assert!(!report.contains("AIzaSECRETKEY123"), "{report}");
        assert!(!format!("{err:?}").contains("AIzaSECRETKEY123"));
    }
}
