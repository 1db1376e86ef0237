//! Gemini `generateContent` REST client

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, StatusCode};

use super::{
    ApiResult, ClientFactory, ContentApi, GenerateContentRequest, GenerateContentResponse,
    GenerationConfig, HTTP_TIMEOUT,
};
use crate::config::GenerationSettings;
use crate::error::ApiError;

/// Builds [`GeminiClient`]s that share one connection pool
#[derive(Debug, Clone)]
pub struct GeminiConnector {
    http: HttpClient,
    endpoint: String,
    generation_config: GenerationConfig,
}

impl GeminiConnector {
    pub fn new(settings: &GenerationSettings) -> ApiResult<Self> {
        let http = HttpClient::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            settings.api_base.trim_end_matches('/'),
            settings.model
        );

        Ok(Self {
            http,
            endpoint,
            generation_config: GenerationConfig {
                temperature: settings.temperature,
                top_k: settings.top_k,
                top_p: settings.top_p,
                max_output_tokens: settings.max_output_tokens,
            },
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ClientFactory for GeminiConnector {
    type Client = GeminiClient;

    fn connect(&self, api_key: &str) -> ApiResult<GeminiClient> {
        if api_key.trim().is_empty() {
            return Err(ApiError::Unauthorized);
        }
        Ok(GeminiClient {
            http: self.http.clone(),
            endpoint: self.endpoint.clone(),
            api_key: api_key.to_string(),
            generation_config: self.generation_config.clone(),
        })
    }
}

/// A Gemini client bound to one API key
pub struct GeminiClient {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    generation_config: GenerationConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &crate::keys::mask_secret(&self.api_key))
            .finish()
    }
}

#[async_trait]
impl ContentApi for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> ApiResult<String> {
        let body = GenerateContentRequest::from_prompt(prompt, self.generation_config.clone());

        debug!("POST {}", self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let data = response
                    .json::<GenerateContentResponse>()
                    .await
                    .map_err(|e| {
                        ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
                    })?;
                data.text()
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(ApiError::RateLimit(Duration::from_secs(retry_after)))
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Bad request".to_string());
                Err(ApiError::BadRequest(error_msg))
            }
            status if status.is_server_error() => {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("Server error: {}", status));
                Err(ApiError::ServerError(error_msg))
            }
            _ => {
                let error_msg = format!("Unexpected status code: {}", status);
                Err(ApiError::InvalidResponse(error_msg))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(api_base: &str) -> GenerationSettings {
        GenerationSettings {
            api_base: api_base.to_string(),
            ..GenerationSettings::default()
        }
    }

    const OK_BODY: &str = r#"{
        "candidates": [
            { "content": {
                "role": "model",
                "parts": [ { "text": "[{\"title\": \"Stretch\"}]" } ]
            } }
        ]
    }"#;

    #[test]
    fn test_endpoint_includes_model() {
        let connector = GeminiConnector::new(&settings("https://example.test/v1beta/")).unwrap();
        assert_eq!(
            connector.endpoint(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_connect_rejects_blank_key() {
        let connector = GeminiConnector::new(&settings("http://localhost")).unwrap();
        assert!(matches!(
            connector.connect("  "),
            Err(ApiError::Unauthorized)
        ));
    }

    #[test]
    fn test_client_debug_masks_key() {
        let connector = GeminiConnector::new(&settings("http://localhost")).unwrap();
        let client = connector.connect("AIzaSySECRETSECRET").unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("SECRETSECRET"));
    }

    #[tokio::test]
    async fn test_generate_content_sends_key_and_config() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"generationConfig": {"topK": 40, "maxOutputTokens": 2048}}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(OK_BODY)
            .create_async()
            .await;

        let connector = GeminiConnector::new(&settings(&server.url())).unwrap();
        let client = connector.connect("test-key").unwrap();
        let text = client.generate_content("prompt").await.unwrap();

        assert!(text.contains("Stretch"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_codes_map_to_errors() {
        let mut server = mockito::Server::new_async().await;
        let connector = GeminiConnector::new(&settings(&server.url())).unwrap();
        let client = connector.connect("test-key").unwrap();
        let path = "/models/gemini-1.5-flash:generateContent";

        let m = server
            .mock("POST", path)
            .with_status(429)
            .with_header("retry-after", "12")
            .create_async()
            .await;
        let err = client.generate_content("p").await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimit(d) if d == Duration::from_secs(12)));
        m.remove_async().await;

        let m = server
            .mock("POST", path)
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;
        let err = client.generate_content("p").await.unwrap_err();
        assert!(matches!(err, ApiError::ServerError(ref msg) if msg == "overloaded"));
        m.remove_async().await;

        let m = server
            .mock("POST", path)
            .with_status(403)
            .create_async()
            .await;
        let err = client.generate_content("p").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden));
        m.remove_async().await;

        let m = server
            .mock("POST", path)
            .with_status(400)
            .with_body("API key not valid")
            .create_async()
            .await;
        let err = client.generate_content("p").await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        m.remove_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_invalid_response() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/models/gemini-1.5-flash:generateContent")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let connector = GeminiConnector::new(&settings(&server.url())).unwrap();
        let client = connector.connect("k").unwrap();
        let err = client.generate_content("p").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }
}
