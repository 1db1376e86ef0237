//! Mock content service for testing
//!
//! Provides scripted [`ContentApi`] clients so the generator and service can
//! be exercised without network calls.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiResult, ClientFactory, ContentApi};
use crate::error::ApiError;

/// One scripted upstream outcome
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this raw text
    Text(String),
    /// Fail with this error
    Fail(ApiError),
    /// Never answer within any reasonable timeout
    Hang,
}

impl MockReply {
    /// A well-formed reply holding `count` suggestions
    pub fn suggestions(count: usize) -> Self {
        let items: Vec<String> = (0..count)
            .map(|i| {
                serde_json::json!({
                    "title": format!("Generated {i}"),
                    "description": format!("Do thing {i}"),
                    "category": "behavioral",
                    "steps": ["Start", "Finish"]
                })
                .to_string()
            })
            .collect();
        MockReply::Text(format!("```json\n[{}]\n```", items.join(",")))
    }
}

/// A captured upstream call for test assertions
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub api_key: String,
    pub prompt: String,
}

/// Factory producing clients that share one reply script.
///
/// # Example
/// ```ignore
/// let factory = MockClientFactory::new()
///     .with_reply(MockReply::Fail(ApiError::ServerError("boom".into())))
///     .with_reply(MockReply::suggestions(3));
/// ```
#[derive(Clone)]
pub struct MockClientFactory {
    /// Replies consumed in order, one per call
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    /// Reply once the script is exhausted
    default_reply: Arc<Mutex<MockReply>>,
    /// Keys whose calls always fail with a server error
    failing_keys: Arc<Mutex<HashSet<String>>>,
    /// Keys passed to `connect`, in order
    connections: Arc<Mutex<Vec<String>>>,
    /// Every upstream call made through any client
    calls: Arc<Mutex<Vec<CapturedCall>>>,
}

impl Default for MockClientFactory {
    fn default() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            default_reply: Arc::new(Mutex::new(MockReply::suggestions(3))),
            failing_keys: Arc::new(Mutex::new(HashSet::new())),
            connections: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockClientFactory {
    /// Create a factory whose clients always succeed with three suggestions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next unscripted call.
    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    /// Reply used once the queue is empty.
    pub fn with_default_reply(self, reply: MockReply) -> Self {
        *self.default_reply.lock().unwrap() = reply;
        self
    }

    /// Make every call with `api_key` fail regardless of the script.
    pub fn with_failing_key(self, api_key: &str) -> Self {
        self.failing_keys.lock().unwrap().insert(api_key.to_string());
        self
    }

    pub fn connections(&self) -> Vec<String> {
        self.connections.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl ClientFactory for MockClientFactory {
    type Client = MockContentApi;

    fn connect(&self, api_key: &str) -> ApiResult<MockContentApi> {
        self.connections.lock().unwrap().push(api_key.to_string());
        Ok(MockContentApi {
            api_key: api_key.to_string(),
            factory: self.clone(),
        })
    }
}

/// Client handed out by [`MockClientFactory`]
pub struct MockContentApi {
    api_key: String,
    factory: MockClientFactory,
}

#[async_trait]
impl ContentApi for MockContentApi {
    async fn generate_content(&self, prompt: &str) -> ApiResult<String> {
        self.factory.calls.lock().unwrap().push(CapturedCall {
            api_key: self.api_key.clone(),
            prompt: prompt.to_string(),
        });

        if self.factory.failing_keys.lock().unwrap().contains(&self.api_key) {
            return Err(ApiError::ServerError(format!("key {} rejected", self.api_key)));
        }

        let reply = {
            let next = self.factory.replies.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.factory.default_reply.lock().unwrap().clone())
        };

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(err) => Err(err),
            MockReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ApiError::Timeout(Duration::from_secs(3600)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_reply_succeeds() {
        let factory = MockClientFactory::new();
        let client = factory.connect("k1").unwrap();

        let text = client.generate_content("p").await.unwrap();
        assert!(text.contains("Generated 2"));
        assert_eq!(factory.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_script_is_consumed_in_order() {
        let factory = MockClientFactory::new()
            .with_reply(MockReply::Fail(ApiError::Unauthorized))
            .with_reply(MockReply::Text("ok".to_string()));
        let client = factory.connect("k1").unwrap();

        assert!(client.generate_content("p").await.is_err());
        assert_eq!(client.generate_content("p").await.unwrap(), "ok");
        // Falls back to the default reply
        assert!(client.generate_content("p").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_failing_key_ignores_script() {
        let factory = MockClientFactory::new().with_failing_key("bad");
        let bad = factory.connect("bad").unwrap();
        let good = factory.connect("good").unwrap();

        assert!(matches!(
            bad.generate_content("p").await,
            Err(ApiError::ServerError(_))
        ));
        assert!(good.generate_content("p").await.is_ok());
        assert_eq!(factory.connections(), vec!["bad", "good"]);

        let calls = factory.calls();
        assert_eq!(calls[0].api_key, "bad");
        assert_eq!(calls[1].api_key, "good");
    }
}
