//! Detection service client.
//!
//! One request per poll tick against the configured endpoint. Calls are
//! independent: the client makes no ordering guarantee between them.

use crate::detection::types::Detection;
use crate::error::{Result, SafestepError};
use std::sync::Mutex;
use std::time::Duration;

/// Trait for fetching one detection result.
///
/// This trait allows swapping implementations (real HTTP vs scripted mock).
#[async_trait::async_trait]
pub trait DetectionClient: Send + Sync {
    /// Issue a single request and parse the result.
    ///
    /// Transport failures and non-success responses surface as
    /// `DetectionUnavailable`; malformed bodies as `DetectionDecode`.
    /// An error is never a negative detection.
    async fn fetch(&self) -> Result<Detection>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "client"
    }
}

/// HTTP client for the detection service.
pub struct HttpDetectionClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpDetectionClient {
    /// Creates a client for the given endpoint with a bounded request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SafestepError::Other(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl DetectionClient for HttpDetectionClient {
    async fn fetch(&self) -> Result<Detection> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| SafestepError::DetectionUnavailable {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(SafestepError::DetectionUnavailable {
                message: format!("endpoint returned status {}", response.status()),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| SafestepError::DetectionUnavailable {
                message: format!("failed to read response body: {e}"),
            })?;

        serde_json::from_str(&text).map_err(|e| SafestepError::DetectionDecode {
            message: e.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "http-client"
    }
}

/// One scripted reply for [`ScriptedClient`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Resolve with a detection result.
    Detection(Detection),
    /// Fail the tick with a transport error.
    Unavailable,
    /// Fail the tick with a decode error.
    Malformed,
    /// Fail the tick with a non-recoverable client fault.
    Fault,
}

impl ScriptedReply {
    pub fn detected(confidence: f32) -> Self {
        ScriptedReply::Detection(Detection {
            detected: true,
            confidence,
        })
    }

    pub fn clear() -> Self {
        ScriptedReply::Detection(Detection {
            detected: false,
            confidence: 0.0,
        })
    }
}

/// Scripted detection client for testing.
///
/// Plays back a fixed sequence of replies, then repeats the final reply.
/// An optional per-call delay simulates request latency.
pub struct ScriptedClient {
    replies: Mutex<Vec<ScriptedReply>>,
    cursor: Mutex<usize>,
    delay: Option<Duration>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: Mutex::new(replies),
            cursor: Mutex::new(0),
            delay: None,
        }
    }

    /// Configure a fixed latency before each reply resolves
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of fetches issued so far.
    pub fn calls(&self) -> usize {
        *self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self) -> ScriptedReply {
        let replies = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let index = (*cursor).min(replies.len().saturating_sub(1));
        *cursor += 1;
        replies
            .get(index)
            .cloned()
            .unwrap_or_else(ScriptedReply::clear)
    }
}

#[async_trait::async_trait]
impl DetectionClient for ScriptedClient {
    async fn fetch(&self) -> Result<Detection> {
        let reply = self.next_reply();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match reply {
            ScriptedReply::Detection(detection) => Ok(detection),
            ScriptedReply::Unavailable => Err(SafestepError::DetectionUnavailable {
                message: "scripted transport failure".to_string(),
            }),
            ScriptedReply::Malformed => Err(SafestepError::DetectionDecode {
                message: "scripted malformed body".to_string(),
            }),
            ScriptedReply::Fault => Err(SafestepError::Other("scripted client fault".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "scripted-client"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_client_plays_sequence_then_repeats_last() {
        let client = ScriptedClient::new(vec![
            ScriptedReply::clear(),
            ScriptedReply::detected(0.9),
        ]);

        let first = client.fetch().await.unwrap();
        assert!(!first.detected);

        let second = client.fetch().await.unwrap();
        assert!(second.detected);

        // Past the end of the script the last reply repeats
        let third = client.fetch().await.unwrap();
        assert!(third.detected);
        assert_eq!(client.calls(), 3);
    }

    #[tokio::test]
    async fn scripted_client_surfaces_errors() {
        let client = ScriptedClient::new(vec![ScriptedReply::Unavailable, ScriptedReply::Malformed]);

        assert!(matches!(
            client.fetch().await,
            Err(SafestepError::DetectionUnavailable { .. })
        ));
        assert!(matches!(
            client.fetch().await,
            Err(SafestepError::DetectionDecode { .. })
        ));
    }

    #[tokio::test]
    async fn scripted_client_fault_is_not_transient() {
        let client = ScriptedClient::new(vec![ScriptedReply::Fault]);
        let error = client.fetch().await.unwrap_err();
        assert!(!error.is_transient());
    }

    #[test]
    fn http_client_keeps_endpoint() {
        let client =
            HttpDetectionClient::new("http://localhost:5000/api/crosswalk", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.endpoint(), "http://localhost:5000/api/crosswalk");
    }

    #[tokio::test]
    async fn http_client_connection_refused_is_unavailable() {
        // Bind then drop a listener so the port is very likely closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = HttpDetectionClient::new(
            format!("http://127.0.0.1:{port}/api/crosswalk"),
            Duration::from_secs(1),
        )
        .unwrap();

        match client.fetch().await {
            Err(SafestepError::DetectionUnavailable { .. }) => {}
            other => panic!("Expected DetectionUnavailable, got {:?}", other),
        }
    }
}
