//! `reqwest` implementation of the chat service

use async_trait::async_trait;
use medbot_core::config::ServerConfig;
use medbot_core::{ChatReply, ChatRequest, ChatService};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Body of the health endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// One entry of the condition catalogue
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Condition {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity_level: Option<String>,
}

/// A remedy suggested for one condition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Remedy {
    pub id: i64,
    pub remedy_text: String,
    #[serde(default)]
    pub safety_notes: Option<String>,
}

/// Free-text feedback tied to the persistent user id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRequest {
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
struct FeedbackStatus {
    status: String,
}

/// Chat server client. One POST per message, no retries, no client timeout.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: Client,
    server: ServerConfig,
    chat_url: String,
}

impl HttpChatClient {
    pub fn new(server: &ServerConfig) -> Self {
        Self::with_client(Client::new(), server)
    }

    pub fn with_client(client: Client, server: &ServerConfig) -> Self {
        Self {
            client,
            server: server.clone(),
            chat_url: server.chat_url(),
        }
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// POST one message and decode the reply
    pub async fn post_chat(&self, request: &ChatRequest) -> ClientResult<ChatReply> {
        debug!("Sending chat request to {}", self.chat_url);
        let response = self.client.post(&self.chat_url).json(request).send().await?;
        let reply: ChatReply = decode(response).await?;
        debug!("Received {} byte reply", reply.response.len());
        Ok(reply)
    }

    /// Check that the server reports itself healthy
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let response = self.client.get(self.server.health_url()).send().await?;
        let health: HealthStatus = decode(response).await?;
        if !health.is_ok() {
            return Err(ClientError::InvalidResponse(format!(
                "health status is '{}'",
                health.status
            )));
        }
        Ok(health)
    }

    /// List the condition catalogue
    pub async fn conditions(&self) -> ClientResult<Vec<Condition>> {
        let url = self.server.conditions_url();
        debug!("Fetching conditions from {}", url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// List the remedies recorded for a condition
    pub async fn remedies(&self, condition_id: i64) -> ClientResult<Vec<Remedy>> {
        let url = self.server.remedies_url(condition_id);
        debug!("Fetching remedies from {}", url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// POST feedback; the server answers `{"status":"success"}`
    pub async fn submit_feedback(&self, feedback: &FeedbackRequest) -> ClientResult<()> {
        let url = self.server.feedback_url();
        debug!("Sending feedback to {}", url);
        let response = self.client.post(&url).json(feedback).send().await?;
        let ack: FeedbackStatus = decode(response).await?;
        if ack.status != "success" {
            return Err(ClientError::InvalidResponse(format!(
                "feedback status is '{}'",
                ack.status
            )));
        }
        Ok(())
    }
}

/// Reject non-2xx statuses, then parse the body as JSON
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status.as_u16()));
    }
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl ChatService for HttpChatClient {
    async fn send(&self, request: &ChatRequest) -> medbot_core::Result<ChatReply> {
        Ok(self.post_chat(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medbot_core::storage::MemoryStore;
    use medbot_core::session::{ConversationSession, Message, FALLBACK_MESSAGE, GREETING};
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Arc;

    fn server_config(url: &str) -> ServerConfig {
        ServerConfig {
            base_url: url.to_string(),
            ..ServerConfig::default()
        }
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            user_id: "4b1f0c9e-2f6a-4d3b-9e8a-1c2d3e4f5a6b".to_string(),
        }
    }

    #[tokio::test]
    async fn test_post_chat_sends_message_and_user_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "message": "I have a headache",
                "user_id": "4b1f0c9e-2f6a-4d3b-9e8a-1c2d3e4f5a6b",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"response":"Try resting.","disclaimer":"see a doctor"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let reply = client.post_chat(&request("I have a headache")).await.unwrap();

        assert_eq!(reply.response, "Try resting.");
        assert_eq!(reply.disclaimer.as_deref(), Some("see a doctor"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat")
            .with_status(500)
            .with_body(r#"{"response":"ignored"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let err = client.post_chat(&request("test")).await.unwrap_err();

        assert!(matches!(err, ClientError::Status(500)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"reply":"wrong field"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let err = client.post_chat(&request("test")).await.unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));

        let core_err: medbot_core::Error = err.into();
        assert!(matches!(core_err, medbot_core::Error::Chat(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let client = HttpChatClient::new(&server_config("http://127.0.0.1:9"));
        let err = client.post_chat(&request("test")).await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"ok"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        assert!(client.health().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_health_rejects_other_status() {
        let mut server = mockito::Server::new_async().await;
        let _degraded = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body(r#"{"status":"degraded"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        assert!(matches!(
            client.health().await,
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_session_round_trip_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(200)
            .with_body(r#"{"response":"Try resting."}"#)
            .create_async()
            .await;

        let client = Arc::new(HttpChatClient::new(&server_config(&server.url())));
        let mut session = ConversationSession::new(client);
        session.initialize(&mut MemoryStore::new()).unwrap();
        session.submit_text("I have a headache").await;

        assert_eq!(
            session.state().messages(),
            &[
                Message::bot(GREETING),
                Message::user("I have a headache"),
                Message::bot("Try resting."),
            ]
        );
        assert!(!session.state().is_busy());
    }

    #[tokio::test]
    async fn test_session_falls_back_when_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/chat")
            .with_status(503)
            .create_async()
            .await;

        let client = Arc::new(HttpChatClient::new(&server_config(&server.url())));
        let mut session = ConversationSession::new(client);
        session.initialize(&mut MemoryStore::new()).unwrap();
        session.submit_text("test").await;

        assert_eq!(
            session.state().messages().last(),
            Some(&Message::bot(FALLBACK_MESSAGE))
        );
        assert!(!session.state().is_busy());
    }

    #[tokio::test]
    async fn test_conditions_lists_catalogue() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/conditions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id":1,"name":"Common Cold","description":"Viral infection","severity_level":"mild"},
                    {"id":2,"name":"Migraine","description":null,"severity_level":null}
                ]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let conditions = client.conditions().await.unwrap();

        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].name, "Common Cold");
        assert_eq!(conditions[0].severity_level.as_deref(), Some("mild"));
        assert_eq!(conditions[1].id, 2);
        assert!(conditions[1].description.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_conditions_malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/conditions")
            .with_status(200)
            .with_body(r#"{"conditions":[]}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        assert!(matches!(
            client.conditions().await,
            Err(ClientError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_remedies_requests_condition_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/remedies/3")
            .with_status(200)
            .with_body(
                r#"[{"id":10,"remedy_text":"Rest and fluids","safety_notes":"See a doctor if fever persists"},
                    {"id":11,"remedy_text":"Warm tea"}]"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let remedies = client.remedies(3).await.unwrap();

        assert_eq!(remedies[0].remedy_text, "Rest and fluids");
        assert_eq!(
            remedies[0].safety_notes.as_deref(),
            Some("See a doctor if fever persists")
        );
        assert!(remedies[1].safety_notes.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remedies_not_found_is_a_status_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/remedies/99")
            .with_status(404)
            .with_body(r#"{"detail":"Not Found"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        assert!(matches!(
            client.remedies(99).await,
            Err(ClientError::Status(404))
        ));
    }

    #[tokio::test]
    async fn test_submit_feedback_sends_message_and_user_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/feedback")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "message": "Very helpful",
                "user_id": "4b1f0c9e-2f6a-4d3b-9e8a-1c2d3e4f5a6b",
            })))
            .with_status(200)
            .with_body(r#"{"status":"success"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let feedback = FeedbackRequest {
            message: "Very helpful".to_string(),
            user_id: "4b1f0c9e-2f6a-4d3b-9e8a-1c2d3e4f5a6b".to_string(),
        };
        client.submit_feedback(&feedback).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_feedback_rejects_other_status() {
        let mut server = mockito::Server::new_async().await;
        let _failed = server
            .mock("POST", "/feedback")
            .with_status(200)
            .with_body(r#"{"status":"error"}"#)
            .create_async()
            .await;

        let client = HttpChatClient::new(&server_config(&server.url()));
        let feedback = FeedbackRequest {
            message: "test".to_string(),
            user_id: "u".to_string(),
        };
        assert!(matches!(
            client.submit_feedback(&feedback).await,
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
