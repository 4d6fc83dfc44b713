//! reqwest-backed transport for the chatbot REST API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::Value;
use url::Url;

use super::{
    ChatReply, ErrorKind, Transport, TransportError, UserProfile, error_detail, parse_history,
    parse_profile, parse_reply,
};
use crate::core::app;
use crate::core::config::Config;
use crate::core::credentials::CredentialStore;
use crate::core::message::ChatMessage;

pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpTransport {
    pub fn new(
        config: &Config,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(app::user_agent())
            .build()?;
        Ok(HttpTransport {
            client,
            base: config.api_url.clone(),
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base.join(path).map_err(|e| {
            log::error!("cannot build endpoint {:?} from {}: {}", path, self.base, e);
            TransportError::new(ErrorKind::Unknown)
        })
    }

    /// Send with the bearer token (when one is stored) and return the JSON body.
    ///
    /// Non-success statuses become classified errors carrying the server's message.
    async fn call(&self, request: RequestBuilder) -> Result<Value, TransportError> {
        let request = match self.credentials.access_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        if !status.is_success() {
            let kind = ErrorKind::from_status(status.as_u16());
            log::warn!("{} returned HTTP {} ({})", url, status.as_u16(), kind);
            return Err(TransportError {
                kind,
                detail: error_detail(&body),
            });
        }
        log::debug!("{} returned HTTP {}", url, status.as_u16());
        Ok(body)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send_message(&self, text: &str) -> Result<ChatReply, TransportError> {
        let url = self.endpoint("chat")?;
        let body = self
            .call(
                self.client
                    .post(url)
                    .json(&serde_json::json!({ "message": text })),
            )
            .await?;
        parse_reply(&body).ok_or_else(|| {
            log::warn!("chat response without reply text: {}", body);
            TransportError::new(ErrorKind::Unknown)
        })
    }

    async fn fetch_history(&self) -> Result<Vec<ChatMessage>, TransportError> {
        let url = self.endpoint("chats")?;
        let body = self.call(self.client.get(url)).await?;
        Ok(parse_history(&body))
    }

    async fn fetch_current_user(&self) -> Result<UserProfile, TransportError> {
        let url = self.endpoint("users/me")?;
        let body = self.call(self.client.get(url)).await?;
        parse_profile(&body).ok_or_else(|| {
            log::warn!("user profile response without a name: {}", body);
            TransportError::new(ErrorKind::Unknown)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::core::config;
    use crate::core::credentials::MemoryCredentialStore;

    fn transport(server: &MockServer, store: Arc<dyn CredentialStore>) -> HttpTransport {
        transport_at(format!("{}/api", server.uri()), store)
    }

    fn transport_at(api_url: String, store: Arc<dyn CredentialStore>) -> HttpTransport {
        let config = config::from_lookup(move |name| match name {
            "HEALTHCHAT_API_URL" => Some(api_url.clone()),
            "HEALTHCHAT_TIMEOUT_SECS" => Some("5".to_string()),
            _ => None,
        })
        .unwrap();
        HttpTransport::new(&config, store).unwrap()
    }

    #[tokio::test]
    async fn send_message_posts_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(json!({ "message": "hi" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": true, "response": "Rest." })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::with_token("tok"));
        let reply = transport(&server, store).send_message("hi").await.unwrap();
        assert_eq!(reply.response, "Rest.");
    }

    #[tokio::test]
    async fn no_token_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chats"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "sender": "user", "text": "hi" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::default());
        let history = transport(&server, store).fetch_history().await.unwrap();
        assert_eq!(history.len(), 1);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn unauthorized_is_authentication_with_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "Token expired" })))
            .mount(&server)
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::with_token("old"));
        let err = transport(&server, store).fetch_current_user().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);
        assert_eq!(err.user_message(), "Token expired");
    }

    #[tokio::test]
    async fn current_user_profile_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "name": "Ada", "avatar_url": "/a.png" })),
            )
            .mount(&server)
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::with_token("tok"));
        let user = transport(&server, store).fetch_current_user().await.unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.avatar_url.as_deref(), Some("/a.png"));
    }

    #[tokio::test]
    async fn server_error_without_body_uses_default_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::default());
        let err = transport(&server, store).send_message("x").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Server);
        assert!(err.kind.is_retryable());
        assert_eq!(err.user_message(), ErrorKind::Server.default_message());
    }

    #[tokio::test]
    async fn refused_connection_is_network() {
        // A port that was just released has nothing listening on it.
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::default());
        let err = transport_at(format!("http://{}/api", addr), store)
            .send_message("x")
            .await
            .unwrap_err();
        assert!(err.kind.is_retryable(), "{err:?}");
    }
}
