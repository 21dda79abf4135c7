use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::backend::{ChatBackend, EventStream};
use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::sse::process_stream;
use crate::types::{
    ChatMessage, ChatRequest, ChatResponse, Conversation, ConversationList, ConversationSummary,
    DeleteConversationResponse, HealthStatus, ProductionReadinessRequest, Role, ServiceInfo,
    StreamEvent,
};

/// Environment variable consulted for the backend URL.
pub const BASE_URL_ENV: &str = "ARCHITECT_CHAT_URL";

/// Backend URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";

/// Timeout applied to non-streaming requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the chat backend.
#[derive(Clone)]
pub struct ChatClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl ChatClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the
    /// `ARCHITECT_CHAT_URL` environment variable; it defaults to
    /// `http://localhost:8000/`.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds non-streaming requests only.  A streamed reply is
    /// read for as long as the backend keeps sending; use a cancellation
    /// token to stop it.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let client = ReqwestClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
            logger: None,
        })
    }

    /// Attach a logger that sees every response and stream event.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The backend URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The timeout applied to non-streaming requests.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn conversation_url(&self, id: &str) -> Result<Url> {
        let mut url = self.endpoint("api/conversations")?;
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("cannot use {} as a base URL", self.base_url), None))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    fn default_headers(accept: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        headers
    }

    /// Send a request and check its status, mapping failures to our Error type.
    async fn execute(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {e}"),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(e.to_string(), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
            }
        });
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = match result {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(Self::process_error_response(response).await),
            Err(err) => Err(err),
        };
        response.inspect_err(|err| {
            CLIENT_REQUEST_ERRORS.click();
            log::warn!("{what} failed: {err}");
        })
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })
    }

    /// Process backend error responses and convert to our Error type.
    ///
    /// The backend reports failures as `{"detail": "..."}`; when the body
    /// has no usable detail the raw body text is used as the message.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<Value>(&error_body)
            .ok()
            .and_then(|body| match body.get("detail") {
                Some(Value::String(detail)) => Some(detail.clone()),
                Some(detail) => Some(detail.to_string()),
                None => None,
            })
            .unwrap_or(error_body);

        match status_code {
            400 => Error::bad_request(error_message),
            404 => Error::not_found(error_message, None),
            408 => Error::timeout(error_message, None),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message),
            _ => Error::api(status_code, error_message),
        }
    }

    fn log_response(&self, response: &ChatResponse) {
        if let Some(logger) = &self.logger {
            logger.log_response(response);
        }
    }
}

fn parse_base_url(base_url: &str) -> Result<Url> {
    // Url::join drops the last path segment unless the base ends in a slash.
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{base_url} cannot be a base URL"), None));
    }
    Ok(url)
}

/// Reject a conversation the backend would refuse with a 400.
fn require_user_message(messages: &[ChatMessage]) -> Result<()> {
    if messages.iter().any(|m| m.role == Role::User) {
        Ok(())
    } else {
        Err(Error::validation(
            "No user message found",
            Some("messages".to_string()),
        ))
    }
}

#[async_trait::async_trait]
impl ChatBackend for ChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        require_user_message(messages)?;
        let request = self
            .client
            .post(self.endpoint("api/chat")?)
            .headers(Self::default_headers("application/json"))
            .timeout(self.timeout)
            .json(&ChatRequest::new(messages.to_vec()));
        let response = self.execute(request, "chat request").await?;
        let response: ChatResponse = Self::parse_json(response).await?;
        self.log_response(&response);
        Ok(response)
    }

    async fn chat_stream(&self, messages: &[ChatMessage]) -> Result<EventStream> {
        require_user_message(messages)?;
        let request = self
            .client
            .post(self.endpoint("api/chat/stream")?)
            .headers(Self::default_headers("text/event-stream"))
            .json(&ChatRequest::streaming(messages.to_vec()));
        let response = self.execute(request, "streaming chat request").await?;

        let events = process_stream(response.bytes_stream());
        match self.logger.clone() {
            Some(logger) => {
                let mut text = String::new();
                Ok(Box::pin(events.inspect(move |event| {
                    let Ok(event) = event else {
                        return;
                    };
                    logger.log_stream_event(event);
                    match event {
                        StreamEvent::Chunk(fragment) => text.push_str(fragment),
                        StreamEvent::Done(_) => {
                            logger.log_stream_message(&ChatMessage::assistant(
                                std::mem::take(&mut text),
                            ));
                        }
                    }
                })))
            }
            None => Ok(Box::pin(events)),
        }
    }

    async fn production_readiness(
        &self,
        service: &str,
        messages: &[ChatMessage],
    ) -> Result<ChatResponse> {
        if service.trim().is_empty() {
            return Err(Error::validation(
                "service name must not be empty",
                Some("service".to_string()),
            ));
        }
        let request = self
            .client
            .post(self.endpoint("api/production-readiness")?)
            .headers(Self::default_headers("application/json"))
            .timeout(self.timeout)
            .json(&ProductionReadinessRequest::new(service, messages.to_vec()));
        let response = self.execute(request, "production readiness request").await?;
        let response: ChatResponse = Self::parse_json(response).await?;
        self.log_response(&response);
        Ok(response)
    }

    async fn health(&self) -> Result<HealthStatus> {
        let request = self
            .client
            .get(self.endpoint("health")?)
            .timeout(self.timeout);
        let response = self.execute(request, "health check").await?;
        Self::parse_json(response).await
    }

    async fn service_info(&self) -> Result<ServiceInfo> {
        let request = self
            .client
            .get(self.base_url.clone())
            .timeout(self.timeout);
        let response = self.execute(request, "service info request").await?;
        Self::parse_json(response).await
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let request = self
            .client
            .get(self.endpoint("api/conversations")?)
            .timeout(self.timeout);
        let response = self.execute(request, "conversation list request").await?;
        let list: ConversationList = Self::parse_json(response).await?;
        Ok(list.conversations)
    }

    async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        let request = self
            .client
            .get(self.conversation_url(id)?)
            .timeout(self.timeout);
        let response = self.execute(request, "conversation request").await?;
        Self::parse_json(response).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<String> {
        let request = self
            .client
            .delete(self.conversation_url(id)?)
            .timeout(self.timeout);
        let response = self.execute(request, "conversation delete").await?;
        let body: DeleteConversationResponse = Self::parse_json(response).await?;
        Ok(body.message)
    }
}
