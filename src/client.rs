use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, header};
use serde::Deserialize;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{Message, MessageCreateParams};

/// Default base URL; `messages` is resolved against it.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/";
/// Protocol version tag sent on every request.
pub const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Client for the Anthropic Messages API.
///
/// The API key is always supplied by the caller; the client never consults the
/// environment.  An empty key is accepted and sent as-is, leaving it to the
/// provider to reject the request.
#[derive(Clone)]
pub struct Anthropic {
    api_key: String,
    client: ReqwestClient,
    messages_url: Url,
    timeout: Option<Duration>,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Anthropic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anthropic")
            .field("messages_url", &self.messages_url.as_str())
            .field("timeout", &self.timeout)
            .field("has_logger", &self.logger.is_some())
            .finish_non_exhaustive()
    }
}

impl Anthropic {
    /// Create a client for the public API endpoint with no request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` must be an absolute URL; a missing trailing slash is added so
    /// that `messages` resolves beneath it.  `timeout` of `None` lets a request
    /// wait indefinitely.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut base = base_url.unwrap_or(DEFAULT_API_URL).trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let messages_url = Url::parse(&base)?.join("messages")?;

        let mut builder = ReqwestClient::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {e}"),
                Some(Box::new(e)),
            )
        })?;

        Ok(Self {
            api_key: api_key.into(),
            client,
            messages_url,
            timeout,
            logger: None,
        })
    }

    /// Attach a logger that observes every request and response.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The fully resolved messages endpoint.
    pub fn messages_url(&self) -> &str {
        self.messages_url.as_str()
    }

    /// The configured request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let api_key = HeaderValue::from_str(&self.api_key).map_err(|_| {
            Error::validation(
                "API key contains characters not allowed in a header",
                Some("api_key".to_string()),
            )
        })?;
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_API_VERSION),
        );
        Ok(headers)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let request_id = response
            .headers()
            .get("request-id")
            .or_else(|| response.headers().get("x-request-id"))
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<ErrorDetail>,
        }

        #[derive(Deserialize)]
        struct ErrorDetail {
            #[serde(rename = "type")]
            error_type: Option<String>,
            message: Option<String>,
            param: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {e}"),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.error);
        let error_type = detail.as_ref().and_then(|e| e.error_type.clone());
        let error_message = detail
            .as_ref()
            .and_then(|e| e.message.clone())
            .unwrap_or_else(|| error_body.clone());
        let error_param = detail.as_ref().and_then(|e| e.param.clone());

        match status_code {
            400 => Error::bad_request(error_message, error_param),
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message),
            408 => Error::timeout(error_message, None),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message, request_id),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, error_type, error_message, request_id),
        }
    }

    /// Send a message to the API and get a non-streaming response.
    ///
    /// Exactly one HTTP request is made; there are no retries.
    pub async fn send(&self, params: MessageCreateParams) -> Result<Message> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.send_once(&params).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            tracing::debug!(error = %err, "messages request failed");
        }
        result
    }

    async fn send_once(&self, params: &MessageCreateParams) -> Result<Message> {
        if let Some(logger) = &self.logger {
            logger.log_request(params);
        }
        tracing::debug!(
            model = %params.model,
            turns = params.messages.len(),
            max_tokens = params.max_tokens,
            "sending messages request"
        );

        let response = self
            .client
            .post(self.messages_url.clone())
            .headers(self.default_headers()?)
            .json(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(
                        format!("Request timed out: {e}"),
                        self.timeout.map(|t| t.as_secs_f64()),
                    )
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {e}"), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {e}"), Some(Box::new(e)))
                }
            })?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let message = response.json::<Message>().await.map_err(|e| {
            Error::serialization(format!("Failed to parse response: {e}"), Some(Box::new(e)))
        })?;
        if let Some(logger) = &self.logger {
            logger.log_response(&message);
        }
        Ok(message)
    }
}
