//! HTTP client with timeout, retry and auth propagation for backend requests.

use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::session::{AuthEvents, AuthState, SessionStore};

use super::retry::{ApiError, DEFAULT_RETRIES, DEFAULT_TIMEOUT, UPLOAD_TIMEOUT, backoff_delay};

/// Per-request configuration. Built fresh for each call.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub timeout: Duration,
    pub retries: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

impl RequestConfig {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    pub fn query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }
}

/// HTTP client for the backend API.
///
/// Every request carries `Content-Type: application/json` and, when the
/// session store holds a token, `Authorization: Bearer <token>`. Failures are
/// normalized into [`ApiError`]; client errors (4xx) surface immediately,
/// everything else is retried with exponential backoff.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    auth: AuthEvents,
}

impl HttpClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        session: Arc<dyn SessionStore>,
        auth: AuthEvents,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a JSON request to a relative endpoint and deserializes the
    /// response. Transient failures are retried per the config.
    #[tracing::instrument(skip(self, config))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("{} {}...", config.method, url);

        self.with_retry(endpoint, config.retries, || self.send_json(&url, &config))
            .await
    }

    /// Sends a multipart upload with a single file part. Uses a longer default
    /// timeout than JSON requests; auth and retry behave exactly as in
    /// [`request`](Self::request).
    #[tracing::instrument(skip(self, bytes, config))]
    pub async fn request_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        field: &str,
        filename: &str,
        bytes: Vec<u8>,
        config: RequestConfig,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("POST {} (multipart, {} bytes)...", url, bytes.len());

        self.with_retry(endpoint, config.retries, || {
            self.send_multipart(&url, field, filename, &bytes, &config)
        })
        .await
    }

    /// Default config for multipart uploads.
    pub fn upload_config() -> RequestConfig {
        RequestConfig::default().timeout(UPLOAD_TIMEOUT)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> Result<T, ApiError> {
        let mut request = self
            .client
            .request(config.method.clone(), url)
            .timeout(config.timeout)
            .header(CONTENT_TYPE, "application/json");

        if !config.query.is_empty() {
            request = request.query(&config.query);
        }
        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &config.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        decode_response(response).await
    }

    async fn send_multipart<T: DeserializeOwned>(
        &self,
        url: &str,
        field: &str,
        filename: &str,
        bytes: &[u8],
        config: &RequestConfig,
    ) -> Result<T, ApiError> {
        // The form is consumed on send, so it is rebuilt on every attempt.
        let part = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part(field.to_string(), part);

        let mut request = self
            .client
            .post(url)
            .timeout(config.timeout)
            .multipart(form);

        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if let Some(token) = self.session.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        decode_response(response).await
    }

    /// Executes an operation with the retry policy: client errors (4xx) are
    /// returned immediately, everything else is re-attempted with exponential
    /// backoff until the retry budget runs out.
    async fn with_retry<T, F, Fut>(
        &self,
        operation_name: &str,
        retries: usize,
        operation: F,
    ) -> Result<T, ApiError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, ApiError>>,
    {
        let mut last_error = None;

        for attempt in 0..=retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if e.is_client_error() {
                        debug!("{}: client error, not retrying: {}", operation_name, e);
                        self.handle_unauthorized(&e);
                        return Err(e);
                    }

                    if attempt < retries {
                        let delay = backoff_delay(attempt);
                        warn!(
                            "{}: attempt {}/{} failed ({}), retrying in {:?}...",
                            operation_name,
                            attempt + 1,
                            retries + 1,
                            e,
                            delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ApiError::Decode(format!(
                "{}: failed after {} attempts",
                operation_name,
                retries + 1
            ))
        }))
    }

    /// Forced logout: when the backend rejects the stored token, clear it and
    /// tell subscribers the session ended. A 401 is a client error and is
    /// never retried, so this fires at most once per request.
    fn handle_unauthorized(&self, error: &ApiError) {
        if !error.is_unauthorized() {
            return;
        }
        if self.session.token().is_none() {
            return;
        }
        warn!("Session token rejected by backend, logging out");
        if let Err(e) = self.session.clear() {
            warn!("Failed to clear session token: {}", e);
        }
        self.auth.notify(AuthState::LoggedOut);
    }
}

/// Turns a response into the expected type, or a normalized [`ApiError`].
///
/// Non-2xx responses get their JSON error body parsed for `error`/`message`
/// and an optional `code`; a body that is not JSON falls back to the bare
/// HTTP status.
async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    if !status.is_success() {
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| body.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        let code = body
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);

        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
            code,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MockSessionStore;
    use crate::test_utils::mock_session;
    use mockito::Matcher;
    use serde_json::json;

    fn client_with_session(base_url: &str, session: Arc<dyn SessionStore>) -> HttpClient {
        HttpClient::new(Client::new(), base_url, session, AuthEvents::new())
    }

    #[tokio::test]
    async fn test_request_success() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status": "healthy", "uptime": 42}"#)
            .create_async()
            .await;

        #[derive(serde::Deserialize)]
        struct Health {
            status: String,
            uptime: u64,
        }

        let client = client_with_session(&server.url(), mock_session(None));
        let health: Health = client
            .request("/health", RequestConfig::default())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.uptime, 42);
    }

    #[tokio::test]
    async fn test_request_sends_bearer_token_when_present() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/stats")
            .match_header("authorization", "Bearer tok-123")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(Some("tok-123")));
        let _: Value = client
            .request("/stats", RequestConfig::default())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_omits_auth_header_without_token() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/health")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let _: Value = client
            .request("/health", RequestConfig::default())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_serializes_json_body() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/text")
            .match_body(Matcher::Json(json!({"text": "a red fox"})))
            .with_status(200)
            .with_body(r#"{"status": "success"}"#)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let _: Value = client
            .request("/text", RequestConfig::post(json!({"text": "a red fox"})))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_applies_query_params() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/gallery")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page".into(), "2".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let config = RequestConfig::default().query(vec![
            ("page".to_string(), "2".to_string()),
            ("limit".to_string(), "10".to_string()),
        ]);
        let _: Value = client.request("/gallery", config).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;

        // expect(1): a second attempt would fail the assertion
        let mock = server
            .mock("POST", "/generate")
            .with_status(400)
            .with_body(r#"{"error": "Prompt is required"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let result: Result<Value, ApiError> = client
            .request("/generate", RequestConfig::post(json!({})).retries(3))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Prompt is required");
    }

    #[tokio::test]
    async fn test_server_error_is_retried_until_exhaustion() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/status")
            .with_status(503)
            .with_body(r#"{"error": "backend warming up"}"#)
            .expect(3)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let result: Result<Value, ApiError> = client
            .request("/status", RequestConfig::default().retries(2))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn test_error_body_message_and_code_are_parsed() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/generate")
            .with_status(402)
            .with_body(r#"{"error": "Insufficient credits", "code": "insufficient_credits"}"#)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let result: Result<Value, ApiError> = client
            .request("/generate", RequestConfig::post(json!({"prompt": "x"})))
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(402));
        assert_eq!(err.code(), Some("insufficient_credits"));
        assert!(err.user_message().contains("upgrade your plan"));
    }

    #[tokio::test]
    async fn test_non_json_error_body_falls_back_to_http_status() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/health")
            .with_status(500)
            .with_body("<html>Internal Server Error</html>")
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let result: Result<Value, ApiError> = client
            .request("/health", RequestConfig::default().retries(0))
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500");
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/stats")
            .with_status(200)
            .with_body("not json")
            .expect(2)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let result: Result<Value, ApiError> = client
            .request("/stats", RequestConfig::default().retries(1))
            .await;

        // Decode failures count as transient and go through the retry loop.
        assert!(matches!(result.unwrap_err(), ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        // A listener that never responds: connect succeeds, then nothing.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = client_with_session(&format!("http://{}", addr), mock_session(None));
        let config = RequestConfig::default()
            .timeout(Duration::from_millis(200))
            .retries(0);
        let result: Result<Value, ApiError> = client.request("/health", config).await;

        let err = result.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token_and_notifies_once() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/me")
            .with_status(401)
            .with_body(r#"{"error": "Token has expired", "code": "token_expired"}"#)
            .create_async()
            .await;

        let mut store = MockSessionStore::new();
        store
            .expect_token()
            .returning(|| Some("stale-token".to_string()));
        store.expect_clear().times(1).returning(|| Ok(()));

        let auth = AuthEvents::new();
        let mut rx = auth.subscribe();
        let client = HttpClient::new(Client::new(), server.url(), Arc::new(store), auth);

        let result: Result<Value, ApiError> =
            client.request("/me", RequestConfig::default()).await;

        assert_eq!(result.unwrap_err().status(), Some(401));
        assert_eq!(rx.try_recv().unwrap(), AuthState::LoggedOut);
        assert!(rx.try_recv().is_err(), "expected exactly one auth event");
    }

    #[tokio::test]
    async fn test_unauthorized_without_stored_token_is_quiet() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/me")
            .with_status(401)
            .with_body(r#"{"error": "Missing Authorization header"}"#)
            .create_async()
            .await;

        let auth = AuthEvents::new();
        let mut rx = auth.subscribe();
        let client = HttpClient::new(
            Client::new(),
            server.url(),
            mock_session(None),
            auth,
        );

        let result: Result<Value, ApiError> =
            client.request("/me", RequestConfig::default()).await;

        assert_eq!(result.unwrap_err().status(), Some(401));
        assert!(rx.try_recv().is_err(), "no session ended, no event expected");
    }

    #[tokio::test]
    async fn test_multipart_upload_success() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/voice")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_header("authorization", "Bearer tok-123")
            .match_body(Matcher::Regex("voice".to_string()))
            .with_status(200)
            .with_body(r#"{"status": "success"}"#)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(Some("tok-123")));
        let _: Value = client
            .request_multipart(
                "/voice",
                "voice",
                "clip.wav",
                b"RIFFxxxx".to_vec(),
                HttpClient::upload_config(),
            )
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_multipart_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/voice")
            .with_status(402)
            .with_body(r#"{"status": "error", "message": "Insufficient credits"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_with_session(&server.url(), mock_session(None));
        let result: Result<Value, ApiError> = client
            .request_multipart(
                "/voice",
                "voice",
                "clip.wav",
                b"RIFFxxxx".to_vec(),
                HttpClient::upload_config().retries(3),
            )
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert_eq!(err.status(), Some(402));
        assert!(err.user_message().contains("upgrade your plan"));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_transient_failures() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let server = mockito::Server::new_async().await;
        let client = client_with_session(&server.url(), mock_session(None));

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = client
            .with_retry("test", 2, || {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    let count = attempts.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(ApiError::Decode("truncated body".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_client_error_stops_immediately() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let server = mockito::Server::new_async().await;
        let client = client_with_session(&server.url(), mock_session(None));

        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let start = std::time::Instant::now();
        let result = client
            .with_retry("test", 3, || {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(ApiError::Status {
                        status: 404,
                        message: "not found".to_string(),
                        code: None,
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_request_config_defaults() {
        let config = RequestConfig::default();
        assert_eq!(config.method, Method::GET);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.retries, DEFAULT_RETRIES);
        assert!(config.body.is_none());

        let upload = HttpClient::upload_config();
        assert_eq!(upload.timeout, UPLOAD_TIMEOUT);
    }
}
