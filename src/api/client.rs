//! One thin wrapper per backend capability, all funneling through the
//! resilient request core.

use anyhow::Result;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use crate::http::{ApiError, HttpClient, RequestConfig};
use crate::session::{AuthEvents, AuthState, SessionStore};

use super::types::{
    ApiResponse, FeedbackRequest, GalleryPage, GalleryQuery, GenerateRequest, ImageGeneration,
    LoginResponse, MeResponse, ResponseStatus, SignupResponse, SystemStatus, TextResult, User,
    UserStats, VoiceResult,
};

/// Default backend location for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Image generation is slow; give it five minutes.
pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Client for the Voice2Vision backend.
///
/// Holds the shared HTTP core, the session store it reads the token from, and
/// the auth observable that login/logout (voluntary or forced) publish to.
pub struct ApiClient {
    http: HttpClient,
    session: Arc<dyn SessionStore>,
    auth: AuthEvents,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<dyn SessionStore>) -> Result<Self> {
        let client = Client::builder().user_agent("v2v-cli").build()?;
        Ok(Self::with_client(client, base_url, session))
    }

    /// Create from an existing reqwest Client.
    pub fn with_client(client: Client, base_url: &str, session: Arc<dyn SessionStore>) -> Self {
        let auth = AuthEvents::new();
        let http = HttpClient::new(client, base_url, Arc::clone(&session), auth.clone());
        Self {
            http,
            session,
            auth,
        }
    }

    /// The auth observable. Subscribe to react to login/logout, including
    /// forced logout when the backend rejects the stored token.
    pub fn auth_events(&self) -> &AuthEvents {
        &self.auth
    }

    /// GET `/health`. No auth required.
    #[tracing::instrument(skip(self))]
    pub async fn health(&self) -> Result<Value, ApiError> {
        self.http.request("/health", RequestConfig::get()).await
    }

    /// POST `/text`: translate free text into an English image prompt.
    #[tracing::instrument(skip(self, text))]
    pub async fn process_text(&self, text: &str) -> Result<TextResult, ApiError> {
        let response: ApiResponse<TextResult> = self
            .http
            .request("/text", RequestConfig::post(json!({ "text": text })))
            .await?;
        response.into_data()
    }

    /// POST `/voice`: upload a recording for transcription and translation.
    #[tracing::instrument(skip(self, bytes))]
    pub async fn process_voice(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<VoiceResult, ApiError> {
        let response: ApiResponse<VoiceResult> = self
            .http
            .request_multipart("/voice", "voice", filename, bytes, HttpClient::upload_config())
            .await?;
        response.into_data()
    }

    /// POST `/generate`: create an image from a prompt.
    #[tracing::instrument(skip(self, request))]
    pub async fn generate_image(
        &self,
        request: &GenerateRequest,
    ) -> Result<ImageGeneration, ApiError> {
        let body = encode_body(request)?;
        let response: ApiResponse<ImageGeneration> = self
            .http
            .request(
                "/generate",
                RequestConfig::post(body).timeout(GENERATE_TIMEOUT),
            )
            .await?;
        response.into_data()
    }

    /// GET `/gallery`: one page of the user's generated images.
    #[tracing::instrument(skip(self, query))]
    pub async fn gallery(&self, query: &GalleryQuery) -> Result<GalleryPage, ApiError> {
        let config = RequestConfig::get().query(query.to_query_params());
        let response: ApiResponse<GalleryPage> = self.http.request("/gallery", config).await?;
        response.into_data()
    }

    /// POST `/feedback`. Returns the backend's confirmation message.
    #[tracing::instrument(skip(self, request))]
    pub async fn submit_feedback(&self, request: &FeedbackRequest) -> Result<String, ApiError> {
        let body = encode_body(request)?;
        let response: ApiResponse<Value> = self
            .http
            .request("/feedback", RequestConfig::post(body))
            .await?;

        match response.status {
            ResponseStatus::Success => Ok(response
                .message
                .unwrap_or_else(|| "Feedback submitted successfully".to_string())),
            ResponseStatus::Error => Err(ApiError::Status {
                status: 500,
                message: response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "Failed to submit feedback".to_string()),
                code: None,
            }),
        }
    }

    /// GET `/stats`: the current user's usage statistics. Auth required.
    #[tracing::instrument(skip(self))]
    pub async fn user_stats(&self) -> Result<UserStats, ApiError> {
        let response: ApiResponse<UserStats> =
            self.http.request("/stats", RequestConfig::get()).await?;
        response.into_data()
    }

    /// GET `/system/status`: backend health and resource usage.
    #[tracing::instrument(skip(self))]
    pub async fn system_status(&self) -> Result<SystemStatus, ApiError> {
        self.http.request("/system/status", RequestConfig::get()).await
    }

    /// POST `/login`. On success the returned token is persisted and a
    /// logged-in notification is published.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let body = json!({ "username": username, "password": password });
        let response: LoginResponse = self
            .http
            .request("/login", RequestConfig::post(body))
            .await?;

        self.session
            .store(&response.access_token)
            .map_err(|e| ApiError::Session(e.to_string()))?;
        self.auth.notify(AuthState::LoggedIn);
        debug!("Logged in as {}", response.user.username);

        Ok(response.user)
    }

    /// POST `/signup`. No token is issued; follow up with [`login`](Self::login).
    #[tracing::instrument(skip(self, password))]
    pub async fn signup(&self, username: &str, password: &str, plan: &str) -> Result<User, ApiError> {
        let body = json!({ "username": username, "password": password, "plan": plan });
        let response: SignupResponse = self
            .http
            .request("/signup", RequestConfig::post(body))
            .await?;
        Ok(response.user)
    }

    /// GET `/me`: the currently authenticated user. Auth required.
    #[tracing::instrument(skip(self))]
    pub async fn me(&self) -> Result<User, ApiError> {
        let response: MeResponse = self.http.request("/me", RequestConfig::get()).await?;
        Ok(response.user)
    }

    /// Clears the stored token and publishes a logged-out notification.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session
            .clear()
            .map_err(|e| ApiError::Session(e.to_string()))?;
        self.auth.notify(AuthState::LoggedOut);
        Ok(())
    }
}

fn encode_body<T: serde::Serialize>(request: &T) -> Result<Value, ApiError> {
    serde_json::to_value(request).map_err(|e| ApiError::Decode(e.to_string()))
}
