//! Wire types for the backend API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::ApiError;

/// Outcome tag carried by every backend envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Uniform response envelope: `{status, message?, data?, error?}`.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwraps the payload of a success envelope; error envelopes (and success
    /// envelopes missing their payload) become an [`ApiError`].
    pub fn into_data(self) -> Result<T, ApiError> {
        match (self.status, self.data) {
            (ResponseStatus::Success, Some(data)) => Ok(data),
            (status, _) => {
                let fallback = match status {
                    ResponseStatus::Success => "Response is missing its payload",
                    ResponseStatus::Error => "Request failed",
                };
                Err(ApiError::Status {
                    status: 500,
                    message: self
                        .error
                        .or(self.message)
                        .unwrap_or_else(|| fallback.to_string()),
                    code: None,
                })
            }
        }
    }
}

/// Result of `/text`: source text translated into an English prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct TextResult {
    pub original_text: String,
    pub translation: String,
    pub source_language: String,
    pub target_language: String,
}

/// Result of `/voice`: transcription plus translation of an uploaded clip.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceResult {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub transcription: String,
    pub translation: String,
    pub language: String,
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// Result of `/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageGeneration {
    pub filename: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub generation_time: Option<f64>,
    #[serde(default)]
    pub style_used: Option<String>,
    #[serde(default)]
    pub credits_remaining: Option<i64>,
}

/// Body of `POST /generate`. Field names follow the backend contract.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(rename = "negativePrompt", skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(rename = "artStyle")]
    pub art_style: String,
    pub quality: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryImage {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    pub art_style: String,
    pub quality: String,
    pub created_at: String,
    #[serde(default)]
    pub generation_time: Option<f64>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GalleryFilters {
    #[serde(default)]
    pub art_style: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

/// One page of the user's gallery.
#[derive(Debug, Clone, Deserialize)]
pub struct GalleryPage {
    pub images: Vec<GalleryImage>,
    pub pagination: Pagination,
    #[serde(default)]
    pub filters: Option<GalleryFilters>,
}

/// Query for `GET /gallery`. Unset fields are omitted from the query string.
#[derive(Debug, Clone, Default)]
pub struct GalleryQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub art_style: Option<String>,
    pub quality: Option<String>,
    pub search: Option<String>,
}

impl GalleryQuery {
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(art_style) = &self.art_style {
            params.push(("art_style".to_string(), art_style.clone()));
        }
        if let Some(quality) = &self.quality {
            params.push(("quality".to_string(), quality.clone()));
        }
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        params
    }
}

/// Body of `POST /feedback`.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackRequest {
    pub rating: u8,
    pub feedback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivityEntry {
    pub created_at: String,
    pub art_style: String,
}

/// Result of `GET /stats`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserStats {
    pub total_images: u64,
    pub total_feedback: u64,
    pub credits: i64,
    pub plan: String,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationStats {
    pub total_generations: u64,
    pub successful_generations: u64,
    pub failed_generations: u64,
    pub average_generation_time: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryUsage {
    pub cpu_memory_mb: f64,
    #[serde(default)]
    pub gpu_memory_mb: Option<f64>,
    #[serde(default)]
    pub gpu_memory_allocated_mb: Option<f64>,
    #[serde(default)]
    pub gpu_memory_reserved_mb: Option<f64>,
    pub models_loaded: u32,
    #[serde(default)]
    pub generation_stats: Option<GenerationStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseStats {
    pub users: u64,
    pub images: u64,
    pub feedback: u64,
}

/// Result of `GET /system/status`. Served at the top level, not enveloped.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub memory_usage: Option<MemoryUsage>,
    #[serde(default)]
    pub database_stats: Option<DatabaseStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub username: String,
    pub plan: String,
    pub credits: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
    #[serde(default)]
    pub profile: Option<Value>,
}

/// Response of `POST /login`: token and user at the top level of the envelope.
#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub access_token: String,
    pub user: User,
}

/// Response of `POST /signup` (no token is issued on signup).
#[derive(Debug, Deserialize)]
pub struct SignupResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub user: User,
}

/// Response of `GET /me`.
#[derive(Debug, Deserialize)]
pub struct MeResponse {
    pub status: ResponseStatus,
    pub user: User,
}
