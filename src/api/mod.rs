//! Typed client for the Voice2Vision backend API.

mod client;
mod types;

pub use client::{ApiClient, DEFAULT_BASE_URL, GENERATE_TIMEOUT};
pub use types::{
    ActivityEntry, ApiResponse, DatabaseStats, FeedbackRequest, GalleryFilters, GalleryImage,
    GalleryPage, GalleryQuery, GenerateRequest, GenerationStats, ImageGeneration, LoginResponse,
    MeResponse, MemoryUsage, Pagination, ResponseStatus, SignupResponse, SystemStatus, TextResult,
    User, UserStats, VoiceResult,
};
