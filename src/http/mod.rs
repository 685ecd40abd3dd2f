//! HTTP layer: resilient request core with retry logic and error normalization.

mod client;
mod retry;

pub use client::{HttpClient, RequestConfig};
pub use retry::{ApiError, DEFAULT_RETRIES, DEFAULT_TIMEOUT, UPLOAD_TIMEOUT, backoff_delay};
