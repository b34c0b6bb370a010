//! Core types for SafeFetch

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Request to fetch a URL (tool input)
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FetchRequest {
    /// The URL to fetch (required, must be http:// or https://)
    pub url: String,
}

impl FetchRequest {
    /// Create a new request with the given URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Successful fetch outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FetchedPage {
    /// The requested URL
    pub url: String,

    /// URL of the final response, after redirects
    pub final_url: String,

    /// HTTP status code
    pub status_code: u16,

    /// Content-Type header value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Body size in bytes
    pub size: u64,

    /// Response body decoded as text
    pub content: String,
}
