//! Integration boundary to the automated text-generation capability.
//!
//! The pipeline only ever sees the [`Responder`] trait. Three implementations
//! ship with the crate:
//!
//! - [`GeminiResponder`]: calls the Gemini `generateContent` endpoint
//! - [`CannedResponder`]: deterministic keyword-matched replies
//! - [`UnconfiguredResponder`]: always fails with `NotConfigured`, used when
//!   no credentials are present so the process can still start

pub mod canned;
pub mod gemini;
pub mod persona;

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

pub use canned::CannedResponder;
pub use gemini::GeminiResponder;
pub use persona::COMPANION_PERSONA;

/// Errors produced by a responder.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The responder has no credentials or endpoint.
    #[error("responder not configured: {0}")]
    NotConfigured(String),

    /// The network call failed before a response arrived.
    #[error("responder unreachable: {0}")]
    Unreachable(String),

    /// The remote service answered with a non-success status.
    #[error("responder rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status returned by the remote service.
        status: u16,
        /// Body or reason returned with the status.
        message: String,
    },

    /// The remote service is throttling requests.
    #[error("responder rate limited")]
    RateLimited,

    /// The remote service blocked the output on safety grounds.
    #[error("response blocked by content filter")]
    ContentFiltered,

    /// The remote service answered without any text.
    #[error("responder returned no text")]
    EmptyResponse,

    /// The call did not finish within the allotted time.
    #[error("responder timed out after {0:?}")]
    TimedOut(Duration),
}

/// Text produced by a responder, tagged with what produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Generated text.
    pub text: String,
    /// Model or strategy name recorded on the assistant message.
    pub model: String,
}

/// A text-generation capability.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Produce the assistant's reply.
    ///
    /// `history` holds prior turn contents, oldest first, and does not include
    /// `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if no reply could be produced.
    async fn generate(
        &self,
        persona: &str,
        history: &[String],
        message: &str,
    ) -> Result<Reply, ResponderError>;
}

/// Settings for the remote generative responder.
#[derive(Clone, Deserialize)]
pub struct ResponderConfig {
    /// API key. `None` leaves the responder unconfigured.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model name.
    #[serde(default = "ResponderConfig::default_model")]
    pub model: String,
    /// API base URL, without a trailing slash.
    #[serde(default = "ResponderConfig::default_base_url")]
    pub base_url: String,
    /// Sampling temperature.
    #[serde(default = "ResponderConfig::default_temperature")]
    pub temperature: f32,
    /// Top-k sampling cutoff.
    #[serde(default = "ResponderConfig::default_top_k")]
    pub top_k: u32,
    /// Nucleus sampling cutoff.
    #[serde(default = "ResponderConfig::default_top_p")]
    pub top_p: f32,
    /// Maximum tokens in a reply.
    #[serde(default = "ResponderConfig::default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// Transport-level request timeout in seconds.
    #[serde(default = "ResponderConfig::default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    /// TCP connect timeout in seconds.
    #[serde(default = "ResponderConfig::default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
}

impl ResponderConfig {
    fn default_model() -> String {
        "gemini-1.5-flash".to_string()
    }

    fn default_base_url() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_string()
    }

    const fn default_temperature() -> f32 {
        0.7
    }

    const fn default_top_k() -> u32 {
        40
    }

    const fn default_top_p() -> f32 {
        0.95
    }

    const fn default_max_output_tokens() -> u32 {
        200
    }

    const fn default_request_timeout_seconds() -> u64 {
        30
    }

    const fn default_connect_timeout_seconds() -> u64 {
        5
    }

    /// Whether an API key is present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|key| !key.is_empty())
    }
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: Self::default_model(),
            base_url: Self::default_base_url(),
            temperature: Self::default_temperature(),
            top_k: Self::default_top_k(),
            top_p: Self::default_top_p(),
            max_output_tokens: Self::default_max_output_tokens(),
            request_timeout_seconds: Self::default_request_timeout_seconds(),
            connect_timeout_seconds: Self::default_connect_timeout_seconds(),
        }
    }
}

impl std::fmt::Debug for ResponderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish_non_exhaustive()
    }
}

/// A responder that is never available.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredResponder;

#[async_trait]
impl Responder for UnconfiguredResponder {
    async fn generate(
        &self,
        _persona: &str,
        _history: &[String],
        _message: &str,
    ) -> Result<Reply, ResponderError> {
        tracing::warn!("Responder called but no generative backend is configured");
        Err(ResponderError::NotConfigured(
            "no API key configured".to_string(),
        ))
    }
}
