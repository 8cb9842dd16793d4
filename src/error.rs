use thiserror::Error;

/// Failures while fetching or shaping forum data.
///
/// None of these ever reach rendered output: the render entry points log
/// them and return an empty fragment instead.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("forum is not configured: {0}")]
    Configuration(String),

    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("failed to parse response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no {0} matched the requested filters")]
    EmptyResult(&'static str),
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 200;

impl EmbedError {
    pub(crate) fn network(url: &str, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn from_status(url: &str, status: reqwest::StatusCode, body: &str) -> Self {
        let body = if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut = (0..=MAX_ERROR_BODY_LENGTH)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}... (truncated, {} total bytes)", &body[..cut], body.len())
        };
        Self::network(url, format!("status {status}: {body}"))
    }
}

pub type Result<T, E = EmbedError> = std::result::Result<T, E>;
