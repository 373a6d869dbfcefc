use thiserror::Error;

/// Rejection reasons produced by the input sanitizer.
///
/// The `Display` text is what gets shown to the user, so the forbidden
/// phrase variant deliberately does not name the phrase that matched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Input too long! Max {limit} characters. You used {actual}.")]
    TooLong { limit: usize, actual: usize },

    #[error("Input contains forbidden phrases. Please revise your input.")]
    ForbiddenPhrase,
}

#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Missing API key: {0}")]
    MissingApiKey(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    File(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}
