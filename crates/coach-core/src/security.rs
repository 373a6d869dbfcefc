//! Screening and fencing of untrusted user text before it reaches a prompt.
//!
//! The phrase check is a plain case-insensitive substring denylist. It is
//! not semantic detection and it over-matches: ordinary answers containing
//! words such as "imagine", "breakfast" or "you are" are rejected too.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const MAX_INPUT_CHARS: usize = 1200;

/// Checked in order; the first hit rejects the input. All lowercase.
const FORBIDDEN_PHRASES: &[&str] = &[
    "ignore previous instructions",
    "disregard all prior messages",
    "you are no longer",
    "forget you are",
    "bypass your restrictions",
    "break your programming",
    "act as a different ai",
    "malicious",
    "harmful",
    "illegal",
    "unethical",
    "pretend to be",
    "jailbreak",
    "pretend",
    "imagine",
    "disregard",
    "bypass",
    "override",
    "disable",
    "break",
    "you are now",
    "you are",
    "forget",
];

pub const USER_INPUT_TAG: &str = "USER_INPUT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizationResult {
    pub is_valid: bool,
    pub reason: String,
}

impl SanitizationResult {
    fn ok() -> Self {
        Self {
            is_valid: true,
            reason: String::new(),
        }
    }
}

impl From<Result<(), ValidationError>> for SanitizationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self {
                is_valid: false,
                reason: e.to_string(),
            },
        }
    }
}

pub fn check(text: &str) -> Result<(), ValidationError> {
    let actual = text.chars().count();
    if actual > MAX_INPUT_CHARS {
        return Err(ValidationError::TooLong {
            limit: MAX_INPUT_CHARS,
            actual,
        });
    }

    let lowered = text.to_lowercase();
    if let Some(phrase) = FORBIDDEN_PHRASES.iter().find(|p| lowered.contains(*p)) {
        tracing::debug!(phrase, "input rejected by denylist");
        return Err(ValidationError::ForbiddenPhrase);
    }

    Ok(())
}

pub fn validate(text: &str) -> SanitizationResult {
    check(text).into()
}

/// Fence `text` in a `<USER_INPUT>` block carrying a fresh UUID v4, so the
/// model can be told to treat the block as data and a user cannot forge
/// the closing delimiter in advance.
pub fn wrap(text: &str) -> String {
    let boundary = uuid::Uuid::new_v4();
    format!("<{USER_INPUT_TAG} id=\"{boundary}\">\n{text}\n</{USER_INPUT_TAG}>")
}
