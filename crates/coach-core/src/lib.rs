pub mod config;
pub mod error;
pub mod gateway;
pub mod message;
pub mod model;
pub mod prompt;
pub mod registry;
pub mod security;
pub mod session;
pub mod usage;

pub use error::{ConfigError, GatewayError, ValidationError};
pub use gateway::CompletionGateway;
pub use message::{Message, MessageRole};
pub use prompt::{DifficultyLevel, Technique};
pub use registry::{SessionFactory, SessionStore, DEFAULT_STORAGE_KEY};
pub use security::SanitizationResult;
pub use session::{Session, SessionConfig, SessionState};
pub use usage::{TurnUsage, UsageTotals};

#[cfg(test)]
mod tests;
