use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::gateway::CompletionGateway;
use crate::message::{Message, MessageRole};
use crate::prompt::{self, DifficultyLevel, Technique};

/// Settings an interviewer is built from. Two equal configs produce the
/// same system prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionConfig {
    pub job_role: String,
    pub skills: String,
    pub difficulty: DifficultyLevel,
    pub technique: Technique,
}

impl SessionConfig {
    pub fn new(
        job_role: impl Into<String>,
        skills: impl Into<String>,
        difficulty: DifficultyLevel,
        technique: Technique,
    ) -> Self {
        Self {
            job_role: job_role.into(),
            skills: skills.into(),
            difficulty,
            technique,
        }
    }

    pub fn from_names(job_role: &str, skills: &str, difficulty: &str, technique: &str) -> Self {
        Self::new(
            job_role,
            skills,
            DifficultyLevel::from_name(difficulty),
            Technique::from_name(technique),
        )
    }
}

impl fmt::Display for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "role='{}' skills='{}' difficulty={} technique={}",
            self.job_role, self.skills, self.difficulty, self.technique
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Only the system message so far.
    Fresh,
    /// At least one user message has been sent.
    Active,
}

/// One interviewer persona and its conversation.
///
/// The transcript starts with the system prompt and only ever grows.
pub struct Session {
    id: String,
    config: SessionConfig,
    transcript: Vec<Message>,
    gateway: Arc<dyn CompletionGateway>,
}

impl Session {
    pub fn new(config: SessionConfig, gateway: Arc<dyn CompletionGateway>) -> Self {
        let system_prompt = prompt::build_system_prompt(&config);
        let id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(session = %id, %config, "creating interviewer");
        Self {
            id,
            config,
            transcript: vec![Message::system(system_prompt)],
            gateway,
        }
    }

    /// Run one exchange: record `user_text`, send the whole transcript,
    /// record and return the reply.
    ///
    /// If the gateway fails the user message stays in the transcript and no
    /// assistant message is added.
    pub async fn turn(
        &mut self,
        user_text: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        self.transcript.push(Message::user(user_text.to_string()));

        let reply = match self.gateway.complete(&self.transcript, temperature).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session = %self.id, "completion failed: {e}");
                return Err(e);
            }
        };

        self.transcript.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn system_prompt(&self) -> &str {
        &self.transcript[0].content
    }

    pub fn state(&self) -> SessionState {
        if self.transcript.len() > 1 {
            SessionState::Active
        } else {
            SessionState::Fresh
        }
    }

    /// Completed exchanges (user message answered by an assistant message).
    pub fn turns(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .count()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("messages", &self.transcript.len())
            .field("model", self.gateway.model())
            .finish()
    }
}
