use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::model::ModelId;
use crate::prompt::{DifficultyLevel, Technique};
use crate::session::SessionConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const CONFIG_DIR_NAME: &str = "interview-coach";
const CONFIG_FILE_NAME: &str = "config.json";
const LOCAL_CONFIG_FILE: &str = "interview-coach.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API (without `/v1`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: ModelId,

    /// Sampling temperature, 0.0 to 2.0
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Settings the first interviewer is created with
    #[serde(default)]
    pub interview: InterviewConfig,

    #[serde(default)]
    pub debug: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_model() -> ModelId {
    ModelId("gpt-4.1-mini".into())
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_interview() -> SessionConfig {
    SessionConfig::new("", "", DifficultyLevel::Medium, Technique::ZeroShot)
}

/// Interview settings as written in a config file.
///
/// Every field is optional so a file can set just one of them; unset
/// fields fall through to the previous layer and finally to
/// `default_interview()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<DifficultyLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<Technique>,
}

impl InterviewConfig {
    fn merge(&mut self, overlay: InterviewConfig) {
        if overlay.job_role.is_some() {
            self.job_role = overlay.job_role;
        }
        if overlay.skills.is_some() {
            self.skills = overlay.skills;
        }
        if overlay.difficulty.is_some() {
            self.difficulty = overlay.difficulty;
        }
        if overlay.technique.is_some() {
            self.technique = overlay.technique;
        }
    }

    /// Fill unset fields from the defaults.
    pub fn resolve(&self) -> SessionConfig {
        let defaults = default_interview();
        SessionConfig::new(
            self.job_role.clone().unwrap_or(defaults.job_role),
            self.skills.clone().unwrap_or(defaults.skills),
            self.difficulty.unwrap_or(defaults.difficulty),
            self.technique.unwrap_or(defaults.technique),
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout_secs(),
            interview: InterviewConfig::default(),
            debug: false,
        }
    }
}

/// Load config: defaults, then the global file, then `interview-coach.json`
/// in the working directory, then environment variables.
pub fn load_config(working_dir: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    let wd = working_dir.unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    let mut config = AppConfig::default();

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
        if global_path.exists() {
            merge_config(&mut config, read_config_file(&global_path)?);
        }
    }

    let local_path = wd.join(LOCAL_CONFIG_FILE);
    if local_path.exists() {
        merge_config(&mut config, read_config_file(&local_path)?);
    }

    apply_env(&mut config, |name| std::env::var(name).ok());

    tracing::info!(model = %config.model, base_url = %config.base_url, "config loaded");
    Ok(config)
}

pub fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::File(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&content)
        .map_err(|e| ConfigError::Invalid(format!("{}: {e}", path.display())))
}

fn merge_config(base: &mut AppConfig, overlay: AppConfig) {
    if overlay.api_key.is_some() {
        base.api_key = overlay.api_key;
    }
    if overlay.base_url != default_base_url() {
        base.base_url = overlay.base_url;
    }
    if overlay.model != default_model() {
        base.model = overlay.model;
    }
    if overlay.temperature != default_temperature() {
        base.temperature = overlay.temperature;
    }
    if overlay.request_timeout_secs != default_request_timeout_secs() {
        base.request_timeout_secs = overlay.request_timeout_secs;
    }
    base.interview.merge(overlay.interview);
    if overlay.debug {
        base.debug = true;
    }
}

fn apply_env(config: &mut AppConfig, var: impl Fn(&str) -> Option<String>) {
    let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

    if config.api_key.is_none() {
        config.api_key = ["OPENAI_API_KEY", "COACH_API_KEY"]
            .iter()
            .find_map(|name| non_empty(*name));
    }
    if let Some(url) = non_empty("OPENAI_BASE_URL") {
        config.base_url = url;
    }
    if let Some(model) = non_empty("COACH_MODEL") {
        config.model = ModelId(model);
    }
}

impl AppConfig {
    pub fn get_api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_some()
    }

    /// Settings for the first interviewer, with defaults filled in.
    pub fn interview_settings(&self) -> SessionConfig {
        self.interview.resolve()
    }

    /// Fails when there is nothing to authenticate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.has_api_key() {
            return Err(ConfigError::MissingField(
                "api_key (set OPENAI_API_KEY or add it to interview-coach.json)".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}
