mod openai;

pub use openai::OpenAiGateway;

use coach_core::config::AppConfig;
use coach_core::error::GatewayError;
use coach_core::gateway::CompletionGateway;
use coach_core::model::ModelId;
use std::sync::Arc;
use std::time::Duration;

/// Create the gateway described by `config`, optionally for a different
/// model than the configured one.
pub fn create_gateway(
    config: &AppConfig,
    model_id: Option<&ModelId>,
) -> Result<Arc<dyn CompletionGateway>, GatewayError> {
    let model = model_id.cloned().unwrap_or_else(|| config.model.clone());

    let api_key = config.get_api_key().ok_or_else(|| {
        GatewayError::MissingApiKey(
            "OPENAI_API_KEY not set. Set via env var or config file.".into(),
        )
    })?;

    Ok(Arc::new(OpenAiGateway::new(
        api_key.to_string(),
        model,
        config.base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )))
}
