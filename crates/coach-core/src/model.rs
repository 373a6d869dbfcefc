use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Model used for pricing when the configured model has no price entry.
pub const DEFAULT_PRICED_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        ModelId(s.to_string())
    }
}

/// Rates in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub cost_per_1m_input: f64,
    pub cost_per_1m_output: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub display_name: String,
    pub pricing: ModelPricing,
}

impl Model {
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.pricing.cost_per_1m_input;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.pricing.cost_per_1m_output;
        input_cost + output_cost
    }
}

fn priced(id: &str, display_name: &str, input: f64, output: f64) -> Model {
    Model {
        id: ModelId(id.into()),
        display_name: display_name.into(),
        pricing: ModelPricing {
            cost_per_1m_input: input,
            cost_per_1m_output: output,
        },
    }
}

/// Price table (OpenAI list prices, December 2024)
pub fn builtin_models() -> HashMap<ModelId, Model> {
    [
        priced("gpt-4o-mini", "GPT-4o mini", 0.150, 0.600),
        priced("gpt-4o", "GPT-4o", 2.50, 10.00),
        priced("gpt-4-turbo", "GPT-4 Turbo", 10.00, 30.00),
        priced("gpt-4", "GPT-4", 30.00, 60.00),
    ]
    .into_iter()
    .map(|m| (m.id.clone(), m))
    .collect()
}

pub fn get_model(id: &ModelId) -> Option<Model> {
    builtin_models().remove(id)
}

pub fn get_default_model() -> Model {
    priced(DEFAULT_PRICED_MODEL, "GPT-4o mini", 0.150, 0.600)
}

/// Look up a model for pricing, substituting the default entry for
/// anything not in the table.
pub fn model_or_default(id: &str) -> Model {
    match get_model(&ModelId(id.to_string())) {
        Some(model) => model,
        None => {
            tracing::debug!(model = id, "no price entry, using {DEFAULT_PRICED_MODEL} rates");
            get_default_model()
        }
    }
}
