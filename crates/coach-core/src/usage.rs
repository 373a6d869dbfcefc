//! Token counting, cost estimation and running usage totals.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use tiktoken_rs::tokenizer::{get_tokenizer, Tokenizer};
use tiktoken_rs::CoreBPE;

use crate::model;

/// Encoding used for model names tiktoken does not recognise.
const FALLBACK_TOKENIZER: Tokenizer = Tokenizer::Cl100kBase;

fn encoder_cache() -> &'static Mutex<HashMap<String, Arc<CoreBPE>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Arc<CoreBPE>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn encoder_for(model: &str) -> Option<Arc<CoreBPE>> {
    let tokenizer = get_tokenizer(model).unwrap_or_else(|| {
        tracing::debug!(model, "unknown model for tokenizer, using cl100k_base");
        FALLBACK_TOKENIZER
    });
    let key = format!("{tokenizer:?}");

    let mut cache = encoder_cache().lock().unwrap_or_else(|e| e.into_inner());
    if let Some(bpe) = cache.get(&key) {
        return Some(bpe.clone());
    }
    match tiktoken_rs::get_bpe_from_tokenizer(tokenizer) {
        Ok(bpe) => {
            let bpe = Arc::new(bpe);
            cache.insert(key, bpe.clone());
            Some(bpe)
        }
        Err(e) => {
            tracing::warn!(model, "failed to load tokenizer: {e}");
            None
        }
    }
}

/// Rough estimate (~4 chars per token), only used when no encoder loads.
fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

/// Count tokens in `text` the way `model` would tokenize it.
pub fn count_tokens(text: &str, model: &str) -> usize {
    match encoder_for(model) {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_tokens(text),
    }
}

/// Cost in USD. Models without a price entry are billed at the default
/// model's rates.
pub fn calculate_cost(input_tokens: u64, output_tokens: u64, model: &str) -> f64 {
    model::model_or_default(model).calculate_cost(input_tokens, output_tokens)
}

pub fn estimate_cost(input_tokens: u64, output_tokens: u64, model: &str) -> f64 {
    calculate_cost(input_tokens, output_tokens, model)
}

pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("${cost:.4}")
    } else {
        format!("${cost:.2}")
    }
}

/// Usage of a single completed turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: f64,
}

impl TurnUsage {
    /// Measure one exchange: `input` is the text sent for the turn,
    /// `output` the reply that came back.
    pub fn measure(input: &str, output: &str, model: &str) -> Self {
        let input_tokens = count_tokens(input, model) as u64;
        let output_tokens = count_tokens(output, model) as u64;
        Self {
            input_tokens,
            output_tokens,
            cost: calculate_cost(input_tokens, output_tokens, model),
        }
    }
}

/// Running totals, owned by whoever drives the conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub total_cost: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub turn_count: u64,
}

impl UsageTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, input_tokens: u64, output_tokens: u64, cost: f64) {
        self.total_input_tokens += input_tokens;
        self.total_output_tokens += output_tokens;
        self.total_cost += cost.max(0.0);
        self.turn_count += 1;
    }

    pub fn record_turn(&mut self, usage: &TurnUsage) {
        self.record(usage.input_tokens, usage.output_tokens, usage.cost);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for UsageTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tokens: {} in / {} out | Cost: {} | Turns: {}",
            self.total_input_tokens,
            self.total_output_tokens,
            format_cost(self.total_cost),
            self.turn_count
        )
    }
}
