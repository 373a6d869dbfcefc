use anyhow::Result;
use coach_core::registry::DEFAULT_STORAGE_KEY;
use coach_core::security;
use coach_core::session::Session;
use coach_core::usage::TurnUsage;
use std::collections::HashMap;

pub async fn run(
    app: super::App,
    prompt: String,
    output_format: super::OutputFormat,
) -> Result<()> {
    let check = security::validate(&prompt);
    if !check.is_valid {
        anyhow::bail!("Input validation error: {}", check.reason);
    }
    let wrapped = security::wrap(&prompt);

    let mut store: HashMap<String, Option<Session>> = HashMap::new();
    let reply = app
        .factory
        .answer_turn(
            &mut store,
            DEFAULT_STORAGE_KEY,
            app.settings.clone(),
            &wrapped,
            app.temperature,
        )
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let usage = TurnUsage::measure(&wrapped, &reply, app.model_name());

    match output_format {
        super::OutputFormat::Text => {
            println!("{reply}");
        }
        super::OutputFormat::Json => {
            let output = serde_json::json!({
                "content": reply,
                "usage": {
                    "input_tokens": usage.input_tokens,
                    "output_tokens": usage.output_tokens,
                    "cost": usage.cost,
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
