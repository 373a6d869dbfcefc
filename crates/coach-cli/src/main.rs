mod noninteractive;
mod output;
mod repl;

use anyhow::Result;
use clap::Parser;
use coach_core::config::AppConfig;
use coach_core::model::ModelId;
use coach_core::registry::SessionFactory;
use coach_core::session::SessionConfig;
use coach_core::{DifficultyLevel, Technique};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "interview-coach", version, about = "Practice job interviews in the terminal")]
struct Cli {
    /// Job role, e.g. "Python Backend Engineer at Google"
    #[arg(short, long)]
    role: Option<String>,

    /// Skills to focus on, e.g. "Django, REST, SQL"
    #[arg(short, long)]
    skills: Option<String>,

    /// Difficulty level (Easy, Medium, Hard)
    #[arg(long)]
    difficulty: Option<String>,

    /// Prompt technique (Zero-shot, Few-shot, Chain-of-Thought, Dynamic, Least-to-Most)
    #[arg(short, long)]
    technique: Option<String>,

    /// Sampling temperature, 0.0 to 2.0
    #[arg(long, value_parser = parse_temperature)]
    temperature: Option<f32>,

    /// Model to use (overrides config)
    #[arg(short, long)]
    model: Option<String>,

    /// Working directory (where interview-coach.json is looked up)
    #[arg(short = 'c', long = "cwd")]
    working_dir: Option<PathBuf>,

    /// Non-interactive mode: send one message and print the reply
    #[arg(short, long)]
    prompt: Option<String>,

    /// Output format for non-interactive mode
    #[arg(short = 'f', long, default_value = "text")]
    output_format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

fn parse_temperature(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (0.0..=2.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is outside 0.0..=2.0"))
    }
}

pub struct App {
    pub factory: SessionFactory,
    pub config: AppConfig,
    pub settings: SessionConfig,
    pub temperature: f32,
}

impl App {
    pub fn model_name(&self) -> &str {
        &self.config.model.0
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = coach_core::config::load_config(cli.working_dir.clone())
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let filter = if cli.debug || config.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(model) = cli.model {
        config.model = ModelId(model);
    }
    if let Some(temperature) = cli.temperature {
        config.temperature = temperature;
    }
    config.validate().map_err(|e| anyhow::anyhow!("{e}"))?;

    let settings = apply_overrides(
        config.interview_settings(),
        cli.role,
        cli.skills,
        cli.difficulty.as_deref(),
        cli.technique.as_deref(),
    );

    let gateway =
        coach_providers::create_gateway(&config, None).map_err(|e| anyhow::anyhow!("{e}"))?;

    let app = App {
        factory: SessionFactory::new(gateway),
        temperature: config.temperature,
        config,
        settings,
    };

    match cli.prompt {
        Some(prompt) => noninteractive::run(app, prompt, cli.output_format).await,
        None => repl::run(app).await,
    }
}

fn apply_overrides(
    mut settings: SessionConfig,
    role: Option<String>,
    skills: Option<String>,
    difficulty: Option<&str>,
    technique: Option<&str>,
) -> SessionConfig {
    if let Some(role) = role {
        settings.job_role = role;
    }
    if let Some(skills) = skills {
        settings.skills = skills;
    }
    if let Some(difficulty) = difficulty {
        settings.difficulty = DifficultyLevel::from_name(difficulty);
    }
    if let Some(technique) = technique {
        settings.technique = Technique::from_name(technique);
    }
    settings
}
