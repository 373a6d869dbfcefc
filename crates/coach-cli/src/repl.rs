use anyhow::Result;
use coach_core::registry::DEFAULT_STORAGE_KEY;
use coach_core::security;
use coach_core::session::{Session, SessionConfig};
use coach_core::usage::{TurnUsage, UsageTotals};
use coach_core::{DifficultyLevel, Technique};
use std::collections::HashMap;
use std::io::{self, Write};

use super::output;

#[derive(Debug, PartialEq)]
enum Command {
    Help,
    Exit,
    Settings,
    Role(String),
    Skills(String),
    Difficulty(DifficultyLevel),
    Technique(Technique),
    Temperature(f32),
    Reset,
    Cost,
    UsageReset,
    Unknown(String),
}

fn parse_command(input: &str) -> Command {
    let (name, arg) = match input.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (input, ""),
    };

    match name {
        "/help" | "/h" => Command::Help,
        "/exit" | "/quit" | "/q" => Command::Exit,
        "/settings" => Command::Settings,
        "/role" => Command::Role(arg.to_string()),
        "/skills" => Command::Skills(arg.to_string()),
        "/difficulty" => Command::Difficulty(DifficultyLevel::from_name(arg)),
        "/technique" => Command::Technique(Technique::from_name(arg)),
        "/temperature" => match arg.parse::<f32>() {
            Ok(t) if (0.0..=2.0).contains(&t) => Command::Temperature(t),
            _ => Command::Unknown(input.to_string()),
        },
        "/reset" => Command::Reset,
        "/cost" => Command::Cost,
        "/usage-reset" => Command::UsageReset,
        _ => Command::Unknown(input.to_string()),
    }
}

/// Conversation state for one terminal user.
///
/// Settings edits go to `pending` and only reach the interviewer after
/// `/reset`, since the stored session keeps the settings it was built with.
struct Chat {
    store: HashMap<String, Option<Session>>,
    active: SessionConfig,
    pending: SessionConfig,
    temperature: f32,
    totals: UsageTotals,
}

impl Chat {
    fn new(settings: SessionConfig, temperature: f32) -> Self {
        Self {
            store: HashMap::new(),
            active: settings.clone(),
            pending: settings,
            temperature,
            totals: UsageTotals::new(),
        }
    }

    fn settings_changed(&self) -> bool {
        self.pending != self.active
    }
}

pub async fn run(app: super::App) -> Result<()> {
    println!("\x1b[1minterview-coach\x1b[0m v{}", env!("CARGO_PKG_VERSION"));
    println!("Model: \x1b[36m{}\x1b[0m", app.model_name());
    println!("Type \x1b[33m/help\x1b[0m for commands, \x1b[33mCtrl-D\x1b[0m to exit.\n");
    output::print_settings(&app.settings, app.temperature, app.model_name());
    println!();
    output::print_reply(output::GREETING);

    let mut chat = Chat::new(app.settings.clone(), app.temperature);

    loop {
        eprint!("\x1b[32;1myou>\x1b[0m ");
        io::stderr().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!("\nGoodbye!");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        }

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            if !handle_command(parse_command(input), &app, &mut chat) {
                break;
            }
            continue;
        }

        send(&app, &mut chat, input).await;
    }

    Ok(())
}

async fn send(app: &super::App, chat: &mut Chat, input: &str) {
    let check = security::validate(input);
    if !check.is_valid {
        output::print_validation_error(&check.reason);
        return;
    }
    let wrapped = security::wrap(input);

    let result = app
        .factory
        .answer_turn(
            &mut chat.store,
            DEFAULT_STORAGE_KEY,
            chat.active.clone(),
            &wrapped,
            chat.temperature,
        )
        .await;

    match result {
        Ok(reply) => {
            output::print_reply(&reply);
            let usage = TurnUsage::measure(&wrapped, &reply, app.model_name());
            chat.totals.record_turn(&usage);
            output::print_turn_usage(&usage, &chat.totals);
        }
        Err(e) => {
            tracing::debug!("turn failed; unanswered user message stays in the transcript");
            output::print_error(&e);
        }
    }
}

/// Returns false when the REPL should exit.
fn handle_command(command: Command, app: &super::App, chat: &mut Chat) -> bool {
    match command {
        Command::Help => {
            println!("\x1b[1mCommands:\x1b[0m");
            println!("  /settings          Show current and pending settings");
            println!("  /role <text>       Set the job role");
            println!("  /skills <text>     Set the skills to focus on");
            println!("  /difficulty <lvl>  Easy, Medium or Hard");
            println!("  /technique <name>  Zero-shot, Few-shot, Chain-of-Thought, Dynamic, Least-to-Most");
            println!("  /temperature <t>   Sampling temperature, 0.0 to 2.0");
            println!("  /reset             Apply settings and start a new interview");
            println!("  /cost              Show token usage & cost");
            println!("  /usage-reset       Zero the usage counters");
            println!("  /exit              Exit");
        }
        Command::Exit => {
            println!("Goodbye!");
            return false;
        }
        Command::Settings => {
            output::print_settings(&chat.active, chat.temperature, app.model_name());
            if chat.settings_changed() {
                println!("\x1b[33mPending (applied on /reset):\x1b[0m");
                output::print_settings(&chat.pending, chat.temperature, app.model_name());
            }
        }
        Command::Role(role) => chat.pending.job_role = role,
        Command::Skills(skills) => chat.pending.skills = skills,
        Command::Difficulty(level) => chat.pending.difficulty = level,
        Command::Technique(technique) => chat.pending.technique = technique,
        Command::Temperature(t) => {
            chat.temperature = t;
            println!("Temperature set to {t:.1}");
        }
        Command::Reset => {
            chat.active = chat.pending.clone();
            app.factory.reset(&mut chat.store, DEFAULT_STORAGE_KEY);
            println!("Interview reset.\n");
            output::print_reply(output::GREETING);
        }
        Command::Cost => println!("{}", chat.totals),
        Command::UsageReset => {
            chat.totals.reset();
            println!("Usage counters reset.");
        }
        Command::Unknown(input) => {
            eprintln!("Unknown command: {input}. Type /help for available commands.");
        }
    }

    if chat.settings_changed() {
        eprintln!("\x1b[33mSettings changed! Type /reset to apply.\x1b[0m");
    }
    true
}
