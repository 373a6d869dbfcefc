use coach_core::session::SessionConfig;
use coach_core::usage::{format_cost, TurnUsage, UsageTotals};

pub const GREETING: &str = "Hi, I am your interviewer. Ready to go?";

pub fn print_reply(reply: &str) {
    println!("\x1b[36;1minterviewer>\x1b[0m {reply}\n");
}

pub fn print_turn_usage(turn: &TurnUsage, totals: &UsageTotals) {
    eprintln!(
        "\x1b[90m[{} in / {} out, {} | total {}]\x1b[0m",
        turn.input_tokens,
        turn.output_tokens,
        format_cost(turn.cost),
        format_cost(totals.total_cost)
    );
}

pub fn print_settings(settings: &SessionConfig, temperature: f32, model: &str) {
    let or_unset = |s: &str| if s.is_empty() { "(not set)".to_string() } else { s.to_string() };
    println!("  Role:        {}", or_unset(&settings.job_role));
    println!("  Skills:      {}", or_unset(&settings.skills));
    println!("  Difficulty:  {}", settings.difficulty);
    println!("  Technique:   {}", settings.technique);
    println!("  Temperature: {temperature:.1}");
    println!("  Model:       {model}");
}

pub fn print_validation_error(reason: &str) {
    eprintln!("\x1b[31mInput validation error: {reason}\x1b[0m");
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("\x1b[31mError: {err}\x1b[0m");
}
