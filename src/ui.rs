use colored::{ColoredString, Colorize};
use reconcile::ApplyResult;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Colored marker for an apply result
pub fn result_symbol(result: &ApplyResult) -> ColoredString {
    let symbol = result.symbol();
    match result {
        ApplyResult::NoChange => symbol.dimmed(),
        ApplyResult::Changed { .. } => symbol.green(),
        ApplyResult::Failed { .. } => symbol.red(),
        ApplyResult::Skipped { .. } => symbol.yellow(),
    }
}

/// Short human description of an apply result
pub fn result_detail(result: &ApplyResult) -> String {
    match result {
        ApplyResult::NoChange => "no change".to_string(),
        ApplyResult::Changed { action } => past_tense(action),
        ApplyResult::Failed { error } => error.clone(),
        ApplyResult::Skipped { reason } => format!("skipped ({reason})"),
    }
}

fn past_tense(action: &str) -> String {
    match action {
        "stop" => "stopped".to_string(),
        "enable" | "disable" => format!("{action}d"),
        "start" | "restart" | "reload" => format!("{action}ed"),
        other => other.to_string(),
    }
}
