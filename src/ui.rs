//! Terminal output
//!
//! Stdout carries the final result only; progress, warnings and errors go
//! to stderr so `--output json` stays parseable.

use colored::Colorize;

/// Print the final line of a successful run
pub fn outcome(changed: bool, msg: &str) {
    if changed {
        println!("{} {}", "✓".green(), msg);
    } else {
        println!("{} {}", "=".dimmed(), msg);
    }
}

/// Print the action planned for a resource and its steps
pub fn plan(id: &str, action: &str, steps: &[String]) {
    eprintln!("{} {} {}", "→".blue(), id.bold(), action.cyan());
    for step in steps {
        eprintln!("    {}", step.dimmed());
    }
}

/// Print a finished step
pub fn step_done(step: &str) {
    eprintln!("  {} {}", "✓".green(), step);
}

pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
