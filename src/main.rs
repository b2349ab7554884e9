mod cli;
mod commands;
mod config;
mod network;
mod progress;
mod resource;
mod ui;
mod units;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, OutputFormat};
use commands::Outcome;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
    pub check: bool,
    pub output: OutputFormat,
    pub config: Option<PathBuf>,
    pub api_host: Option<String>,
    pub access_token: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        quiet: cli.quiet,
        check: cli.check,
        output: cli.output,
        config: cli.config,
        api_host: cli.api_host,
        access_token: cli.access_token,
    };

    let result = match cli.command {
        Command::Volume(args) => commands::volume::run(&ctx, args),
        Command::StorageEndpoint(args) => commands::storage_endpoint::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "fusionctl", &mut io::stdout());
            return ExitCode::SUCCESS;
        }
    };

    let outcome = result.unwrap_or_else(|e| Outcome::failure(format!("{:#}", e)));
    report(&ctx, &outcome);

    if outcome.failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn report(ctx: &Context, outcome: &Outcome) {
    match ctx.output {
        OutputFormat::Json => match serde_json::to_string(outcome) {
            Ok(json) => println!("{}", json),
            Err(e) => ui::error(&format!("Could not encode result: {}", e)),
        },
        OutputFormat::Text => {
            if outcome.failed {
                ui::error(&outcome.msg);
            } else if !ctx.quiet {
                ui::outcome(outcome.changed, &outcome.msg);
            }
        }
    }
}
