pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use cursus_core::config::{AppConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "cursus",
    about = "Cursus operator CLI",
    long_about = "Operate the cursus registration agent: migrations, demo data, \
                  readiness checks, and one-shot conversational requests.",
    after_help = "Examples:\n  cursus migrate\n  cursus seed\n  cursus doctor --json\n  cursus ask \"inscris-moi à INF1062 pour Automne 2025\" --code-permanent TREJ12345678"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo-university dataset")]
    Seed,
    #[command(about = "Validate config, database connectivity, and NLU endpoint reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one student message through the full agent pipeline")]
    Ask {
        #[arg(help = "The student's message, in natural language")]
        message: String,
        #[arg(long, help = "Permanent code identifying the student")]
        code_permanent: Option<String>,
    },
}

pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        LogFormat::Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Ask { message, code_permanent } => {
            commands::ask::run(&message, code_permanent.as_deref())
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
