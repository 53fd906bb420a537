pub mod commands;

use clap::{Parser, Subcommand};
use commands::{CommandResult, EXIT_CONFIG};
use polyglot_core::config::load_dotenv;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "polyglot",
    about = "Polyglot operator CLI",
    long_about = "Inspect polyglot configuration, check Slack and DeepL readiness, list supported languages, and run one-off translations.",
    after_help = "Examples:\n  polyglot doctor --json\n  polyglot config\n  polyglot languages\n  polyglot translate --to ja \"Good morning\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token readiness, DeepL key and runner languages")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List supported languages with their reactions and flag countries")]
    Languages {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Translate a piece of text once through DeepL")]
    Translate {
        #[arg(long, short = 't', help = "Target language code, e.g. `ja`")]
        to: String,
        #[arg(required = true, num_args = 1.., help = "Text to translate")]
        text: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = load_dotenv(None) {
        let result = CommandResult::failure("startup", "dotenv", error.to_string(), EXIT_CONFIG);
        println!("{}", result.output);
        return ExitCode::from(result.exit_code);
    }

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Languages { json } => commands::languages::run(json),
        Command::Translate { to, text } => commands::translate::run(&to, &text.join(" ")),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
