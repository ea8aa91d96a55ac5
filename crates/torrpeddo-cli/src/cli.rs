//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;

use crate::client::{AppContext, CliResult, parse_url, trace_id};
use crate::commands::config::{handle_config_get, handle_config_set};
use crate::commands::transfers::{
    TransferAction, handle_add, handle_health, handle_open_folder, handle_status,
    handle_transfer_action,
};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

/// Parses CLI arguments, executes the requested command and returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command = command_label(&cli.command);
    let result = dispatch(cli).await;
    match result {
        Ok(()) => 0,
        Err(err) => {
            tracing::debug!(command, "command failed");
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let ctx = AppContext::new(cli.api_url, cli.timeout, &trace_id())?;
    match cli.command {
        Command::Status => handle_status(&ctx, cli.output).await,
        Command::Health => handle_health(&ctx, cli.output).await,
        Command::Add(args) => handle_add(&ctx, args).await,
        Command::Config(ConfigCommand::Get) => handle_config_get(&ctx, cli.output).await,
        Command::Config(ConfigCommand::Set(args)) => handle_config_set(&ctx, args).await,
        Command::Pause(args) => handle_transfer_action(&ctx, TransferAction::Pause, args).await,
        Command::Resume(args) => handle_transfer_action(&ctx, TransferAction::Resume, args).await,
        Command::Cancel(args) => handle_transfer_action(&ctx, TransferAction::Cancel, args).await,
        Command::Remove(args) => handle_transfer_action(&ctx, TransferAction::Remove, args).await,
        Command::Delete(args) => handle_transfer_action(&ctx, TransferAction::Delete, args).await,
        Command::OpenFolder(args) => handle_open_folder(&ctx, args).await,
    }
}

#[derive(Parser)]
#[command(name = "torrpeddo-cli", about = "Operator CLI for a Torrpeddo server")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "TORRPEDDO_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "TORRPEDDO_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// List every tracked transfer.
    Status,
    /// Show server liveness and counters.
    Health,
    /// Add a magnet URI or a local .torrent file.
    Add(AddArgs),
    /// Read or change the default save directory.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Pause a transfer.
    Pause(TransferArgs),
    /// Resume a transfer.
    Resume(TransferArgs),
    /// Cancel a transfer, keeping its record and data.
    Cancel(TransferArgs),
    /// Forget a transfer, keeping its data.
    Remove(TransferArgs),
    /// Forget a transfer and delete its data.
    Delete(TransferArgs),
    /// Open a transfer's folder on the server's desktop.
    OpenFolder(TransferArgs),
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommand {
    /// Print the current configuration.
    Get,
    /// Change the default save directory.
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub(crate) struct AddArgs {
    #[arg(help = "Magnet URI or path to a .torrent file")]
    pub(crate) source: String,
}

#[derive(Args)]
pub(crate) struct ConfigSetArgs {
    #[arg(long, help = "Existing directory on the server")]
    pub(crate) download_dir: PathBuf,
}

#[derive(Args)]
pub(crate) struct TransferArgs {
    #[arg(help = "Transfer identifier (40 hex characters)")]
    pub(crate) info_hash: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Status => "status",
        Command::Health => "health",
        Command::Add(_) => "add",
        Command::Config(ConfigCommand::Get) => "config_get",
        Command::Config(ConfigCommand::Set(_)) => "config_set",
        Command::Pause(_) => "pause",
        Command::Resume(_) => "resume",
        Command::Cancel(_) => "cancel",
        Command::Remove(_) => "remove",
        Command::Delete(_) => "delete",
        Command::OpenFolder(_) => "open_folder",
    }
}
