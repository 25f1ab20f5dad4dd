use clap::{CommandFactory, Parser};
use datastet_cli::commands::Commands;
use datastet_cli::context::DatastetCliContext;
use datastet_cli::handlers::*;
use datastet_cli::output::output_error_json;
use datastet_cli::utils::logging_config;
use is_terminal::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "datastet-cli")]
#[command(about = "Dataset mention extraction and consolidation", long_about = None)]
#[command(version = datastet::VERSION)]
struct Cli {
    /// Configuration file (toml, yaml or json)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json) - use json for tool integration
    #[arg(long, short, default_value = "table", global = true)]
    output: String,

    /// Use machine-readable output (alias for --output json)
    #[arg(long, global = true)]
    machine: bool,

    /// Verbose output (debug level logging)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Quiet mode (suppress all logging output)
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli_args = Cli::parse();

    // priority: machine flag > env var > cli arg > default
    let output_format = if cli_args.machine {
        "json".to_string()
    } else if let Ok(env_output) = std::env::var("DATASTET_OUTPUT") {
        env_output
    } else {
        cli_args.output.clone()
    };

    let is_quiet = cli_args.quiet
        || std::env::var("DATASTET_QUIET")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

    // Machine mode keeps stderr clean for JSON consumers
    let is_quiet = is_quiet || cli_args.machine;

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli_args, &output_format, is_quiet).await {
        output_error_json(&e, &output_format);
        std::process::exit(1);
    }
}

async fn run(cli_args: Cli, output_format: &str, is_quiet: bool) -> datastet::Result<()> {
    match &cli_args.command {
        Commands::Version => {
            println!("Datastet CLI v{}", datastet::VERSION);
            return Ok(());
        }
        Commands::Completions(args) => {
            clap_complete::generate(args.shell, &mut Cli::command(), "datastet-cli", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let ctx = DatastetCliContext::new(cli_args.config.as_deref())?;
    // The guard flushes the file appender when dropped at the end of the run
    let _log_guard = datastet::logging::init(&logging_config(
        &ctx.config.logging,
        cli_args.verbose,
        is_quiet,
    ))?;

    match cli_args.command {
        Commands::Version | Commands::Completions(_) => {}
        Commands::Process(args) => handle_process_command(args, &ctx, output_format).await?,
        Commands::Status(args) => handle_status_command(args, &ctx, output_format).await?,
        Commands::Config => handle_config_command(&ctx)?,
    }
    Ok(())
}
