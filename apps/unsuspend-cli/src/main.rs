use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use helpdesk_users::infra::ZendeskDirectory;
use helpdesk_users::reporting::ConsoleReporter;
use helpdesk_users::{Reporter, Service};
use restkit::TracedClient;
use runtime::{AppConfig, CliArgs, HelpdeskConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("unsuspend-users/", env!("CARGO_PKG_VERSION"));

/// Reinstate suspended helpdesk accounts by email address
#[derive(Parser)]
#[command(name = "unsuspend-users")]
#[command(about = "Reinstate suspended helpdesk accounts by email address")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print current configuration (token redacted) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for the outcome records
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Addresses to process (overrides NOREPLY_EMAILS and the config file)
    emails: Vec<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the configured addresses
    Run,
    /// Check configuration
    Check,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable progress on stdout
    Text,
    /// Outcome records as JSON on stdout, progress on stderr
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let args = CliArgs {
        verbose: cli.verbose,
        emails: cli.emails.clone(),
    };

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let base_dir = log_base_dir(cli.config.as_deref())?;
    runtime::logging::init_logging_from_config(&config.logging, &base_dir);
    tracing::info!("unsuspend-users starting");

    if cli.print_config {
        println!("{}", config.to_redacted_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config, cli.format).await,
        Commands::Check => check_config(&config),
    }
}

/// Relative log file paths resolve against the config file's directory, or
/// the working directory when no file was given.
fn log_base_dir(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path.and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.to_path_buf()),
        _ => std::env::current_dir().context("Failed to resolve working directory"),
    }
}

fn build_directory(cfg: &HelpdeskConfig) -> Result<ZendeskDirectory> {
    cfg.validate()?;
    let base_url = cfg.api_base_url()?;
    tracing::debug!(%base_url, "Binding helpdesk API client");

    let mut builder = TracedClient::builder(base_url)
        .basic_auth(cfg.auth_username(), cfg.api_token.clone())
        .user_agent(USER_AGENT);
    if cfg.timeout_sec > 0 {
        builder = builder.timeout(Duration::from_secs(cfg.timeout_sec));
    }
    let client = builder.build().context("Failed to build HTTP client")?;
    Ok(ZendeskDirectory::new(client))
}

async fn run(config: AppConfig, format: OutputFormat) -> Result<()> {
    let directory = build_directory(&config.helpdesk)?;
    let reporter: Arc<dyn Reporter> = match format {
        OutputFormat::Text => Arc::new(ConsoleReporter::new()),
        OutputFormat::Json => Arc::new(ConsoleReporter::stderr_only()),
    };
    let service = Service::new(Arc::new(directory), reporter);

    let outcomes = service.process_emails(&config.target_emails()).await;

    if format == OutputFormat::Json {
        let rendered =
            serde_json::to_string_pretty(&outcomes).context("Failed to serialize outcomes")?;
        println!("{rendered}");
    }
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    config.helpdesk.validate()?;
    let base_url = config.helpdesk.api_base_url()?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("API endpoint: {base_url}");
    println!("{}", config.to_redacted_yaml()?);

    Ok(())
}
