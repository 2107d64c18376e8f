//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use contactdesk_address::AddressLookup;
use contactdesk_core::{SubmissionController, SubmissionResult};
use contactdesk_notify::Dispatcher;
use contactdesk_shared::{AppConfig, SubmissionInput, init_config, load_config, load_config_from};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::server::{self, HttpState};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// ContactDesk — contact form intake and webhook notification.
#[derive(Parser)]
#[command(
    name = "contactdesk",
    version,
    about = "Validate contact-form submissions and forward them to chat webhooks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.contactdesk/contactdesk.toml.
    #[arg(long, global = true, env = "CONTACTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run one submission through validation and notification.
    Submit {
        /// Read the fields from a JSON file (`-` for stdin) instead of flags.
        #[arg(long, conflicts_with_all = ["name", "company", "phone", "email", "message", "locale"])]
        json: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        message: Option<String>,

        #[arg(long)]
        locale: Option<String>,
    },

    /// Serve the contact and address endpoints over HTTP.
    Serve {
        /// Listen address (defaults to server.host).
        #[arg(long)]
        host: Option<String>,

        /// Listen port (defaults to server.port).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Look up an address from a Japanese postal code.
    LookupAddress {
        /// Postal code, with or without the hyphen (e.g. 100-0001).
        postal_code: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
    /// Check that every notification sink can be resolved.
    Check,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "contactdesk=info",
        1 => "contactdesk=debug",
        _ => "contactdesk=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match cli.command {
        Command::Submit {
            json,
            name,
            company,
            phone,
            email,
            message,
            locale,
        } => {
            let input = match json {
                Some(source) => read_input_json(&source)?,
                None => SubmissionInput {
                    name,
                    company,
                    phone,
                    email,
                    message,
                    locale,
                },
            };
            cmd_submit(&config, input).await
        }
        Command::Serve { host, port } => cmd_serve(&config, host, port).await,
        Command::LookupAddress { postal_code } => cmd_lookup_address(&config, &postal_code).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
            ConfigAction::Check => cmd_config_check(&config),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_submit(config: &AppConfig, input: SubmissionInput) -> Result<()> {
    // Missing webhook configuration stops here, before any input is processed.
    let dispatcher = Dispatcher::from_config(&config.notify)?;
    let controller = SubmissionController::new(dispatcher);

    let spinner = spinner("Submitting");
    let result = controller.submit(input).await;
    spinner.finish_and_clear();

    println!("{}", serde_json::to_string_pretty(&result)?);

    match &result {
        SubmissionResult::Rejected(errors) => Err(eyre!(
            "submission rejected: {} field(s) invalid",
            errors.len()
        )),
        _ => Ok(()),
    }
}

async fn cmd_serve(config: &AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let state = HttpState {
        controller: SubmissionController::new(Dispatcher::from_config(&config.notify)?),
        lookup: AddressLookup::new(&config.address)?,
    };

    info!(%host, port, "starting HTTP server");
    println!("Serving on http://{host}:{port}/api");

    server::start_server(state, &host, port)
        .wrap_err_with(|| format!("failed to bind {host}:{port}"))?
        .await?;

    Ok(())
}

async fn cmd_lookup_address(config: &AppConfig, postal_code: &str) -> Result<()> {
    let lookup = AddressLookup::new(&config.address)?;

    let spinner = spinner("Looking up postal code");
    let found = lookup.lookup(postal_code).await;
    spinner.finish_and_clear();

    match found? {
        Some(address) => {
            println!("{}", serde_json::to_string_pretty(&address.to_patch())?);
            Ok(())
        }
        None => Err(eyre!("no address found for postal code '{postal_code}'")),
    }
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

fn cmd_config_check(config: &AppConfig) -> Result<()> {
    let dispatcher = Dispatcher::from_config(&config.notify)?;
    AddressLookup::new(&config.address)?;

    println!("  Notification sinks:");
    for (name, format) in dispatcher.sinks() {
        println!("    {name:<12} format={format}");
    }
    println!("  Timeout: {}s", config.notify.timeout_secs);
    println!("  Address API: {}", config.address.base_url);
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Read submission fields from a JSON file, or stdin when `source` is `-`.
fn read_input_json(source: &str) -> Result<SubmissionInput> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .wrap_err("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).wrap_err_with(|| format!("failed to read '{source}'"))?
    };

    serde_json::from_str(&raw).wrap_err("submission JSON must be an object of string fields")
}

/// Stderr spinner for a single network wait.
fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .map(|s| s.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_submit_flags() {
        let cli = Cli::try_parse_from([
            "contactdesk",
            "submit",
            "--name",
            "Taro",
            "--email",
            "taro@example.com",
            "--message",
            "hello",
        ])
        .unwrap();

        match cli.command {
            Command::Submit { name, email, json, company, .. } => {
                assert_eq!(name.as_deref(), Some("Taro"));
                assert_eq!(email.as_deref(), Some("taro@example.com"));
                assert!(json.is_none());
                assert!(company.is_none());
            }
            _ => panic!("expected submit"),
        }
    }

    #[test]
    fn json_conflicts_with_field_flags() {
        let parsed = Cli::try_parse_from([
            "contactdesk",
            "submit",
            "--json",
            "form.json",
            "--name",
            "Taro",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["contactdesk", "serve", "--port", "3000", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Serve { host, port } => {
                assert!(host.is_none());
                assert_eq!(port, Some(3000));
            }
            _ => panic!("expected serve"),
        }
    }
}
