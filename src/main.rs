//! CLI entry point for the cclib request builder.
//!
//! Reads credentials from the environment (or a `.env` file), issues one
//! call and writes the raw response body to stdout.

use anyhow::{Context, Result, bail};
use cclib::config::Settings;
use cclib::{Form, RequestContext};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "cclib")]
#[command(version, about = "Send authenticated requests to the API", long_about = None)]
struct Cli {
    /// Override the API base URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true, default_value_t = false)]
    insecure: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a resource
    Get {
        #[arg(value_name = "RESOURCE")]
        resource: String,
    },
    /// POST form data to a resource
    Post {
        #[arg(value_name = "RESOURCE")]
        resource: String,

        /// Form field as key=value (repeatable)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,
    },
    /// PUT form data to a resource
    Put {
        #[arg(value_name = "RESOURCE")]
        resource: String,

        /// Form field as key=value (repeatable)
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,
    },
    /// DELETE a resource
    Delete {
        #[arg(value_name = "RESOURCE")]
        resource: String,
    },
    /// Request a new token from the token source
    Token,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/cclib.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("cclib.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let settings = Settings::from_env().context("Failed to read settings from environment")?;
    let mut ctx = settings
        .into_context()
        .context("Failed to build request context")?;
    if let Some(url) = cli.url {
        ctx.set_url(url);
    }
    if cli.insecure {
        ctx.disable_ssl_check();
    }

    let body = run(&mut ctx, cli.command)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body)?;
    stdout.flush()?;
    Ok(())
}

fn run(ctx: &mut RequestContext, command: Commands) -> Result<Vec<u8>> {
    let body = match command {
        Commands::Get { resource } => ctx.get(&resource),
        Commands::Post { resource, data } => ctx.post(&resource, &parse_form(&data)?),
        Commands::Put { resource, data } => ctx.put(&resource, &parse_form(&data)?),
        Commands::Delete { resource } => ctx.delete(&resource),
        Commands::Token => ctx.post_token(),
    };

    let body = body.with_context(|| format!("Request to {} failed", ctx.url()))?;
    info!(bytes = body.len(), "Request completed");
    Ok(body)
}

/// Turns `key=value` arguments into a form; the first `=` splits.
fn parse_form(pairs: &[String]) -> Result<Form> {
    let mut form = Form::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("form field '{pair}' is not in key=value form");
        };
        form.insert(key.to_string(), value.to_string());
    }
    Ok(form)
}
