use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use profile_pic_relay::config::Config;
use profile_pic_relay::nifty::NiftyClient;
use profile_pic_relay::resolver::{OutputMode, ResolveOptions, ResolveOutput, Resolver};
use profile_pic_relay::web;

#[derive(Parser)]
#[command(name = "profile-pic-relay")]
#[command(about = "Fetch Instagram profile pictures and re-host them", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server (default)
    Serve,
    /// Resolve one account and print the result
    Fetch {
        /// Instagram username, with or without a leading '@'
        username: String,

        /// Output format: url, json, base64 or file
        #[arg(short, long, default_value = "url")]
        format: OutputMode,

        /// Directory for --format file (default: current directory)
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Graph API token for this request
        #[arg(long, env = "GRAPH_API_TOKEN")]
        graph_token: Option<String>,
    },
    /// Render a Nifty Images template with an account's picture
    Nifty {
        /// Instagram username, with or without a leading '@'
        username: String,

        /// Nifty Images template id
        #[arg(long)]
        template_id: String,

        /// Nifty Images API key
        #[arg(long, env = "NIFTY_API_KEY")]
        api_key: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    init_tracing()?;

    // Load and validate configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Fetch {
            username,
            format,
            save_dir,
            graph_token,
        } => {
            let options = ResolveOptions {
                graph_token,
                save_dir,
            };
            fetch(&config, &username, format, &options).await
        }
        Commands::Nifty {
            username,
            template_id,
            api_key,
        } => nifty(&config, &username, &template_id, api_key).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    info!(
        host = %config.web_host,
        port = config.web_port,
        mirrors = config.mirrors_enabled,
        "Starting profile-pic-relay"
    );

    tokio::select! {
        result = web::serve(config) => result?,
        () = shutdown_signal() => info!("Shutting down..."),
    }

    info!("Shutdown complete");
    Ok(())
}

async fn fetch(
    config: &Config,
    username: &str,
    format: OutputMode,
    options: &ResolveOptions,
) -> Result<()> {
    let resolver = Resolver::new(config).context("Failed to initialize resolver")?;
    let output = resolver
        .resolve(username, format, options)
        .await
        .with_context(|| format!("Failed to fetch profile picture for {username}"))?;

    match output {
        ResolveOutput::DirectUrl(text) | ResolveOutput::EncodedInline(text) => println!("{text}"),
        ResolveOutput::StructuredMetadata(meta) | ResolveOutput::PersistedFile(meta) => {
            let json = serde_json::to_string_pretty(&meta).context("Failed to serialize result")?;
            println!("{json}");
        }
    }

    Ok(())
}

async fn nifty(config: &Config, username: &str, template_id: &str, api_key: String) -> Result<()> {
    let resolver = Resolver::new(config).context("Failed to initialize resolver")?;
    let output = resolver
        .resolve(username, OutputMode::EncodedInline, &ResolveOptions::default())
        .await
        .with_context(|| format!("Failed to fetch profile picture for {username}"))?;

    let ResolveOutput::EncodedInline(picture) = output else {
        anyhow::bail!("Unexpected output for base64 request");
    };

    let client = NiftyClient::new(resolver.http().clone(), &config.nifty_api_url, api_key);
    let url = client
        .render(template_id, &picture)
        .await
        .context("Nifty Images render failed")?;

    println!("{url}");
    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,profile_pic_relay=debug"));

    // Check if JSON logging is requested
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| matches!(v.to_lowercase().as_str(), "json" | "structured"))
        .unwrap_or(false);

    // Logs go to stderr so `fetch` output stays pipeable
    if use_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
