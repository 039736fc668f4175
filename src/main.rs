use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mensageiro_do_bem::ai::mime;
use mensageiro_do_bem::client::{GreetingApi, ProxyClient};
use mensageiro_do_bem::config::Config;
use mensageiro_do_bem::models::{ImageStyle, MessageType, Theme};
use mensageiro_do_bem::startup::Application;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

#[derive(Debug, Parser)]
#[command(name = "mensageiro-do-bem")]
#[command(about = "AI greeting suggestions and images behind a small proxy")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the proxy server (default).
    Serve,
    /// Ask a running proxy for greeting suggestions.
    Suggest {
        #[arg(long, default_value = "Bom dia")]
        message_type: MessageType,
        #[arg(long, default_value = "Genérico")]
        theme: Theme,
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
    },
    /// Ask a running proxy for an image and save it.
    Image {
        #[arg(long)]
        message: String,
        #[arg(long, default_value = "Fotográfico")]
        style: ImageStyle,
        #[arg(long, default_value = "Bom dia")]
        message_type: MessageType,
        #[arg(long, default_value = "Genérico")]
        theme: Theme,
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,
        /// Output file; defaults to `mensagem.<ext>`.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mensageiro_do_bem=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Suggest {
            message_type,
            theme,
            endpoint,
        } => suggest(&endpoint, message_type, theme).await,
        Command::Image {
            message,
            style,
            message_type,
            theme,
            endpoint,
            output,
        } => image(&endpoint, &message, style, message_type, theme, output).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn serve() -> Result<()> {
    info!("Starting mensageiro-do-bem proxy");

    let config = Config::from_env().context("Failed to load configuration")?;
    let application = Application::build(&config)
        .await
        .context("Failed to initialize application")?;

    application.run_until_stopped(shutdown_signal()).await?;

    info!("Proxy shutdown complete");
    Ok(())
}

async fn suggest(endpoint: &str, message_type: MessageType, theme: Theme) -> Result<()> {
    let client = ProxyClient::new(endpoint);
    let suggestions = client.get_greeting_suggestions(message_type, theme).await?;

    for (i, suggestion) in suggestions.iter().enumerate() {
        println!("{}. {}", i + 1, suggestion);
    }
    Ok(())
}

async fn image(
    endpoint: &str,
    message: &str,
    style: ImageStyle,
    message_type: MessageType,
    theme: Theme,
    output: Option<PathBuf>,
) -> Result<()> {
    let client = ProxyClient::new(endpoint);
    let image_url = client
        .generate_image_from_message(message, style, message_type, theme)
        .await?;

    let (mime_type, bytes) = mime::parse_data_uri(&image_url)?;
    let path = output.unwrap_or_else(|| {
        PathBuf::from(format!("mensagem.{}", mime::extension_for_mime(&mime_type)))
    });
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Saved {} ({} bytes) to {}", mime_type, bytes.len(), path.display());
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}
