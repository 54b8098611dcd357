use std::sync::Arc;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;

use scoring::{InMemoryStore, Store, create_method_router};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const HELP_TEXT: &str = r#"scoringd - Scoring API daemon

USAGE:
    scoringd [OPTIONS]

OPTIONS:
    --host <HOST>        Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>        Port to bind the HTTP server [default: 8080]
    --verbose            Enable verbose logging

DESCRIPTION:
    Runs the scoring daemon with a single JSON method-call endpoint.

    The server supports graceful shutdown via SIGTERM or Ctrl+C.

API ENDPOINTS:
    POST /method    Dispatch a method call; recognized methods are
                    "online_score" and "clients_interests".
                    The request envelope carries account, login, token,
                    method, and arguments; the response carries either
                    "response" or "error", plus "code"."#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: scoringd [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let config = ServerConfig::from_args(args);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if config.verbose {
                    tracing_subscriber::EnvFilter::new("debug")
                } else {
                    tracing_subscriber::EnvFilter::new("info")
                }
            }),
        )
        .init();

    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());
    let app = create_method_router(store);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!("scoring daemon listening on http://{}", addr);
    println!("🚀 Scoring daemon started successfully!");
    println!("📡 Server listening on: http://{}", addr);
    println!("💡 Use Ctrl+C or send SIGTERM for graceful shutdown");

    let shutdown_signal = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                eprintln!("❌ Server error: {}", e);
                std::process::exit(1);
            }
        }
        () = shutdown_signal => {
            tracing::info!("shutdown signal received");
            println!();
            println!("👋 Scoring daemon stopped");
        }
    }

    Ok(())
}

struct ServerConfig {
    host: String,
    port: u16,
    verbose: bool,
}

impl ServerConfig {
    fn from_args(args: Args) -> Self {
        Self {
            host: args.host.unwrap_or_else(|| "127.0.0.1".to_string()),
            port: args.port.unwrap_or(8080),
            verbose: args.verbose,
        }
    }
}
