use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use cms_common::{ServerPaths, ServerProcessStatus};
use cms_server_control::{ManagerConfig, ServerControl, ServerController};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

mod api;

use api::{create_router, AppState};

/// CMS Server Manager - process control for CMaNGOS realmd/mangosd
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Show the status of both servers
    Status(PathArgs),
    /// Start both servers (realmd first)
    Start(PathArgs),
    /// Stop both servers
    Stop(PathArgs),
    /// Restart both servers
    Restart(PathArgs),
    /// Print the tails of both servers' capture files
    Logs(PathArgs),
    /// Derive SRP6 salt and verifier for an account
    Verifier {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },
}

#[derive(ClapArgs, Debug)]
struct PathArgs {
    /// realmd executable or the folder holding it
    #[arg(long, value_name = "PATH")]
    realmd: String,

    /// mangosd executable or the folder holding it
    #[arg(long, value_name = "PATH")]
    mangosd: String,

    /// Run the servers with a visible console instead of capturing output
    #[arg(long)]
    show_console: bool,
}

impl PathArgs {
    fn server_paths(&self) -> ServerPaths {
        ServerPaths {
            realmd_path: self.realmd.clone(),
            mangosd_path: self.mangosd.clone(),
            show_console: Some(self.show_console),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ManagerConfig::load_from_file(path)?,
        None => ManagerConfig::default(),
    };

    initialize_logging(args.debug, &config.server.log_level)?;

    match args.command {
        Command::Serve { port } => serve(config, port).await,
        Command::Status(paths) => {
            let controller = ServerController::new(config.control);
            let statuses = controller
                .status_all(&paths.server_paths(), &CancellationToken::new())
                .await;
            print_statuses(&statuses)
        }
        Command::Start(paths) => {
            let controller = ServerController::new(config.control);
            let statuses = controller.start_all(&paths.server_paths()).await?;
            print_statuses(&statuses)?;
            capture_until_interrupted(&controller).await;
            Ok(())
        }
        Command::Stop(paths) => {
            let controller = ServerController::new(config.control);
            print_statuses(&controller.stop_all(&paths.server_paths()).await?)
        }
        Command::Restart(paths) => {
            let controller = ServerController::new(config.control);
            let statuses = controller.restart_all(&paths.server_paths()).await?;
            print_statuses(&statuses)?;
            capture_until_interrupted(&controller).await;
            Ok(())
        }
        Command::Logs(paths) => {
            let controller = ServerController::new(config.control);
            let logs = controller
                .logs_all(&paths.server_paths(), &CancellationToken::new())
                .await?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
            Ok(())
        }
        Command::Verifier { username, password } => print_verifier(&username, &password),
    }
}

async fn serve(config: ManagerConfig, port: Option<u16>) -> Result<()> {
    let mut config = config;
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("Starting CMS server manager v{}", cms_server_control::VERSION);

    let controller = Arc::new(ServerController::new(config.control.clone()));
    let shutdown = CancellationToken::new();
    let app = create_router(AppState::new(controller.clone(), shutdown.clone()));

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("HTTP API listening on {}", address);

    let serve_shutdown = shutdown.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            serve_shutdown.cancel();
        })
        .await;

    controller.shutdown();

    if let Err(e) = result {
        error!("HTTP server failed: {}", e);
        return Err(anyhow!("Server error: {}", e));
    }

    info!("CMS server manager shut down");
    Ok(())
}

/// Servers started in capture mode write through this process; keep it
/// alive until the operator detaches.
async fn capture_until_interrupted(controller: &ServerController) {
    if controller.registry().get(cms_common::ServerKind::Realmd).is_none()
        && controller.registry().get(cms_common::ServerKind::Mangosd).is_none()
    {
        return;
    }

    info!("Capturing server output, press Ctrl+C to detach (servers keep running, later output is not captured)");
    shutdown_signal().await;
    controller.shutdown();
}

fn print_statuses(statuses: &[ServerProcessStatus]) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(statuses)?);
    Ok(())
}

fn print_verifier(username: &str, password: &str) -> Result<()> {
    let name = cms_srp6::normalize_credential(username);
    cms_srp6::validate_account_name(&name)?;
    cms_srp6::validate_password(password)?;

    let identity = cms_srp6::identity_hash(&name, password);
    let credentials = cms_srp6::Srp6Credentials::generate(&identity)?;

    println!("username: {}", name);
    println!("s: {}", credentials.salt_hex());
    println!("v: {}", credentials.verifier_hex());
    Ok(())
}

fn initialize_logging(debug: bool, configured_level: &str) -> Result<()> {
    let level = if debug { "debug" } else { configured_level };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    #[cfg(unix)]
    {
        let (mut sigterm, mut sigint) = match (
            signal::unix::signal(signal::unix::SignalKind::terminate()),
            signal::unix::signal(signal::unix::SignalKind::interrupt()),
        ) {
            (Ok(term), Ok(int)) => (term, int),
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM signal");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT signal");
            }
        }
    }

    #[cfg(windows)]
    {
        let _ = signal::ctrl_c().await;
        info!("Received Ctrl+C signal");
    }
}
