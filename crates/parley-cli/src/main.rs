//! parley — A2A chat agent with autonomous peer outreach
//!
//! Usage:
//!   parley                                  # serve with A2A_HOST / A2A_PORT
//!   parley serve --host 0.0.0.0 --port 8001
//!   parley client --agent-url http://127.0.0.1:8001 --message "hello"
//!   parley discover

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow, ensure};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::info;

use parley_a2a::autonomy::config::{DEFAULT_HOST, DEFAULT_PORT, HOST_ENV, PORT_ENV};
use parley_a2a::directory::AgentDirectory;
use parley_a2a::server::build_agent_card;
use parley_a2a::{A2aClient, A2aServer, AutonomyConfig, ChatExecutor, HttpDirectory};
use parley_core::{ModelConfig, build_provider};

#[derive(Parser)]
#[command(name = "parley", version, about = "Simple A2A agent server and client")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the A2A server
    Serve {
        #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
        host: String,
        #[arg(long, env = PORT_ENV, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Send a message to a remote A2A agent
    Client {
        #[arg(long, env = "PARLEY_REMOTE_URL")]
        agent_url: Option<String>,
        #[arg(long)]
        message: String,
        /// Seconds to wait for the reply
        #[arg(long, default_value_t = 30.0)]
        timeout: f64,
    },
    /// List agents resolvable from PARLEY_DISCOVERY_URLS
    Discover {
        /// Seconds per candidate (defaults to PARLEY_AUTONOMOUS_TIMEOUT)
        #[arg(long)]
        timeout: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        None => {
            let host = std::env::var(HOST_ENV).unwrap_or_else(|_| DEFAULT_HOST.to_string());
            let port = match std::env::var(PORT_ENV) {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, raw))?,
                Err(_) => DEFAULT_PORT,
            };
            run_server(&host, port).await
        }
        Some(Command::Serve { host, port }) => run_server(&host, port).await,
        Some(Command::Client {
            agent_url,
            message,
            timeout,
        }) => {
            let Some(agent_url) = agent_url else {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "--agent-url is required, or set PARLEY_REMOTE_URL.",
                    )
                    .exit();
            };
            let reply = A2aClient::new()
                .send_text(&agent_url, &message, seconds(timeout)?)
                .await?;
            println!("{}", reply);
            Ok(())
        }
        Some(Command::Discover { timeout }) => {
            let config = AutonomyConfig::from_env(None, None);
            let timeout = match timeout {
                Some(t) => seconds(t)?,
                None => config.timeout,
            };
            if config.discovery_urls.is_empty() {
                println!("No candidates: set PARLEY_DISCOVERY_URLS to comma-separated agent URLs.");
                return Ok(());
            }
            let agents = HttpDirectory::default()
                .discover(&config.discovery_urls, timeout)
                .await?;
            println!(
                "{} of {} candidates reachable",
                agents.len(),
                config.discovery_urls.len()
            );
            for agent in agents {
                println!("- {} ({}) {}", agent.name, agent.url, agent.description);
            }
            Ok(())
        }
    }
}

fn seconds(value: f64) -> Result<Duration> {
    ensure!(value.is_finite() && value > 0.0, "timeout must be a positive number of seconds");
    Ok(Duration::from_secs_f64(value))
}

fn resolve_addr(host: &str, port: u16) -> Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()
        .with_context(|| format!("Invalid bind address {}:{}", host, port))?
        .next()
        .ok_or_else(|| anyhow!("No address found for {}:{}", host, port))
}

async fn run_server(host: &str, port: u16) -> Result<()> {
    let model = ModelConfig::from_env()?;
    info!(
        "parley v{} using {} model {}",
        env!("CARGO_PKG_VERSION"),
        model.provider,
        model.model
    );

    let autonomy = AutonomyConfig::from_env(Some(host), Some(port));
    info!(
        "Autonomy: agent={} self={} candidates={} max_hops={} timeout={:?}",
        autonomy.agent_name,
        autonomy.self_url.as_deref().unwrap_or("unknown"),
        autonomy.discovery_urls.len(),
        autonomy.max_hops,
        autonomy.timeout
    );

    let client = A2aClient::new();
    let executor = ChatExecutor::new(
        build_provider(&model),
        autonomy,
        Arc::new(HttpDirectory::new(client.clone())),
        Arc::new(client),
    );

    let server = A2aServer::new(build_agent_card(host, port), Arc::new(executor));
    server.serve(resolve_addr(host, port)?).await
}
