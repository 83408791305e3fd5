mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use lounge_core::{Identity, Role};
use lounge_peer::{
    HostHandle, HostOrchestrator, RtcTransportFactory, SessionConfig, SignalingClient,
    StaticMedia, TransportConfig, ViewerClient, ViewerHandle, WsConnector,
};
use lounge_relay::RelayService;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::terminal::TerminalBehavior;

#[derive(Parser)]
#[command(name = "lounge")]
#[command(bin_name = "lounge")]
#[command(about = "Voice and chat lounge over WebRTC")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Relay {
        #[arg(long, env = "LOUNGE_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,
    },
    /// Host the lounge.
    Host(PeerArgs),
    /// Join the lounge as a viewer.
    Join(PeerArgs),
}

#[derive(clap::Args)]
struct PeerArgs {
    #[arg(long, env = "LOUNGE_RELAY_URL", default_value = "ws://127.0.0.1:8080/ws")]
    relay: String,

    #[arg(short, long)]
    name: Option<String>,

    /// Comma separated STUN/TURN urls.
    #[arg(long, env = "LOUNGE_ICE_SERVERS")]
    ice_servers: Option<String>,

    #[arg(long, env = "LOUNGE_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    connect_timeout: u64,
}

impl PeerArgs {
    fn session_config(&self) -> SessionConfig {
        let transport = self
            .ice_servers
            .as_deref()
            .map(TransportConfig::from_urls)
            .unwrap_or_default();

        SessionConfig {
            transport,
            connect_timeout: Duration::from_secs(self.connect_timeout),
            ..Default::default()
        }
    }

    async fn identity(&self, role: Role) -> Result<Identity> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => tokio::task::spawn_blocking(|| {
                dialoguer::Input::<String>::new()
                    .with_prompt("Display name")
                    .interact_text()
            })
            .await?
            .context("Failed to read display name")?,
        };
        Ok(Identity::new(name, role))
    }
}

enum Participant {
    Host(HostHandle),
    Viewer(ViewerHandle),
}

impl Participant {
    async fn send_chat(&self, line: String) -> Result<()> {
        match self {
            Participant::Host(host) => {
                host.send_chat(line).await?;
            }
            Participant::Viewer(viewer) => {
                if let Err(e) = viewer.send_chat(line).await? {
                    println!("{}", format!("not sent: {e}").red());
                }
            }
        }
        Ok(())
    }

    async fn toggle_mute(&self) -> Result<bool> {
        Ok(match self {
            Participant::Host(host) => host.toggle_local_mute().await?,
            Participant::Viewer(viewer) => viewer.toggle_local_mute().await?,
        })
    }

    async fn teardown(&self) -> Result<()> {
        match self {
            Participant::Host(host) => host.teardown().await?,
            Participant::Viewer(viewer) => viewer.teardown().await?,
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Relay { listen } => {
            let listener = TcpListener::bind(&listen)
                .await
                .with_context(|| format!("Failed to bind {listen}"))?;
            lounge_relay::serve(listener, RelayService::new()).await
        }
        Commands::Host(args) => {
            let identity = args.identity(Role::Host).await?;
            let signaling = SignalingClient::new(Arc::new(WsConnector::new(args.relay.clone())));
            let host = HostOrchestrator::new(
                args.session_config(),
                identity,
                signaling,
                Arc::new(RtcTransportFactory),
                Arc::new(TerminalBehavior),
            )
            .connect(&StaticMedia::microphone(), cancel_on_ctrl_c())
            .await?;

            println!("{}", "Hosting. Type to chat, /mute, /quit.".green().bold());
            repl(Participant::Host(host)).await
        }
        Commands::Join(args) => {
            let identity = args.identity(Role::Viewer).await?;
            let signaling = SignalingClient::new(Arc::new(WsConnector::new(args.relay.clone())));
            let viewer = ViewerClient::new(
                args.session_config(),
                identity,
                signaling,
                Arc::new(RtcTransportFactory),
                Arc::new(TerminalBehavior),
            )
            .connect(&StaticMedia::microphone(), cancel_on_ctrl_c())
            .await?;

            println!("{}", "Joined. Type to chat, /mute, /quit.".green().bold());
            repl(Participant::Viewer(viewer)).await
        }
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}

async fn repl(participant: Participant) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/mute" => {
                let muted = participant.toggle_mute().await?;
                let state = if muted { "muted" } else { "live" };
                println!("{}", format!("microphone {state}").yellow());
            }
            text => participant.send_chat(text.to_owned()).await?,
        }
    }

    participant.teardown().await?;
    println!("{}", "Bye.".dimmed());
    Ok(())
}
