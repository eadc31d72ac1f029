use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::net::UdpSocket;

use frontdoor::config::{load_config, ConfigStore};
use frontdoor::reload::RELOAD_TOKEN;

#[derive(Parser)]
#[command(name = "frontdoor-ctl")]
#[command(about = "Operator CLI for the frontdoor proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a running proxy to reload its routing table
    Reload {
        #[arg(short, long, default_value = "127.0.0.1:9876")]
        addr: SocketAddr,
    },
    /// Load the config and print the routing table it produces
    Check {
        #[arg(short, long, env = "FRONTDOOR_CONFIG", default_value = "frontdoor.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Reload { addr } => {
            let local = if addr.is_ipv6() { "[::1]:0" } else { "127.0.0.1:0" };
            let socket = UdpSocket::bind(local).await?;
            socket.send_to(RELOAD_TOKEN, addr).await?;
            println!("reload sent to {addr}");
        }
        Commands::Check { config } => {
            let config = load_config(&config)?;
            let table = ConfigStore::from_config(&config.services).build_routing_table()?;

            let backends: Vec<_> = table
                .backends()
                .iter()
                .map(|b| {
                    json!({
                        "domain": b.domain,
                        "aliases": [b.alias()],
                        "target": format!("http://{}/", b.authority()),
                        "tls_required": b.tls_required,
                        "alerts_enabled": b.alerts_enabled,
                    })
                })
                .collect();
            let report = json!({
                "http_port": config.listener.http_port,
                "https_port": config.listener.https_port,
                "hosts": table.hosts(),
                "backends": backends,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
