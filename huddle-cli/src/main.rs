use anyhow::Result;
use clap::Parser;
use colored::*;
use huddle_core::IceServerConfig;
use huddle_server::ServerConfig;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "huddle")]
#[command(about = "Room presence and WebRTC signaling relay server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:4000")]
    listen: SocketAddr,

    /// Redis URL for the durable presence backing. Omit to run on the
    /// in-process backing only.
    #[arg(long)]
    redis_url: Option<String>,

    /// STUN server handed to clients at connect.
    #[arg(long, default_value = "stun:stun.l.google.com:19302")]
    stun: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("{}", "🚀 Starting huddle signaling server...".green().bold());
    println!("   📡 Listening on {}", args.listen.to_string().cyan());
    match &args.redis_url {
        Some(url) => println!("   🗄  Durable backing: {}", url.cyan()),
        None => println!("   🗄  Durable backing: {}", "disabled (local only)".yellow()),
    }

    let config = ServerConfig {
        listen_addr: args.listen,
        redis_url: args.redis_url,
        ice_servers: vec![IceServerConfig::stun(&args.stun)],
    };

    huddle_server::run(config).await
}
