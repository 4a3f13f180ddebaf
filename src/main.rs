use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use parsetown::{
    serve, Device, Dispatcher, PipelineConfig, PipelineRegistry, ServerState,
};

#[derive(Parser, Debug)]
#[command(
    name = "parsetown",
    version,
    about = "Keeps NLP pipelines resident in memory and parses text over HTTP"
)]
struct Args {
    /// IP address to bind on; 0.0.0.0 answers on all interfaces
    #[arg(short = 'i', long, default_value = "0.0.0.0")]
    bind_ip: IpAddr,

    /// TCP port to bind on
    #[arg(short = 'p', long, default_value_t = 8282)]
    bind_port: u16,

    /// Pipeline to load, as language:device:model. Repeatable; order
    /// decides the fallback pipeline. Defaults to English and Dutch.
    #[arg(short = 'm', long = "pipeline", value_parser = PipelineConfig::parse_cli)]
    pipelines: Vec<PipelineConfig>,

    /// Give up waiting on a single parse after this many milliseconds.
    /// 0 waits forever.
    #[arg(long, default_value_t = 0)]
    parse_timeout_msec: u64,
}

fn default_pipelines() -> Vec<PipelineConfig> {
    vec![
        PipelineConfig {
            language: "en".to_string(),
            device: Device::Cpu,
            model: "en_rules_core".to_string(),
        },
        PipelineConfig {
            language: "nl".to_string(),
            device: Device::Cpu,
            model: "nl_rules_core".to_string(),
        },
    ]
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let configs = if args.pipelines.is_empty() {
        default_pipelines()
    } else {
        args.pipelines.clone()
    };

    let registry = PipelineRegistry::load(&configs);
    if registry.is_empty() {
        bail!("no pipelines could be loaded, check the --pipeline model names");
    }
    for entry in registry.entries() {
        tracing::info!(
            language = entry.language(),
            model = entry.name(),
            device = %entry.device(),
            "pipeline resident"
        );
    }
    tracing::info!(pipelines = registry.len(), "registry ready");

    let parse_timeout =
        (args.parse_timeout_msec > 0).then(|| Duration::from_millis(args.parse_timeout_msec));
    let state = Arc::new(ServerState::new(Dispatcher::new(registry), parse_timeout));

    let addr = SocketAddr::new(args.bind_ip, args.bind_port);
    serve(addr, state).await
}
