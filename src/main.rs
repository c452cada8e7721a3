use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use medinfo_extractor::api::{api_router, start_server};
use medinfo_extractor::models::Config;
use medinfo_extractor::pipeline::Pipeline;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "medinfo-extractor")]
#[command(about = "Serve medical information extraction endpoints backed by Gemini")]
struct CliArgs {
    /// Listen address, overrides BIND_ADDR.
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medinfo_extractor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting medinfo-extractor");

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    info!(
        text_model = %config.text_model,
        vision_model = %config.vision_model,
        "Models configured"
    );

    let pipeline = Arc::new(Pipeline::from_config(&config));
    let router = api_router(pipeline, config.max_body_bytes);

    let server = match start_server(router, config.bind_addr).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_addr, e);
            std::process::exit(1);
        }
    };
    info!("Serving on http://{}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    server.shutdown().await;

    Ok(())
}
