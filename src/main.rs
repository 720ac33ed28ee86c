use clap::Parser;
use tracing_subscriber::EnvFilter;
use tsdb_gateway::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so GATEWAY_* settings apply under cargo run
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tsdb_gateway=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = tsdb_gateway::cli::run(cli).await {
        match std::env::var("GATEWAY_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }

    Ok(())
}
