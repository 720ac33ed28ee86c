use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::cluster::MemoryCluster;
use crate::config::GatewayConfig;
use crate::server;

#[derive(Parser)]
#[command(name = "tsdb-gateway")]
#[command(about = "Authenticated command gateway for a clustered time-series database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "YAML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Address to listen on")]
    pub host: Option<String>,

    #[arg(long, global = true, help = "Port to listen on")]
    pub port: Option<u16>,

    #[arg(long, global = true, help = "Require credentials once a user exists")]
    pub auth_enabled: Option<bool>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Run the gateway (default)")]
    Serve,

    #[command(about = "Print the effective configuration as YAML")]
    Config,
}

impl Cli {
    /// File (or environment preset), then `GATEWAY_*` variables, then flags
    pub fn resolve_config(&self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_file(path)?.with_env_overrides(),
            None => GatewayConfig::from_env(),
        };

        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(enabled) = self.auth_enabled {
            config.auth.enabled = enabled;
        }
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!(auth_enabled = config.auth.enabled, "Using in-memory cluster store");
            server::serve(config, Arc::new(MemoryCluster::new())).await
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "tsdb-gateway",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--auth-enabled",
            "true",
            "config",
        ])
        .unwrap();

        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.auth_enabled, Some(true));
        assert_eq!(cli.command, Some(Commands::Config));
    }

    #[test]
    fn flags_override_file() {
        let path = std::env::temp_dir().join(format!("tsdb-gateway-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "server:\n  port: 9999\nauth:\n  enabled: false\n").unwrap();

        let cli = Cli::try_parse_from([
            "tsdb-gateway",
            "--config",
            path.to_str().unwrap(),
            "--auth-enabled",
            "true",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.auth.enabled);
        assert_eq!(cli.command, None);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["tsdb-gateway", "--config", "/nonexistent/gateway.yaml"])
            .unwrap();
        assert!(cli.resolve_config().is_err());
    }
}
