use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Args;

use gateway::config::ConfigError;
use gateway::http_server::parse_url_base;
use gateway::process::ProcessError;
use gateway::{init_logging, spawn_service, GatewayConfig};

/// Run the gateway
#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override the listen address (default from config)
    #[arg(long)]
    pub listen: Option<SocketAddr>,

    /// Override the public base URL (e.g., https://link.example.com)
    #[arg(long)]
    pub url_base: Option<String>,

    /// Override the log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

impl Serve {
    /// Config file contents with command line overrides applied
    fn config(&self, path: Option<&std::path::Path>) -> Result<GatewayConfig, ConfigError> {
        let mut config = match path {
            Some(path) => GatewayConfig::load(path)?,
            None => GatewayConfig::default(),
        };
        if let Some(listen) = self.listen {
            config.listen_addr = listen;
        }
        if let Some(url_base) = &self.url_base {
            config.url_base = url_base.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone();
        }
        if let Some(log_dir) = &self.log_dir {
            config.log_dir = Some(log_dir.clone());
        }
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("gateway failed: {0}")]
    Process(#[from] ProcessError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = self.config(ctx.config_path.as_deref())?;

        // fail before logging is set up so the message reaches the terminal
        parse_url_base(&config.url_base).map_err(ConfigError::from)?;
        let log_level = config.log_level()?;

        let _guards = init_logging(log_level, config.log_dir.as_deref());
        spawn_service(&config).await?;
        Ok("gateway stopped".to_string())
    }
}
