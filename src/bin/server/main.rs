use anyhow::Context;
use tracing_subscriber::EnvFilter;

use devices::config::Config;
use devices::domain::device::service::Service;
use devices::inbound::http::{HttpServer, HttpServerConfig};
use devices::outbound::sqlite::Sqlite;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_tracing(&config)?;

    let sqlite = Sqlite::new(&config.database_url, config.database_max_connections).await?;
    let device_service = Service::new(sqlite);

    let server_config = HttpServerConfig {
        host: &config.server_host,
        port: &config.server_port,
        request_timeout: config.request_timeout,
    };

    let http_server = HttpServer::new(device_service, server_config).await?;

    http_server.run().await
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)
        .with_context(|| format!("invalid log level {:?}", config.log_level))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}
