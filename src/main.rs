use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpListener;

use onboarding_gateway::bus::{Address, ServiceBus};
use onboarding_gateway::config::{load_config, GatewayConfig};
use onboarding_gateway::http::HttpServer;
use onboarding_gateway::lifecycle::Shutdown;
use onboarding_gateway::net::tls::load_tls_config;
use onboarding_gateway::observability::logging;
use onboarding_gateway::token::{TokenService, TOKEN_ADDRESS};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration: path from first argument, defaults otherwise.
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => GatewayConfig::default(),
    };

    logging::init(&config.observability.log_level);

    tracing::info!(
        base_path = %config.api.dx_api_base_path,
        ssl = config.listener.ssl,
        port = config.listener.listen_port(),
        request_timeout_ms = config.timeouts.request_ms,
        "Configuration loaded"
    );

    // The bus is the only path to the token-issuing component; its
    // responder registers out of process, by address.
    let bus = ServiceBus::new();
    let tokens = TokenService::create_proxy(
        &bus,
        Address::new(TOKEN_ADDRESS),
        Duration::from_millis(config.timeouts.proxy_reply_ms),
    );

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let port = config.listener.listen_port();
    let ssl = config.listener.ssl;
    let tls_files = config.listener.tls.clone();
    let server = HttpServer::new(config, tokens)?;

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    if ssl {
        // Config validation guarantees TLS material is present here.
        let tls = match tls_files {
            Some(tls) => load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?,
            None => return Err("listener.ssl is enabled but listener.tls is missing".into()),
        };
        server.run_tls(addr, tls, shutdown.subscribe()).await?;
    } else {
        let listener = TcpListener::bind(addr).await?;
        server.run(listener, shutdown.subscribe()).await?;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
