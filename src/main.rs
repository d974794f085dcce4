use anyhow::Context;
use govukpay_payment::config::Config;
use govukpay_payment::host::memory::MemoryHost;
use govukpay_payment::payments::flow::PaymentFlow;
use govukpay_payment::payments::providers::GovukPayGateway;
use govukpay_payment::payments::traits::PaymentGateway;
use govukpay_payment::urls::PluginUrls;
use govukpay_payment::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("govukpay_payment=info,tower_http=info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    let config = Config::from_env()?;

    tracing::info!("Starting GOV.UK Pay payment service");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("GOV.UK Pay API: {}", config.plugin.url);

    let host = MemoryHost::new(config.plugin.clone());
    let gateway = GovukPayGateway::new(config.govukpay.clone())
        .context("Failed to build GOV.UK Pay client")?;
    let gateway_name = gateway.name();
    let urls = PluginUrls::new(&config.server.public_base_url)
        .map_err(|e| anyhow::anyhow!("Invalid PUBLIC_BASE_URL: {}", e))?;

    let host = Arc::new(host);
    let flow = PaymentFlow::new(Arc::new(gateway), host.clone(), host.clone(), urls);
    let state = AppState {
        flow: Arc::new(flow),
        registrations: host.clone(),
        settings: host,
        environment: config.server.environment.clone(),
        gateway_name,
    };

    let app = create_router(state, config.server.internal_api_key.clone());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("HOST and PORT must form a socket address")?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
