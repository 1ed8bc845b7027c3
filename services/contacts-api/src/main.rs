use contacts_api::{serve, ContactStore};
use contract_core::BUILD_INFO;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

const ADDR_ENV: &str = "CONTACTS_API_ADDR";
const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Contacts API {}", BUILD_INFO);

    let addr = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;

    serve(listener, ContactStore::new()).await?;

    Ok(())
}
