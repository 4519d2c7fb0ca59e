mod dto;
mod error;
mod handlers;
mod identity;
mod router;
mod state;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::identity::IdentityClient;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("coinfolio_auth_proxy=info,tower_http=info")),
        )
        .init();

    let identity = IdentityClient::from_env()?;
    let state = Arc::new(AppState::new(identity));
    let app = router::router(state);

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("auth proxy listening on {bind_addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
