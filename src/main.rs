use sql_chatbot::api::{create_router, AppState};
use sql_chatbot::infrastructure::{logging, AppConfig};
use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init(&config.config.logging);
    config.validate()?;

    let host = config.config.server.host.clone();
    let port = config.config.server.port;
    info!(
        database = %config.config.database.url,
        model = %config.config.llm.model,
        "configuration loaded"
    );

    let state = AppState::from_config(config)?;
    let app = create_router(state);

    let addr = SocketAddr::new(host.parse()?, port);
    info!("Chat server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
