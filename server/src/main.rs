use gatherly_server::core::{Config, db};
use gatherly_server::mailer::Mailer;
use gatherly_server::{AppState, create_router_with_cors};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logging: RUST_LOG sovrascrive il livello di default
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Inizializza la configurazione
    let config = Config::from_env()?;
    config.print_info();

    // Pool SQLite con migrazioni applicate
    let pool = db::connect(&config.database_url, config.max_connections)
        .await
        .map_err(|e| {
            error!("Failed to open database: {}", e);
            e
        })?;

    // Mailer opzionale: senza SMTP_HOST gli inviti arrivano solo in-app
    let mailer = match &config.smtp {
        Some(smtp) => match Mailer::from_config(smtp) {
            Ok(mailer) => Some(Arc::new(mailer)),
            Err(e) => {
                warn!("Mailer disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let state = Arc::new(
        AppState::new(pool, config.jwt_secret.clone(), mailer).with_bcrypt_cost(config.bcrypt_cost),
    );
    let app = create_router_with_cors(state, config.cors_origin.as_deref());

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    // Avvia il server
    axum::serve(listener, app).await?;

    Ok(())
}
