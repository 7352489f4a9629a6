use std::net::TcpListener;
use std::sync::Arc;

use chirpy::auth::{AccessTokenCodec, PasswordHasher, SessionService};
use chirpy::chirps::ChirpService;
use chirpy::configuration::{get_configuration, Settings};
use chirpy::routes::WebhookKey;
use chirpy::startup::run;
use chirpy::storage::{InMemoryStore, PgStore, Store};
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let (session, chirps) = build_services(&configuration).await?;
    let webhook_key = WebhookKey(configuration.auth.polka_key.clone());
    if webhook_key.0.is_none() {
        tracing::warn!("No Polka key configured, webhook accepts unauthenticated calls");
    }

    let address = configuration.application.address();
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, session, chirps, webhook_key)?.await
}

fn services<S: Store + 'static>(store: Arc<S>, configuration: &Settings) -> (SessionService, ChirpService) {
    let hasher = PasswordHasher::new(configuration.auth.hash_cost);
    let codec = AccessTokenCodec::with_issuer(&configuration.auth.secret, configuration.auth.issuer.clone());

    (
        SessionService::new(store.clone(), hasher, codec),
        ChirpService::new(store),
    )
}

async fn build_services(configuration: &Settings) -> std::io::Result<(SessionService, ChirpService)> {
    let Some(database) = &configuration.database else {
        tracing::warn!("No database configured, using in-memory storage");
        return Ok(services(Arc::new(InMemoryStore::new()), configuration));
    };

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(database.max_connections)
        .connect(&database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    let store = PgStore::new(pool);
    store.migrate().await.map_err(|e| {
        tracing::error!("Failed to migrate database: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
    })?;
    tracing::info!("Database ready");

    Ok(services(Arc::new(store), configuration))
}
