mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use ipaj_api::mailer::{Mailer, ResendMailer};
use ipaj_api::state::Services;
use ipaj_db::Database;
use ipaj_llm::{Completion, ProviderClient};

use crate::config::{Config, DEFAULT_LOG_FILTER};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let config = Config::from_env()?;

    // Every external service is optional; a missing one switches its feature off
    let db = match Database::open(&config.db_path) {
        Ok(db) => Some(db),
        Err(e) => {
            error!("Failed to open database {}: {:#}", config.db_path.display(), e);
            None
        }
    };

    let completion = config.provider.clone().map(|provider| {
        info!("Chat model: {}", provider.model());
        Arc::new(ProviderClient::new(provider)) as Arc<dyn Completion>
    });

    let mailer = config.mail.clone().map(|mail| {
        info!("Mail relay: Resend, from {}", mail.from);
        Arc::new(ResendMailer::new(mail.api_key, mail.from)) as Arc<dyn Mailer>
    });

    let state = Services {
        db,
        jwt_secret: config.jwt_secret.clone(),
        completion,
        mailer,
        totp_enabled: config.totp_enabled,
    }
    .into_state();
    state.capabilities.log();

    let origin = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            warn!("IPAJ_CORS_ORIGIN '{}' is not a valid origin; allowing any", config.cors_origin);
            AllowOrigin::any()
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    let app = ipaj_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("IPAJ server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Cannot install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
