use academi::{
    api::routes::create_router, auth::jwt::TokenCodec, AppState, AuthService, Config, DbClient,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config error: {}", e))?;

    let db = match &config.database.auth_token {
        Some(token) => {
            Arc::new(DbClient::new_remote(config.database.url.clone(), token.clone()).await?)
        }
        None => Arc::new(DbClient::new_local(&config.database.url).await?),
    };

    let codec = TokenCodec::new(
        config.auth.jwt_secret.clone(),
        config.auth.jwt_issuer.clone(),
        config.auth.access_expiry_secs,
    );
    let auth_service = Arc::new(AuthService::new(
        db.clone(),
        codec,
        config.auth.refresh_expiry_secs,
    ));

    // Hourly cleanup of expired refresh sessions and revocation entries.
    // Both purges are idempotent and safe alongside live traffic.
    let purge_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            if let Err(e) = purge_db.purge_expired_refresh_sessions().await {
                tracing::warn!(error = %e, "refresh session purge failed");
            }
            if let Err(e) = purge_db.purge_expired_revocations().await {
                tracing::warn!(error = %e, "revocation purge failed");
            }
        }
    });

    let state = AppState {
        config: Arc::new(config.clone()),
        db,
        auth_service: auth_service.clone(),
    };

    let app = create_router(auth_service)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(%addr, "academi-server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
