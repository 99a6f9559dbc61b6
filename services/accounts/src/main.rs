use std::sync::Arc;

use sea_orm::Database;
use tracing::info;

use unilink_accounts::config::AccountsConfig;
use unilink_accounts::infra::mailer::HttpMailer;
use unilink_accounts::limiter::{LoginLimiter, LoginLimiterConfig};
use unilink_accounts::router::build_router;
use unilink_accounts::state::AppState;

#[tokio::main]
async fn main() {
    unilink_core::tracing::init_tracing();

    let config = AccountsConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let mailer = HttpMailer::new(
        config.mail_api_url.clone(),
        config.mail_api_key.clone(),
        config.mail_sender.clone(),
    );

    let login_limiter = Arc::new(LoginLimiter::new(LoginLimiterConfig {
        max_failures: config.login_max_failures,
        window_secs: config.login_window_secs,
        lock_secs: config.login_lock_secs,
    }));

    let addr = format!("0.0.0.0:{}", config.accounts_port);
    let state = AppState {
        db,
        mailer,
        login_limiter,
        config: Arc::new(config),
    };

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("accounts service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
