pub mod api;
pub mod services;
pub mod session;

use std::sync::Arc;
use common::config::Settings;
use common::Result;
use tokio::net::TcpListener;
use std::net::SocketAddr;
use tracing::{error, info};

pub use session::{ReportSession, SearchOutcome};

/// Fetches the directory once, then serves the report API until shut down.
pub async fn run_report_server(settings: &Settings) -> Result<()> {
    let mut session = ReportSession::from_settings(settings)?;

    // A missing session is not fatal: the operator can retry via /api/refresh.
    if session.is_signed_in() {
        match session.refresh().await {
            Ok(snapshot) => info!(records = snapshot.len(), "Initial directory snapshot loaded"),
            Err(e) => error!(error = %e, "Initial directory fetch failed"),
        }
    }

    let state = Arc::new(api::AppState::new(session));
    let api_router = api::routes(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], settings.api_port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Report API server listening");
    axum::serve(listener, api_router).await?;

    Ok(())
}
