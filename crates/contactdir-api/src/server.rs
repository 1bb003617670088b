use crate::{create_router, AppState};
use anyhow::{Context, Result};
use contactdir_core::Settings;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

pub struct Server {
    state: AppState,
    addr: String,
}

impl Server {
    pub fn new(settings: Settings) -> Result<Self> {
        let addr = format!("{}:{}", settings.server.host, settings.server.port);
        let state = AppState::new(settings).context("seeding contact directory")?;
        Ok(Self { state, addr })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run(self) -> Result<()> {
        let guarded = self.state.token_digest().is_some();
        let router = create_router(self.state);

        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("binding {}", self.addr))?;
        let local = listener.local_addr().context("reading bound address")?;

        info!("Contact directory listening on http://{}", local);
        info!("  GET  /healthz");
        info!("  GET  /contact/{{id}} - detail with previous/next links");
        info!("  GET  /api/contact/list");
        info!("  GET  /api/contact/{{id}}");
        info!("  PUT  /api/contact/{{id}}");
        info!("  POST /api/contact/add");
        info!("  GET  /api-docs/openapi.json");
        if guarded {
            info!("Bearer token required on /api routes");
        }

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("serving HTTP")?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully");
        },
    }
}
