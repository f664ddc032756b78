use axum::Router;
use log::{error, info};
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::server::routes::build_router;
use crate::server::state::AppState;

pub struct Server {
    listener: TcpListener,
    router: Router,
}

impl Server {
    /// Prepares the base directory and hub client, then binds the listener.
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        info!(
            "Base directory: {}",
            state.files.resolver().base().display()
        );
        if state.hub.is_configured() {
            info!(
                "Hub API configured (timeout {}s)",
                config.hub.request_timeout_secs
            );
        } else {
            info!("No hub URL configured; hub endpoints will answer 503");
        }

        let socket = config.server.socket();
        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(ServerError::Bind(socket, e));
            }
        };

        Ok(Self {
            listener,
            router: build_router(state),
        })
    }

    pub async fn start(self) -> Result<(), ServerError> {
        if let Ok(addr) = self.listener.local_addr() {
            info!("Serving file tools on http://{}", addr);
        }
        axum::serve(self.listener, self.router)
            .await
            .map_err(ServerError::Serve)
    }
}
