use std::net::SocketAddr;

use axum::{Extension, Router, routing::get};
use tokio::net::TcpListener;

use crate::{api, errors::AuthError, types::SharedAuth};

pub async fn bind_callback_listener(addr: SocketAddr) -> Result<TcpListener, AuthError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| AuthError::Server { addr, source })
}

/// Serves `/health` and the provider callback route until the task is aborted.
pub async fn serve_callback(
    listener: TcpListener,
    callback_path: String,
    state: SharedAuth,
) -> std::io::Result<()> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route(&callback_path, get(api::callback).layer(Extension(state)));

    axum::serve(listener, app).await
}
