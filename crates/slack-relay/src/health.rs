use axum::Router;

/// Serve liveness probes on `port`.
///
/// Every request, whatever its method or path, is answered with `200 ok`.
/// A bind failure is logged and the probe server gives up without taking
/// the relay down with it.
pub async fn start_health_server(port: u16) {
    let app = Router::new().fallback(|| async { "ok" });
    let addr = format!("0.0.0.0:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, addr = %addr, "Failed to bind health check port");
            return;
        }
    };
    tracing::info!(addr = %addr, "Health check server listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Health check server error");
    }
}
