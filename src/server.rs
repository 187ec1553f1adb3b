use crate::app_config::AppConfig;
use crate::metrics::{Collector, Observation, content_type, render};
use crate::oxidized::Backend;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, instrument};

pub fn router<B: Backend + 'static>(collector: Arc<Collector<B>>, metrics_path: &str) -> Result<Router, ServeError> {
    validate_metrics_path(metrics_path)?;

    let router = Router::new().route(metrics_path, get(scrape::<B>));
    let router = if metrics_path == "/" {
        router
    } else {
        let index = index_page(metrics_path);
        router.route("/", get(move || async move { Html(index) }))
    };

    Ok(router.with_state(collector))
}

pub async fn serve<B: Backend + 'static>(collector: Collector<B>, config: &AppConfig) -> Result<(), ServeError> {
    let server = config.server();
    let app = router(Arc::new(collector), server.path())?;

    let listener = TcpListener::bind(("0.0.0.0", server.port())).await?;
    info!(port = server.port(), path = server.path(), "Listening");

    axum::serve(listener, app).await?;
    Ok(())
}

#[instrument(skip_all)]
async fn scrape<B: Backend + 'static>(State(collector): State<Arc<Collector<B>>>) -> Response {
    let (tx, mut rx) = mpsc::unbounded_channel::<Observation>();
    collector.collect(&tx).await;
    drop(tx);

    let mut observations = Vec::new();
    while let Some(observation) = rx.recv().await {
        observations.push(observation);
    }

    match render(&observations) {
        Ok(body) => ([(header::CONTENT_TYPE, content_type())], body).into_response(),
        Err(e) => {
            error!("❌ Could not render metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

// The router rejects captures and wildcards at registration time by panicking
fn validate_metrics_path(metrics_path: &str) -> Result<(), ServeError> {
    let invalid_segment = |segment: &str| segment.contains(['{', '}']) || segment.starts_with([':', '*']);
    if !metrics_path.starts_with('/') || metrics_path.split('/').any(invalid_segment) {
        return Err(ServeError::InvalidPath(metrics_path.to_string()));
    }
    Ok(())
}

fn index_page(metrics_path: &str) -> String {
    format!(
        "<html><head><title>Oxidized Exporter</title></head><body><h1>Oxidized Exporter</h1><p><a href=\"{}\">Metrics</a></p></body></html>",
        metrics_path
    )
}

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("metrics path '{0}' must start with '/' and must not contain captures or wildcards")]
    InvalidPath(String),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}
