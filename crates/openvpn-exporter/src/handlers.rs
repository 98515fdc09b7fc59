//! HTTP request handlers: metrics scrape and landing page.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use tracing::{debug, error};

use openvpn_exporter_core::collector::{Collector, FileSystem};

use crate::registry::RegistrySink;

/// Shared, read-only exporter state.
pub(crate) struct AppState<F: FileSystem> {
    pub(crate) collector: Collector<F>,
    pub(crate) telemetry_path: String,
}

pub(crate) type SharedState<F> = Arc<AppState<F>>;

// ============================================================
// Metrics
// ============================================================

/// Runs one collection pass into a fresh registry and renders it.
pub(crate) async fn handle_metrics<F: FileSystem + 'static>(
    State(state): State<SharedState<F>>,
) -> Response {
    // Status files are read with blocking I/O.
    let result = tokio::task::spawn_blocking(move || {
        let mut sink = RegistrySink::new();
        let summary = state.collector.collect(&mut sink);
        debug!(
            families = sink.family_count(),
            up = summary.sources_up,
            down = summary.sources_down,
            "scrape collected"
        );
        sink.encode().map_err(|e| e.to_string())
    })
    .await;

    match result {
        Ok(Ok(body)) => (
            [(header::CONTENT_TYPE, RegistrySink::content_type())],
            body,
        )
            .into_response(),
        Ok(Err(e)) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
        Err(e) => {
            error!(error = %e, "scrape panicked in spawn_blocking");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// ============================================================
// Landing page
// ============================================================

pub(crate) async fn handle_index<F: FileSystem + 'static>(
    State(state): State<SharedState<F>>,
) -> Html<String> {
    Html(landing_page(&state.telemetry_path))
}

fn landing_page(telemetry_path: &str) -> String {
    format!(
        "<html>\n\
         <head><title>OpenVPN Exporter</title></head>\n\
         <body>\n\
         <h1>OpenVPN Exporter</h1>\n\
         <p><a href=\"{}\">Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        telemetry_path
    )
}
