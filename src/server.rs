// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP tile server.
//!
//! Routes:
//! - `GET /tile/{z}/{x}/{y}` renders (or fetches from cache) one PNG tile
//! - `GET /assets/*` serves files from the configured assets directory
//! - `GET /` serves the configured index page

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{debug, error, info, warn};
use tile_render::{TileParseError, TileRequest, TileService};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;

use crate::config::AppConfig;

#[derive(Debug)]
struct AppState {
    service: Arc<TileService>,
    index_path: PathBuf,
}

/// Build the application router.
pub fn router(service: Arc<TileService>, config: &AppConfig) -> Router {
    let state = Arc::new(AppState {
        service,
        index_path: config.index_path.clone(),
    });

    Router::new()
        .route("/", get(index))
        .route("/tile/{*path}", get(tile))
        .nest_service("/assets", ServeDir::new(&config.assets_dir))
        .layer(middleware::from_fn(log_request))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(service: Arc<TileService>, config: &AppConfig) -> Result<()> {
    let app = router(service, config);
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!("listening on http://{}", config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    debug!("{method} {path} -> {}", response.status());
    response
}

async fn index(State(state): State<Arc<AppState>>) -> Response {
    match tokio::fs::read_to_string(&state.index_path).await {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            warn!("index page {}: {e}", state.index_path.display());
            (StatusCode::NOT_FOUND, "index page not found").into_response()
        }
    }
}

async fn tile(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    let parsed = match path.split('/').collect::<Vec<_>>().as_slice() {
        [zoom, x, y] => TileRequest::from_parts(zoom, x, y),
        _ => Err(TileParseError::InvalidFormat(path.clone())),
    };
    let request = match parsed {
        Ok(request) => request,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    let service = Arc::clone(&state.service);
    match tokio::task::spawn_blocking(move || service.render(request)).await {
        Ok(Ok(rendered)) => (
            [(header::CONTENT_TYPE, "image/png")],
            rendered.bytes.to_vec(),
        )
            .into_response(),
        Ok(Err(e)) => {
            error!("failed to render tile {request}: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error rendering tile {request}: {e}"),
            )
                .into_response()
        }
        Err(e) => {
            error!("render task for tile {request} failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error rendering tile {request}"),
            )
                .into_response()
        }
    }
}
