//! HTTP server and handlers for the plot browser.
//!
//! Routes:
//! - `GET /` use-case index, or the simple viewer with `?use_case=<name>`
//! - `GET /use_case/:use_case` paginated viewer
//! - `GET /page/:use_case/:page_size/:page_number/:hide_no_outlier/:hide_zero_std[/:search]`
//! - `GET /api/use_cases` use-case names as JSON
//! - `GET /files/:use_case/:file_name` a single `.svg` plot of a use case
//! - `GET /static/*` embedded script and stylesheet

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::data::filter::{get_page, PageQuery, PlotFilter};
use crate::data::loader::{ensure_use_case, is_plot_file_name, list_plots, list_use_cases};
use crate::data::model::PageResponse;
use crate::error::{BrowseError, Result};
use crate::state::{AppState, ServerConfig};
use crate::ui::{pages, STYLE_CSS, VIEWER_JS};

/// Build the router over `state.root`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/use_case/:use_case", get(paged_viewer_handler))
        .route(
            "/page/:use_case/:page_size/:page_number/:hide_no_outlier/:hide_zero_std",
            get(page_handler),
        )
        .route(
            "/page/:use_case/:page_size/:page_number/:hide_no_outlier/:hide_zero_std/:search",
            get(page_handler),
        )
        .route("/api/use_cases", get(use_cases_handler))
        .route("/static/viewer.js", get(viewer_js_handler))
        .route("/static/style.css", get(style_css_handler))
        .route("/files/:use_case/:file_name", get(file_handler))
        .with_state(Arc::new(state))
}

/// Start the HTTP server and run until Ctrl+C.
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let app = router(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let url = format!("http://{}", listener.local_addr()?);
    log::info!("Serving {} at {url}", config.root.display());

    if config.open_browser {
        open_browser(&url);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log::info!("Server stopped");
    Ok(())
}

fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    if let Err(e) = std::process::Command::new(opener).arg(url).spawn() {
        log::warn!("Could not open browser with {opener}: {e}");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

// --- Handlers ---

#[derive(Debug, Deserialize)]
struct IndexParams {
    use_case: Option<String>,
}

/// Use-case index, or every plot of `?use_case=` without pagination.
async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IndexParams>,
) -> Response {
    let result = match params.use_case {
        Some(use_case) => list_plots(state.root(), &use_case)
            .map(|records| pages::simple_viewer_page(&use_case, &records)),
        None => list_use_cases(state.root()).map(|use_cases| pages::index_page(&use_cases)),
    };
    html_or_error(result)
}

#[derive(Debug, Deserialize)]
struct ViewerParams {
    page_size: Option<i64>,
    page_number: Option<i64>,
}

async fn paged_viewer_handler(
    State(state): State<Arc<AppState>>,
    Path(use_case): Path<String>,
    Query(params): Query<ViewerParams>,
) -> Response {
    let page_size = params.page_size.unwrap_or(state.default_page_size);
    let result = if page_size <= 0 {
        Err(BrowseError::InvalidArgument(format!(
            "page size must be positive, got {page_size}"
        )))
    } else {
        ensure_use_case(state.root(), &use_case).map(|()| {
            pages::paged_viewer_page(&use_case, page_size, params.page_number.unwrap_or(0))
        })
    };
    html_or_error(result)
}

/// Serve one plot. Only `.svg` files of a listed use case are reachable;
/// sidecars, hidden entries and anything outside a use case are not.
async fn file_handler(
    State(state): State<Arc<AppState>>,
    Path((use_case, file_name)): Path<(String, String)>,
    request: Request,
) -> Result<Response> {
    ensure_use_case(state.root(), &use_case)?;
    if !is_plot_file_name(&file_name) {
        return Err(BrowseError::NotFound(format!("{use_case}/{file_name}")));
    }

    let path = state.root().join(&use_case).join(&file_name);
    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => Ok(response.map(Body::new)),
        Err(never) => match never {},
    }
}

/// Path segments of a `/page` request. `search` is absent on the shorter
/// route.
#[derive(Debug, Deserialize)]
struct PageParams {
    use_case: String,
    page_size: i64,
    page_number: i64,
    hide_no_outlier: u8,
    hide_zero_std: u8,
    #[serde(default)]
    search: Option<String>,
}

fn parse_flag(value: u8, name: &str) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(BrowseError::InvalidArgument(format!(
            "{name} must be 0 or 1, got {other}"
        ))),
    }
}

async fn page_handler(
    State(state): State<Arc<AppState>>,
    Path(params): Path<PageParams>,
) -> Result<Json<PageResponse>> {
    log::debug!("Page request {params:?}");

    let query = PageQuery {
        page_size: params.page_size,
        page_number: params.page_number,
        filter: PlotFilter {
            search: params.search,
            hide_no_outlier: parse_flag(params.hide_no_outlier, "hide_no_outlier")?,
            hide_zero_std: parse_flag(params.hide_zero_std, "hide_zero_std")?,
        },
    };

    let page = get_page(state.root(), &params.use_case, &query)?;
    log::debug!(
        "Serving page {}/{} of {} ({} plots)",
        page.page_number + 1,
        page.total_pages,
        params.use_case,
        page.records.len()
    );
    Ok(Json(PageResponse::from(&page)))
}

async fn use_cases_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>> {
    Ok(Json(list_use_cases(state.root())?.into_iter().collect()))
}

async fn viewer_js_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript")], VIEWER_JS)
}

async fn style_css_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], STYLE_CSS)
}

// --- Helpers ---

/// Unknown use cases get an HTML 404 page; other errors keep their plain-text
/// response.
fn html_or_error(result: Result<String>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(BrowseError::NotFound(use_case)) => {
            log::debug!("Unknown use case {use_case:?}");
            (
                StatusCode::NOT_FOUND,
                Html(pages::not_found_page(&format!("Wrong use case: {use_case}"))),
            )
                .into_response()
        }
        Err(e) => e.into_response(),
    }
}
