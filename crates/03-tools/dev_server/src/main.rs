//! Static file server for trying guest modules in a browser.
//!
//! Serves a directory as-is (`.wasm` goes out as `application/wasm`, which
//! streaming instantiation requires). Cross-origin isolation headers are on
//! by default so pages may use `SharedArrayBuffer`.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderName, HeaderValue},
    Router,
};
use clap::Parser;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Static file server for wasm guest modules")]
struct Args {
    /// Directory to serve
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// File served for paths that do not exist, relative to the root
    #[arg(long)]
    index: Option<PathBuf>,

    /// Address to bind (ip or host)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Do not send COOP/COEP/CORP headers
    #[arg(long)]
    no_isolation: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let Args {
        root,
        index,
        host,
        port,
        no_isolation,
    } = Args::parse();

    let root = root
        .canonicalize()
        .with_context(|| format!("failed to locate {root:?}"))?;

    let index_path = index.as_deref().and_then(|index| resolve_index(&root, index));
    if let (Some(index), None) = (&index, &index_path) {
        warn!("index {} not found, serving without fallback", index.display());
    }

    let app = build_app(root.clone(), index_path, !no_isolation);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("failed to parse bind address")?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind listener on {addr}"))?;

    info!("serving {} on http://{}", root.display(), addr);

    let server = axum::serve(listener, app.into_make_service());

    tokio::select! {
        result = server => result.context("server exited with error")?,
        _ = signal::ctrl_c() => {
            warn!("received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));

    // Ignore error if already set (e.g., during tests).
    let _ = fmt().with_env_filter(env_filter).try_init();
}

fn resolve_index(root: &Path, index: &Path) -> Option<PathBuf> {
    let index_path = if index.is_absolute() {
        index.to_path_buf()
    } else {
        root.join(index)
    };

    index_path.is_file().then_some(index_path)
}

fn build_app(root: PathBuf, index_path: Option<PathBuf>, isolation: bool) -> Router {
    let assets = ServeDir::new(root).append_index_html_on_directories(true);

    let router = match index_path {
        Some(index) => Router::new().fallback_service(assets.fallback(ServeFile::new(index))),
        None => Router::new().fallback_service(assets),
    };

    let router = if isolation {
        router.layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("cross-origin-opener-policy"),
                    HeaderValue::from_static("same-origin"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("cross-origin-embedder-policy"),
                    HeaderValue::from_static("require-corp"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    HeaderName::from_static("cross-origin-resource-policy"),
                    HeaderValue::from_static("same-origin"),
                ))
                .into_inner(),
        )
    } else {
        router
    };

    router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            ))
            .layer(TraceLayer::new_for_http())
            .into_inner(),
    )
}
