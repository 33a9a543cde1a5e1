use axum::ServiceExt;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tower::Layer;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod blog;
mod config;
mod query;
mod routes;
mod rpc;
mod ssg;
mod state;
mod store;
mod transformer;
mod view;
mod viewer;

#[derive(Debug, Parser)]
#[command(version, about = "Server-rendered blog post pages with a hydrated query cache")]
struct Cli {
    /// TOML config file; defaults are used when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve post pages and the procedure endpoint
    Serve {
        /// Serve a small in-memory set of demo posts instead of the store on disk
        #[arg(long)]
        seed: bool,
    },
    /// Render a post the way the page's client would
    View {
        id: String,
        /// Server to load the page from
        #[arg(long, default_value = "http://localhost:8010")]
        url: String,
        /// Produce the page in process against the configured store instead
        #[arg(long, conflicts_with = "url")]
        local: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => config::load(path).await?,
        None => config::Config::default(),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Serve { seed } => serve(config, seed).await,
        Command::View { id, url, local } => {
            let html = if local {
                let store = Arc::new(store::FsStore::new(&config.store.path));
                viewer::view_local(&state::State::new(&config, store), &id).await?
            } else {
                viewer::view_remote(&url, &id, config.transformer).await?
            };

            println!("{html}");
            Ok(())
        }
    }
}

async fn serve(config: config::Config, seed: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store: Arc<dyn store::PostStore> = if seed {
        tracing::info!("Serving in-memory demo posts");
        Arc::new(store::MemoryStore::demo())
    } else {
        tracing::info!(path = %config.store.path.display(), "Serving posts from disk");
        Arc::new(store::FsStore::new(&config.store.path))
    };

    let cors = match config.cors_origin.as_deref() {
        Some(origin) => CorsLayer::new()
            .allow_origin(tower_http::cors::AllowOrigin::exact(
                axum::http::HeaderValue::from_str(origin)?,
            ))
            .allow_headers(tower_http::cors::Any),
        None => CorsLayer::new(),
    };

    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        transformer = ?config.transformer,
        "Listening for connections"
    );

    let state = Arc::new(state::State::new(&config, store));
    let app = NormalizePathLayer::trim_trailing_slash().layer(routes::app(state).layer(cors));

    axum::serve(
        listener,
        ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Error listening for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
