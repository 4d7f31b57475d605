//! # Library admin demo
//!
//! Serves an admin panel for a small library catalog stored in SQLite.
//!
//! ```bash
//! cargo run --package library-admin -- --seed
//! cargo run --package library-admin -- --config library.toml --bind 0.0.0.0:8080
//! ```
//!
//! Settings come from an optional TOML file and `MODELADMIN_*` environment
//! variables.

mod models;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use axum::http::{header, HeaderValue};
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::set_header::SetResponseHeaderLayer;

use modeladmin::db::Engine;
use modeladmin::{Admin, InMemoryEngine, Model, SqliteEngine};
use modeladmin_core::logging::setup_logging;
use modeladmin_core::{settings_loader, AdminSettings};

/// Command-line options.
#[derive(Debug, Parser)]
#[command(name = "library-admin", about = "Admin panel for a library catalog")]
struct Cli {
    /// TOML settings file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database file.
    #[arg(short, long, default_value = "library.db")]
    database: PathBuf,

    /// Keep everything in memory instead of SQLite.
    #[arg(long)]
    memory: bool,

    /// Insert sample authors and books on startup.
    #[arg(long)]
    seed: bool,

    /// Address to listen on.
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: SocketAddr,
}

fn load_settings(cli: &Cli) -> anyhow::Result<AdminSettings> {
    match &cli.config {
        Some(path) => settings_loader::from_toml_file_with_env(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(settings_loader::from_env()),
    }
}

async fn open_engine(cli: &Cli) -> anyhow::Result<Arc<dyn Engine>> {
    if cli.memory {
        tracing::info!("Using in-memory engine");
        return Ok(Arc::new(InMemoryEngine::new()));
    }
    let engine = SqliteEngine::open(&cli.database)
        .with_context(|| format!("opening {}", cli.database.display()))?;
    engine
        .create_all(&[models::Author::meta(), models::Book::meta()])
        .await
        .context("creating tables")?;
    tracing::info!(path = %cli.database.display(), "Using SQLite engine");
    Ok(Arc::new(engine))
}

/// Builds the host application with the admin mounted.
fn build_app(settings: AdminSettings, engine: Arc<dyn Engine>) -> anyhow::Result<Router> {
    let mut admin = Admin::with_settings(settings, engine).middleware(
        SetResponseHeaderLayer::if_not_present(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY")),
    );
    for view in models::views() {
        admin.add_view(view);
    }

    let base_url = admin.settings().base_url.clone();
    let host = if base_url.is_empty() {
        Router::new()
    } else {
        Router::new().route("/", get(move || async move { Redirect::to(&base_url) }))
    };
    Ok(admin.mount(host)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    setup_logging(&settings);

    let engine = open_engine(&cli).await?;
    if cli.seed {
        models::seed(engine.as_ref()).await.context("seeding catalog")?;
    }

    let app = build_app(settings, engine)?;
    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("binding {}", cli.bind))?;
    tracing::info!(address = %cli.bind, "Library admin listening");
    axum::serve(listener, app).await?;
    Ok(())
}
