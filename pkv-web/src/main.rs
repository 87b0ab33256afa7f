//! pkv-web - Pakistan venue discovery service
//!
//! Loads the venue datasets and image mapping tables once at startup, then
//! serves the JSON API and server-rendered venue pages.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use pkv_common::config::{
    load_toml_config, locate_config_file, write_toml_config, RootFolderInitializer,
    RootFolderResolver, TomlConfig,
};
use pkv_common::contact::ContactInbox;
use pkv_common::images::{probe::probe_from_config, ImageMapping, ImageProbe, ImageResolver};
use pkv_common::Catalog;
use pkv_web::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for pkv-web
#[derive(Parser, Debug)]
#[command(name = "pkv-web")]
#[command(about = "Pakistan venue discovery service")]
#[command(version)]
struct Args {
    /// Root folder holding data/ and contact/
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Config file (default: ~/.config/pkv/config.toml, then /etc/pkv/config.toml)
    #[arg(short, long, env = "PKV_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind, overriding [server].host
    #[arg(long, env = "PKV_HOST")]
    host: Option<String>,

    /// Port to listen on, overriding [server].port
    #[arg(short, long, env = "PKV_PORT")]
    port: Option<u16>,

    /// Dataset directory, overriding data_dir from the config
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Load datasets and mapping tables, report, and exit
    #[arg(long)]
    check: bool,

    /// Write the effective configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts so [logging].level can seed the filter
    let config_path = locate_config_file(args.config.as_deref());
    let config = load_toml_config(config_path.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    // Build identification immediately after tracing init
    info!(
        "Starting PKV venue service (pkv-web) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file {} not found, using defaults", path.display()),
        None => info!("No config file, using defaults"),
    }

    if let Some(path) = &args.write_config {
        write_toml_config(&config, path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    let root_folder = RootFolderResolver::new("web")
        .with_cli_arg(args.root_folder.clone())
        .with_config(&config)
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;
    let root_folder = initializer.root_folder();

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data_dir(root_folder));
    info!("Data directory: {}", data_dir.display());

    let (catalog, report) = Catalog::load_dir(&data_dir)
        .with_context(|| format!("Failed to load datasets from {}", data_dir.display()))?;
    info!(
        venues = report.total_loaded(),
        rejected = report.total_rejected(),
        "✓ Catalog loaded"
    );

    let mapping = ImageMapping::load(&data_dir, &config.images).context("Failed to load image mapping")?;
    let probe = probe_from_config(&config.images, &data_dir).context("Failed to set up image probe")?;
    info!(
        mapping_entries = mapping.len(),
        probe = probe.name(),
        "✓ Image resolver ready"
    );

    if args.check {
        for (category, entry) in &report.categories {
            info!(
                category = %category,
                found = entry.found,
                loaded = entry.loaded,
                skipped = entry.skipped,
                duplicates = entry.duplicates,
                "Dataset check"
            );
        }
        info!("Check complete");
        return Ok(());
    }

    let images = ImageResolver::new(mapping, probe, config.images.clone());
    let contact = contact_inbox(&config, root_folder);

    let state = AppState::new(catalog, images, &config, contact);
    let app = build_router(state);

    let host = args.host.clone().unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    info!("pkv-web listening on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn contact_inbox(config: &TomlConfig, root_folder: &std::path::Path) -> Option<ContactInbox> {
    if !config.contact.enabled {
        info!("Contact form disabled");
        return None;
    }
    let dir = config.contact_dir(root_folder);
    info!("Contact inbox: {}", dir.display());
    Some(ContactInbox::new(&dir))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
