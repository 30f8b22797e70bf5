//! vitrine
//!
//! Opens a showcase window for a site manifest, or the built-in bookshelf
//! page when no manifest is given.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use vitrine::{config::SiteManifest, VitrineApp};

#[derive(Parser)]
#[command(name = "vitrine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive 3D showcase viewer", long_about = None)]
struct Cli {
    /// Site manifest (JSON). Defaults to the bookshelf page.
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Model to display, overriding the manifest's asset
    #[arg(short, long)]
    asset: Option<PathBuf>,

    /// Base URL of the story API, overriding the manifest
    #[arg(long)]
    api_url: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut manifest = match &cli.manifest {
        Some(path) => SiteManifest::load(path)?,
        None => SiteManifest::default_site(),
    };
    if let Some(asset) = cli.asset {
        manifest.asset = asset;
        manifest.base_dir = None;
    }
    if let Some(url) = cli.api_url {
        manifest.api_base_url = url;
    }

    log::info!("Showing {}", manifest.asset_path().display());
    VitrineApp::new(manifest)?.run()
}
