//! Command-line interface for khanviewer.
//!
//! Drives the view-model headless: list playlists and videos, resolve
//! videos through the cache, inspect the cache and download the catalog.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{load_config, ResolvedConfig};
use crate::core::{Field, MainViewModel, Shell, UiDispatcher, UiThread};
use crate::library::{Catalog, CatalogClient};
use crate::store::FileStore;

/// khanviewer - local video cache for playlist viewers
#[derive(Parser, Debug)]
#[command(name = "khanviewer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List playlists in the catalog
    Playlists {
        /// Only show playlists in this group
        #[arg(short, long)]
        group: Option<String>,
    },

    /// List the videos of a playlist
    Videos {
        /// Playlist name
        playlist: String,
    },

    /// Resolve a video through the cache and print it as JSON
    Resolve {
        /// Playlist name
        playlist: String,

        /// Video name
        video: String,
    },

    /// List videos in the local cache
    Cached,

    /// Download the catalog document
    Sync {
        /// Catalog URL (defaults to network.catalog_url from config)
        #[arg(long, env = "KHANVIEWER_CATALOG_URL")]
        url: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Shell used when running headless: alerts go to stderr
#[derive(Debug, Default)]
pub struct ConsoleShell;

impl Shell for ConsoleShell {
    fn notify_changed(&mut self, field: Field) {
        tracing::debug!(field = %field, "Property changed");
    }

    fn show_user_message(&mut self, text: &str) {
        eprintln!("[error] {}", text);
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config()?;

        match self.command {
            Commands::Playlists { group } => list_playlists(&config, group.as_deref()).await,
            Commands::Videos { playlist } => list_videos(&config, &playlist).await,
            Commands::Resolve { playlist, video } => {
                resolve_video(&config, &playlist, &video).await
            }
            Commands::Cached => list_cached(&config).await,
            Commands::Sync { url } => sync_catalog(&config, url).await,
            Commands::Config => show_config(&config),
        }
    }
}

/// Build the view-model with its UI thread from configuration
async fn open(config: &ResolvedConfig) -> Result<(MainViewModel, UiThread<ConsoleShell>)> {
    let catalog = Catalog::load(&config.catalog_path)
        .await
        .context("Failed to load catalog")?;
    let store = Arc::new(FileStore::new(&config.cache_dir));
    let (ui, thread) = UiDispatcher::spawn(ConsoleShell)?;

    let model = MainViewModel::new(Arc::new(catalog), store, ui);
    model.load_data();

    Ok((model, thread))
}

async fn close(model: MainViewModel, thread: UiThread<ConsoleShell>) -> Result<()> {
    model.shutdown().await;
    drop(model);
    thread.join()?;
    Ok(())
}

async fn list_playlists(config: &ResolvedConfig, group: Option<&str>) -> Result<()> {
    let (model, thread) = open(config).await?;

    let playlists: Vec<_> = model
        .playlists()
        .into_iter()
        .filter(|p| group.is_none() || p.group.as_deref() == group)
        .collect();

    if playlists.is_empty() {
        println!("No playlists found");
    } else {
        println!("{:<40} {:<20} {:>6}", "PLAYLIST", "GROUP", "VIDEOS");
        println!("{}", "-".repeat(68));
        for playlist in playlists {
            println!(
                "{:<40} {:<20} {:>6}",
                playlist.name,
                playlist.group.as_deref().unwrap_or("-"),
                playlist.video_count()
            );
        }
    }

    close(model, thread).await
}

async fn list_videos(config: &ResolvedConfig, playlist_name: &str) -> Result<()> {
    let (model, thread) = open(config).await?;

    let playlist = model.get_playlist(playlist_name)?;
    for video in playlist.load_videos() {
        let marker = if model.resolver().is_cached(&video.key()).await {
            "*"
        } else {
            " "
        };
        println!("{} {:<40} {}", marker, video.name, video.title);
    }

    close(model, thread).await
}

async fn resolve_video(config: &ResolvedConfig, playlist: &str, video: &str) -> Result<()> {
    let (model, thread) = open(config).await?;

    let resolved = model.resolve_video(playlist, video).await;
    let result = match resolved {
        Some(item) => {
            println!("{}", serde_json::to_string_pretty(&item)?);
            Ok(())
        }
        None if model.is_error() => Err(anyhow::anyhow!(
            "{}",
            model.error_message().unwrap_or_default()
        )),
        None => Err(anyhow::anyhow!("Video not found: {}/{}", playlist, video)),
    };

    close(model, thread).await?;
    result
}

async fn list_cached(config: &ResolvedConfig) -> Result<()> {
    let store = FileStore::new(&config.cache_dir);
    let entries = store.list().await?;

    if entries.is_empty() {
        println!("Cache is empty");
        return Ok(());
    }

    println!("{:<50} {:<25}", "VIDEO", "CACHED AT");
    println!("{}", "-".repeat(75));
    for entry in entries {
        println!(
            "{:<50} {:<25}",
            entry.video.key().to_string(),
            entry.cached_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

async fn sync_catalog(config: &ResolvedConfig, url: Option<String>) -> Result<()> {
    let url = url
        .or_else(|| config.catalog_url.clone())
        .context("No catalog URL given. Use --url or set network.catalog_url")?;

    let (ui, thread) = UiDispatcher::spawn(ConsoleShell)?;
    let session = crate::core::SessionState::new(ui);
    let client = CatalogClient::new(config.http_timeout)?;

    let result = client.sync(&url, &config.catalog_path, &session).await;
    if let Err(e) = &result {
        session.set_error(format!("Catalog sync failed: {:#}", e));
    }

    session.ui().flush().await;
    drop(session);
    thread.join()?;

    let catalog = result?;
    println!(
        "Synced {} groups and {} playlists to {}",
        catalog.groups().len(),
        catalog.len(),
        config.catalog_path.display()
    );
    Ok(())
}

fn show_config(config: &ResolvedConfig) -> Result<()> {
    println!("home:         {}", config.home.display());
    println!("catalog:      {}", config.catalog_path.display());
    println!("cache:        {}", config.cache_dir.display());
    println!(
        "catalog_url:  {}",
        config.catalog_url.as_deref().unwrap_or("(none)")
    );
    println!("http_timeout: {}s", config.http_timeout.as_secs());
    match &config.config_file {
        Some(path) => println!("config_file:  {}", path.display()),
        None => println!("config_file:  (none)"),
    }
    Ok(())
}
