//! Composition root shared by the command-line binaries.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use confsearch_core::config::{expand_path, load_index_config, Config, Settings};
use confsearch_embed::get_default_embedder;
use confsearch_hybrid::ConferenceSearch;
use confsearch_index::{get_default_backend, CancelToken, WorkerPool};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Logs to stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

/// A wired service plus the pool it runs on. Call [`App::shutdown`] before exit.
pub struct App {
    pub settings: Settings,
    pub service: ConferenceSearch,
    pool: Arc<WorkerPool>,
}

impl App {
    /// Reads settings from `CONFSEARCH_CONFIG_DIR`, or the working directory.
    pub fn from_config() -> anyhow::Result<Self> {
        let dir = env::var("CONFSEARCH_CONFIG_DIR").map_or_else(|_| PathBuf::from("."), expand_path);
        let config = Config::load_from(&dir)?;
        let settings = config.settings().context("loading settings")?;
        let index_config_path = config.index_config_path(&settings);
        let index_config = load_index_config(&index_config_path)
            .with_context(|| format!("loading index config {}", index_config_path.display()))?;
        Self::new(settings, index_config)
    }

    pub fn new(settings: Settings, index_config: Value) -> anyhow::Result<Self> {
        let backend = get_default_backend(&settings.elasticsearch)?;
        let embedder = get_default_embedder(&settings.embedding)?;
        let pool = Arc::new(WorkerPool::new(
            settings.indexing.worker_name.clone(),
            settings.indexing.workers,
            settings.indexing.queue_capacity,
        ));
        info!(
            "Using index '{}' at {} with {} embeddings",
            settings.elasticsearch.index,
            settings.elasticsearch.url,
            embedder.name()
        );
        let service = ConferenceSearch::from_settings(&settings, backend, embedder, Arc::clone(&pool), index_config);
        Ok(Self { settings, service, pool })
    }

    /// Shows a progress bar while indexing.
    #[must_use]
    pub fn with_progress(mut self) -> Self {
        self.service = self.service.with_progress(progress_bar());
        self
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

pub fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let template =
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} conferences ({percent}%) {msg}";
    if let Ok(style) = ProgressStyle::default_bar().template(template) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// A token cancelled on Ctrl-C.
pub fn cancel_on_ctrl_c() -> CancelToken {
    let token = CancelToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending batches");
            trigger.cancel();
        }
    });
    token
}
