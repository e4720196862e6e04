//! Application settings.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::PipelineConfig;
use crate::repository::{DieselDbContext, DieselError};
use crate::services::{
    DownloaderOptions, EnrichmentError, FetchError, LibreTranslateClient,
    YoutubeCommentDownloader,
};
use crate::work_queue::WorkerConfig;

use super::{DEFAULT_APP_NAME, DEFAULT_DATABASE_FILENAME};

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    /// Set via DATABASE_URL env var or the `database` field in config files.
    pub database_url: Option<String>,
    /// Name reported by the root endpoint.
    pub app_name: String,
    /// Base URL of the LibreTranslate service.
    pub libretranslate_url: String,
    pub libretranslate_api_key: Option<String>,
    /// Language comments are translated into before scoring.
    pub canonical_language: String,
    /// User agent for comment downloads.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Maximum comments pulled per video.
    pub max_comments: usize,
    /// Hours after which a finished video is reprocessed on request.
    pub reprocess_after_hours: i64,
    /// Minutes between sweeps for pending videos.
    pub sweep_interval_minutes: u64,
    /// Number of queue workers.
    pub workers: usize,
    /// Extra attempts for a failed job.
    pub max_retries: u32,
    /// Base retry delay in seconds.
    pub retry_backoff_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Default to the platform data dir, e.g. ~/.local/share/thumbsense/
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("thumbsense");

        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let downloader = DownloaderOptions::default();
        let pipeline = PipelineConfig::default();
        let worker = WorkerConfig::default();

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            app_name: DEFAULT_APP_NAME.to_string(),
            libretranslate_url: "http://localhost:6000/".to_string(),
            libretranslate_api_key: None,
            canonical_language: "en".to_string(),
            user_agent: downloader.user_agent,
            request_timeout: downloader.timeout.as_secs(),
            max_comments: pipeline.max_comments,
            reprocess_after_hours: pipeline.reprocess_after.num_hours(),
            sweep_interval_minutes: 5,
            workers: worker.workers,
            max_retries: worker.max_retries,
            retry_backoff_secs: worker.retry_backoff.as_secs(),
        }
    }

    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    /// Get the full path to the database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    /// Create a database context using the configured database URL or path.
    pub fn create_db_context(&self) -> Result<DieselDbContext, DieselError> {
        DieselDbContext::from_url(&self.database_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes.max(1) * 60)
    }

    /// Reprocessing threshold, or `None` if the hour count is negative or out of range.
    pub fn reprocess_after(&self) -> Option<chrono::Duration> {
        if self.reprocess_after_hours < 0 {
            return None;
        }
        chrono::Duration::try_hours(self.reprocess_after_hours)
    }

    /// Reject values that cannot be turned into runtime configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.reprocess_after().is_none() {
            return Err(format!(
                "Invalid reprocess_after_hours: {}",
                self.reprocess_after_hours
            ));
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            max_comments: self.max_comments,
            reprocess_after: self.reprocess_after().unwrap_or(defaults.reprocess_after),
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            workers: self.workers.max(1),
            max_retries: self.max_retries,
            retry_backoff: Duration::from_secs(self.retry_backoff_secs),
        }
    }

    /// Build the YouTube comment downloader.
    pub fn comment_source(&self) -> Result<YoutubeCommentDownloader, FetchError> {
        YoutubeCommentDownloader::new(DownloaderOptions {
            user_agent: self.user_agent.clone(),
            timeout: self.request_timeout(),
            ..DownloaderOptions::default()
        })
    }

    /// Build the LibreTranslate client.
    pub fn language_service(&self) -> Result<LibreTranslateClient, EnrichmentError> {
        LibreTranslateClient::new(
            &self.libretranslate_url,
            self.libretranslate_api_key.clone(),
            self.request_timeout(),
        )
    }
}
