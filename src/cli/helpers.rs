//! Shared helper functions for CLI commands.

use std::sync::Arc;

use console::style;

use thumbsense::config::Settings;
use thumbsense::pipeline::Pipeline;
use thumbsense::repository::DieselDbContext;
use thumbsense::services::{Enricher, VaderAnalyzer};
use thumbsense::work_queue::{LocalJobQueue, WorkerPool};

/// Everything a command needs to drive the pipeline.
pub struct Runtime {
    pub pipeline: Pipeline,
    pub queue: Arc<LocalJobQueue>,
    settings: Settings,
}

impl Runtime {
    /// Open the database (applying pending migrations) and wire the pipeline.
    pub async fn open(settings: &Settings) -> anyhow::Result<Self> {
        let ctx = open_database(settings).await?;

        let source = settings.comment_source()?;
        let language = settings.language_service()?;
        let enricher = Enricher::new(
            Arc::new(language),
            Arc::new(VaderAnalyzer),
            settings.canonical_language.as_str(),
        );

        let queue = Arc::new(LocalJobQueue::new());
        let pipeline = Pipeline::new(
            Arc::new(ctx),
            Arc::new(source),
            enricher,
            queue.clone(),
            settings.pipeline_config(),
        );

        Ok(Self {
            pipeline,
            queue,
            settings: settings.clone(),
        })
    }

    pub fn worker_pool(&self) -> WorkerPool<Pipeline> {
        WorkerPool::new(
            self.queue.clone(),
            Arc::new(self.pipeline.clone()),
            self.settings.worker_config(),
        )
    }

    /// Run workers until every queued job, and everything it enqueued, is done.
    pub async fn drain(&self) {
        if self.queue.in_flight() == 0 {
            return;
        }
        println!(
            "{} Processing {} queued job(s)...",
            style("→").cyan(),
            self.queue.in_flight()
        );
        self.worker_pool().drain().await;
    }
}

/// Create the database context and bring the schema up to date.
pub async fn open_database(settings: &Settings) -> anyhow::Result<DieselDbContext> {
    let ctx = settings.create_db_context()?;
    let applied = ctx.init_schema().await?;
    for name in &applied {
        tracing::info!("Applied migration {}", name);
    }
    Ok(ctx)
}

/// Render a score, or `n/a` when it is undefined.
pub fn format_score(value: f64) -> String {
    if value.is_finite() {
        format!("{:.4}", value)
    } else {
        "n/a".to_string()
    }
}
