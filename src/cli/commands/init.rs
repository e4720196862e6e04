//! Initialize command.

use console::style;

use crate::cli::helpers::open_database;
use thumbsense::config::Settings;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    settings.ensure_directories()?;

    let ctx = open_database(settings).await?;
    let tables = ctx.list_tables().await?;

    println!(
        "{} Initialized thumbsense in {} ({} tables)",
        style("✓").green(),
        settings.data_dir.display(),
        tables.len()
    );

    Ok(())
}
