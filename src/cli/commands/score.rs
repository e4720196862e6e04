//! Score command.

use console::style;

use crate::cli::helpers::{format_score, Runtime};
use thumbsense::config::Settings;
use thumbsense::error::ServiceError;

/// Print the sentiment summary for a video.
pub async fn cmd_score(settings: &Settings, video_id: &str, json: bool) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;

    let summary = match runtime.pipeline.score_video(video_id).await {
        Ok(summary) => summary,
        Err(ServiceError::NotFound(msg)) => {
            println!("{} {}", style("!").yellow(), msg);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {}", style("Video").bold(), summary.video_id);
    println!("  Comments: {}", summary.comment_count);
    println!("  Mean:     {}", format_score(summary.sentiment_score));
    println!("  Std:      {}", format_score(summary.sentiment_score_std));
    println!("  Min:      {}", format_score(summary.sentiment_score_min));
    println!("  Max:      {}", format_score(summary.sentiment_score_max));

    Ok(())
}
