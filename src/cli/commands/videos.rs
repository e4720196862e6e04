//! Video intake, listing, and deletion commands.

use console::style;

use crate::cli::helpers::Runtime;
use thumbsense::config::Settings;
use thumbsense::models::ProcessingStatus;

/// Request a video and run the pipeline until it settles.
pub async fn cmd_request(settings: &Settings, video_id: &str) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;

    let video = runtime.pipeline.request_video(video_id).await?;
    println!(
        "{} Requested {} ({})",
        style("✓").green(),
        video.video_id,
        video.status
    );

    runtime.drain().await;

    let video = runtime.pipeline.get_video(video_id).await?;
    let status = match video.status {
        ProcessingStatus::Processed => style(video.status.to_string()).green(),
        ProcessingStatus::Failed => style(video.status.to_string()).red(),
        _ => style(video.status.to_string()).yellow(),
    };
    println!("  Video {} is {}", video.video_id, status);

    Ok(())
}

/// Start pending videos and run the pipeline until it settles.
pub async fn cmd_sweep(settings: &Settings) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;

    let started = runtime.pipeline.sweep_pending().await?;
    if started == 0 {
        println!("{} No pending videos", style("!").yellow());
        return Ok(());
    }

    println!("{} Started {} pending video(s)", style("→").cyan(), started);
    runtime.drain().await;
    println!("{} Sweep complete", style("✓").green());

    Ok(())
}

pub async fn cmd_videos(settings: &Settings, skip: usize, limit: usize) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;
    let videos = runtime.pipeline.list_videos(skip, limit).await?;

    if videos.is_empty() {
        println!("{} No videos", style("!").yellow());
        return Ok(());
    }

    println!("{:<13} {:<11} {:<25}", "VIDEO", "STATUS", "UPDATED");
    for video in videos {
        println!(
            "{:<13} {:<11} {:<25}",
            video.video_id,
            video.status,
            video.updated_at.to_rfc3339()
        );
    }

    Ok(())
}

pub async fn cmd_comments(
    settings: &Settings,
    video_id: &str,
    skip: usize,
    limit: usize,
) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;
    let comments = runtime
        .pipeline
        .list_comments(video_id, skip, limit)
        .await?;

    if comments.is_empty() {
        println!("{} No comments for {}", style("!").yellow(), video_id);
        return Ok(());
    }

    for comment in comments {
        let compound = comment
            .sentiment
            .map(|s| format!("{:+.3}", s.compound))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} [{}] {} votes, sentiment {}",
            style(&comment.comment_id).bold(),
            comment.status,
            comment.votes,
            compound
        );
        println!("  {}", comment.text.replace('\n', " "));
    }

    Ok(())
}

/// Delete a video and its comments.
pub async fn cmd_delete(settings: &Settings, video_id: &str) -> anyhow::Result<()> {
    let runtime = Runtime::open(settings).await?;
    runtime.pipeline.delete_video(video_id).await?;
    println!("{} Deleted {}", style("✓").green(), video_id);
    Ok(())
}
