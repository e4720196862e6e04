//! Video intake, startup, sweeping, and the read/delete surface.

use tracing::{debug, info, warn};

use super::Pipeline;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{is_valid_video_id, Comment, ProcessingStatus, Video};
use crate::work_queue::Job;

impl Pipeline {
    /// Register interest in a video and schedule processing when needed.
    ///
    /// New videos are created `Pending` and started. Finished videos whose
    /// last transition is older than the reprocessing threshold are reset
    /// to `Pending` and started again. Everything else is returned as is.
    pub async fn request_video(&self, video_id: &str) -> ServiceResult<Video> {
        if !is_valid_video_id(video_id) {
            return Err(ServiceError::InvalidVideoId);
        }

        let now = self.now();

        let video = match self.store.get_video(video_id).await? {
            Some(video) => video,
            None => {
                let video = Video::new(video_id, now);
                if self.store.insert_video(&video).await? {
                    info!(video_id, "Registered new video");
                    self.queue.enqueue(Job::StartVideo {
                        video_id: video_id.to_string(),
                    })
                    .await?;
                    return Ok(video);
                }
                // Lost an insert race; fall through with whatever won.
                self.load_video(video_id).await?
            }
        };

        match video.status {
            ProcessingStatus::Pending => {
                debug!(video_id, "Video already pending");
                Ok(video)
            }
            ProcessingStatus::Processing => {
                debug!(video_id, "Video is being processed");
                Ok(video)
            }
            status @ (ProcessingStatus::Processed | ProcessingStatus::Failed) => {
                if !video.is_stale(now, self.config.reprocess_after) {
                    debug!(video_id, %status, "Video is fresh, not reprocessing");
                    return Ok(video);
                }

                let reset = self
                    .store
                    .transition_video(video_id, status, ProcessingStatus::Pending, now)
                    .await?;
                if !reset {
                    debug!(video_id, "Video changed while resetting, leaving it");
                    return self.load_video(video_id).await;
                }

                info!(video_id, previous = %status, "Reprocessing stale video");
                self.queue
                    .enqueue(Job::StartVideo {
                        video_id: video_id.to_string(),
                    })
                    .await?;

                self.load_video(video_id).await
            }
        }
    }

    /// Move a pending video to processing and schedule its fetch.
    pub(crate) async fn start_video(&self, video_id: &str) -> ServiceResult<()> {
        let Some(video) = self.store.get_video(video_id).await? else {
            warn!(video_id, "Video not found, not starting");
            return Ok(());
        };

        if video.status != ProcessingStatus::Pending {
            info!(video_id, status = %video.status, "Video is not pending, not starting");
            return Ok(());
        }

        self.begin_fetch(video_id).await?;
        Ok(())
    }

    /// Start every pending video. Returns how many were started.
    pub async fn sweep_pending(&self) -> ServiceResult<usize> {
        let pending = self
            .store
            .list_videos_by_status(ProcessingStatus::Pending)
            .await?;

        if pending.is_empty() {
            debug!("No pending videos found");
            return Ok(0);
        }

        info!("{} pending video(s) found", pending.len());

        let mut started = 0;
        for video in pending {
            if self.begin_fetch(&video.video_id).await? {
                started += 1;
            }
        }
        Ok(started)
    }

    /// Claim a pending video and enqueue its fetch. Returns `false` if
    /// someone else claimed it first.
    async fn begin_fetch(&self, video_id: &str) -> ServiceResult<bool> {
        let claimed = self
            .store
            .transition_video(
                video_id,
                ProcessingStatus::Pending,
                ProcessingStatus::Processing,
                self.now(),
            )
            .await?;

        if !claimed {
            debug!(video_id, "Video already claimed");
            return Ok(false);
        }

        info!(video_id, "Processing video");
        self.queue
            .enqueue(Job::FetchComments {
                video_id: video_id.to_string(),
            })
            .await?;
        Ok(true)
    }

    /// Get a video by id.
    pub async fn get_video(&self, video_id: &str) -> ServiceResult<Video> {
        self.load_video(video_id).await
    }

    /// Page through tracked videos.
    pub async fn list_videos(&self, skip: usize, limit: usize) -> ServiceResult<Vec<Video>> {
        Ok(self.store.list_videos(skip, limit).await?)
    }

    /// Page through a video's comments.
    pub async fn list_comments(
        &self,
        video_id: &str,
        skip: usize,
        limit: usize,
    ) -> ServiceResult<Vec<Comment>> {
        Ok(self.store.list_comments(video_id, skip, limit).await?)
    }

    /// Delete a video and all of its comments.
    pub async fn delete_video(&self, video_id: &str) -> ServiceResult<()> {
        if self.store.delete_video(video_id).await? {
            info!(video_id, "Deleted video");
            Ok(())
        } else {
            Err(ServiceError::NotFound("Video not found".to_string()))
        }
    }

    async fn load_video(&self, video_id: &str) -> ServiceResult<Video> {
        self.store
            .get_video(video_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Video not found".to_string()))
    }
}
