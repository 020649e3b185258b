use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::auth::AuthError;
use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::client::{ApiError, IngestRequest, VideoMetadata, VideoPlatform};
use crate::config::IngestMode;
use crate::container::{registration_request, ContainerKind};
use crate::source::{SourceError, SourceResult, VideoRow};
use crate::validate::{normalize_tags, validate_video_url, ValidationError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
    #[error(transparent)]
    Source(#[from] SourceError),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Terminal state of one row.
#[derive(Debug)]
pub enum RowOutcome {
    /// Every call for the row succeeded and the checkpoint advanced.
    Checkpointed,
    /// Validation rejected the row; it was never submitted.
    Skipped { reason: ValidationError },
    /// The platform rejected a call; the row is left un-checkpointed so a
    /// re-run retries it.
    Failed { error: ApiError },
}

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Rows processed this pass (rows resumed past are not counted).
    pub attempted: u64,
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// Per-row ingestion workflow: validate, create the media object, attach
/// the source by mode, optionally ingest images, then advance the
/// checkpoint. Rows at or below the stored checkpoint are passed over, so
/// an interrupted batch resumes instead of re-submitting.
pub struct Ingestor<P> {
    platform: P,
    checkpoint: CheckpointStore,
    mode: IngestMode,
    profile: String,
}

impl<P: VideoPlatform> Ingestor<P> {
    pub fn new(
        platform: P,
        checkpoint: CheckpointStore,
        mode: IngestMode,
        profile: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            checkpoint,
            mode,
            profile: profile.into(),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Drives a full pass over `rows`, resuming from the stored checkpoint.
    /// Row-local failures are logged and skipped; authentication failures
    /// abort the run.
    pub async fn run<I>(&mut self, rows: I) -> IngestResult<RunSummary>
    where
        I: IntoIterator<Item = SourceResult<VideoRow>>,
    {
        let resume_from = self.checkpoint.load()?;
        if let Some(last) = resume_from {
            info!(last_processed = last, "resuming after checkpointed row");
        }

        let mut summary = RunSummary::default();
        for row in rows {
            let row = row?;
            if resume_from.is_some_and(|last| row.index <= last) {
                debug!(row = row.index, "already processed, skipping");
                continue;
            }
            summary.attempted += 1;
            match self.process_row(&row).await? {
                RowOutcome::Checkpointed => summary.succeeded += 1,
                RowOutcome::Skipped { .. } => summary.skipped += 1,
                RowOutcome::Failed { .. } => summary.failed += 1,
            }
        }

        if self.checkpoint.clear()? {
            info!(
                path = %self.checkpoint.path().display(),
                "cleared recorded csv row, processing is complete"
            );
        } else {
            debug!(
                path = %self.checkpoint.path().display(),
                "checkpoint already empty"
            );
        }
        info!(
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            "csv processing finished"
        );
        Ok(summary)
    }

    async fn process_row(&mut self, row: &VideoRow) -> IngestResult<RowOutcome> {
        let tags = match normalize_tags(&row.tags) {
            Ok(tags) => tags,
            Err(reason) => return Ok(self.skip(row, reason)),
        };
        if let Err(reason) = validate_video_url(&row.video_url, self.mode) {
            return Ok(self.skip(row, reason));
        }

        let metadata = VideoMetadata {
            name: row.name.clone(),
            description: row.description.clone(),
            long_description: row.long_description.clone(),
            tags,
        };
        let media = match self.platform.create_video(&metadata).await {
            Ok(media) => media,
            Err(error) => return self.fail(row, error),
        };
        info!(row = row.index, video_id = %media.id, name = %row.name, "media object created");

        match self.mode {
            IngestMode::RemoteAssets => {
                if let Some(outcome) = self.attach_remote_assets(row, &media.id).await? {
                    return Ok(outcome);
                }
            }
            IngestMode::Master => {
                let request = IngestRequest::master(self.profile.as_str(), row.video_url.as_str());
                match self.platform.submit_ingest_request(&media.id, &request).await {
                    Ok(receipt) => {
                        info!(video_id = %media.id, ingest_id = %receipt.id, "master ingest submitted")
                    }
                    Err(error) => return self.fail(row, error),
                }
            }
        }

        self.checkpoint.advance(row.index)?;
        Ok(RowOutcome::Checkpointed)
    }

    /// Remote-asset registration plus the optional poster/thumbnail ingest.
    /// Yields the row's terminal outcome when a platform call failed, `None`
    /// when the row may proceed to checkpointing.
    async fn attach_remote_assets(
        &mut self,
        row: &VideoRow,
        video_id: &str,
    ) -> IngestResult<Option<RowOutcome>> {
        let kind = ContainerKind::classify(&row.video_url);
        let registration = match registration_request(kind, &row.video_url) {
            Ok(registration) => registration,
            Err(error) => return self.fail(row, error.into()).map(Some),
        };
        match self
            .platform
            .register_remote_asset(video_id, &registration)
            .await
        {
            Ok(receipt) => {
                info!(video_id = %video_id, asset_id = %receipt.id, container = kind.as_str(), "remote source registered")
            }
            Err(error) => return self.fail(row, error).map(Some),
        }

        if row.poster.is_empty() {
            info!(video_id = %video_id, "no high res images to ingest, skipping");
            return Ok(None);
        }
        let thumbnail = if row.thumbnail.is_empty() {
            info!(video_id = %video_id, "no thumbnail image, using poster image");
            row.poster.as_str()
        } else {
            row.thumbnail.as_str()
        };
        let request = IngestRequest::images(self.profile.as_str(), row.poster.as_str(), thumbnail);
        match self.platform.submit_ingest_request(video_id, &request).await {
            Ok(receipt) => {
                info!(video_id = %video_id, ingest_id = %receipt.id, "image ingest submitted");
                Ok(None)
            }
            Err(error) => self.fail(row, error).map(Some),
        }
    }

    fn skip(&self, row: &VideoRow, reason: ValidationError) -> RowOutcome {
        warn!(row = row.index, name = %row.name, %reason, "skipping row");
        RowOutcome::Skipped { reason }
    }

    /// Row-local API failures leave the row un-checkpointed and let the run
    /// continue; a rejected token exchange aborts the whole run.
    fn fail(&self, row: &VideoRow, error: ApiError) -> IngestResult<RowOutcome> {
        match error {
            ApiError::Auth(auth) => Err(IngestError::Auth(auth)),
            error => {
                error!(row = row.index, name = %row.name, %error, "row failed");
                Ok(RowOutcome::Failed { error })
            }
        }
    }
}
