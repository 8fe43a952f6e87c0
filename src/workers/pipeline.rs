use super::error::{FetchError, JobError};
use super::job::Job;
use super::ytdl::{ContentFetcher, MetadataResolver};
use crate::infrastructure::mail::Notifier;
use crate::infrastructure::storage::BlobStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs one job through resolve, fetch, store and cleanup, then notifies
/// the recipient exactly once.
pub struct Pipeline {
    resolver: Arc<dyn MetadataResolver>,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    work_root: PathBuf,
}

impl Pipeline {
    pub fn new(
        resolver: Arc<dyn MetadataResolver>,
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        work_root: PathBuf,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            store,
            notifier,
            work_root,
        }
    }

    pub async fn run(&self, mut job: Job) {
        info!(job_id = %job.id, url = %job.source_url, "Processing job");

        if let Err(e) = self.process(&mut job).await {
            error!(job_id = %job.id, url = %job.source_url, "Job failed: {}", e);
            job.error = Some(e);
        } else {
            info!(job_id = %job.id, title = job.display_title(), "Job completed, sending success email");
        }

        self.notifier.notify(job).await;
    }

    async fn process(&self, job: &mut Job) -> Result<(), JobError> {
        // Each job gets its own directory so equal filenames never collide
        let work_dir = self.work_root.join(job.id.to_string());
        tokio::fs::create_dir_all(&work_dir)
            .await
            .map_err(FetchError::WorkDir)?;

        let outcome = self.stages(job, &work_dir).await;
        cleanup(job, &work_dir).await;
        outcome
    }

    async fn stages(&self, job: &mut Job, work_dir: &Path) -> Result<(), JobError> {
        // 1. Title and filename
        let metadata = self.resolver.resolve(&job.source_url, work_dir).await?;
        job.title = Some(metadata.title);

        // 2. Download
        self.fetcher.fetch(&job.source_url, work_dir).await?;
        let local = work_dir.join(&metadata.filename);
        job.local_file = Some(local.clone());

        // 3. Upload
        let key = format!("{}/{}", job.id, metadata.filename);
        debug!(job_id = %job.id, key = %key, "Uploading");
        let destination = self.store.store(&local, &key).await?;
        job.destination_url = Some(destination);

        Ok(())
    }
}

/// Best effort: failures are logged and never change the job outcome.
async fn cleanup(job: &mut Job, work_dir: &Path) {
    if let Some(file) = job.local_file.take() {
        if let Err(e) = tokio::fs::remove_file(&file).await {
            warn!(job_id = %job.id, path = %file.display(), "Error removing file: {}", e);
        }
    }

    if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(job_id = %job.id, path = %work_dir.display(), "Error removing work directory: {}", e);
        }
    }
}
