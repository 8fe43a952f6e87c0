use super::job::Job;
use super::pipeline::Pipeline;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};

/// Hands a job off for asynchronous execution. Scheduling never fails and
/// never reports the job outcome back to the caller.
pub trait JobScheduler: Send + Sync {
    fn schedule(&self, job: Job);
}

/// Runs every job on its own tokio task.
#[derive(Clone)]
pub struct TaskDispatcher {
    pipeline: Arc<Pipeline>,
}

impl TaskDispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

impl JobScheduler for TaskDispatcher {
    fn schedule(&self, job: Job) {
        let span = info_span!("job", id = %job.id, user = %job.recipient.username);
        info!(job_id = %job.id, url = %job.source_url, "Scheduling download");

        let pipeline = self.pipeline.clone();
        tokio::spawn(async move { pipeline.run(job).await }.instrument(span));
    }
}
