use crate::workers::job::Job;
use async_trait::async_trait;

pub mod mailgun;

/// Delivers the outcome of a job to its recipient. Delivery failures are
/// logged by the implementation and never reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, job: Job);
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Builds the success or failure message for a finished job.
pub fn compose(job: &Job) -> EmailMessage {
    let name = &job.recipient.name;
    let (subject, body) = match (&job.error, &job.destination_url) {
        (None, Some(destination)) => {
            let title = job.display_title();
            (
                format!("{name}, your video {title} is ready"),
                format!(
                    "Hi {name},\n\nYour video \"{title}\" is ready, you can download it from {destination}.\n\nCheers"
                ),
            )
        }
        (error, _) => {
            let title = job.display_title();
            let detail = error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "the video was not stored".to_string());
            (
                format!("{name}, there was a problem downloading {title}"),
                format!(
                    "Hi {name},\n\nThere was an error downloading the video \"{title}\": {detail}\n\nCheers"
                ),
            )
        }
    };

    EmailMessage {
        to: job.recipient.email.clone(),
        subject,
        body,
    }
}
