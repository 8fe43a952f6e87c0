use super::{EmailMessage, Notifier, compose};
use crate::config::settings::MailgunConfig;
use crate::workers::job::Job;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mailgun request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    message: String,
}

/// Sends notifications through the Mailgun messages API.
#[derive(Clone)]
pub struct MailgunNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    from: String,
}

impl MailgunNotifier {
    pub fn new(config: &MailgunConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder().timeout(SEND_TIMEOUT).build()?;
        let endpoint = format!(
            "{}/v3/{}/messages",
            config.api_base.trim_end_matches('/'),
            config.domain
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<String, MailError> {
        let form = [
            ("from", self.from.as_str()),
            ("to", message.to.as_str()),
            ("subject", message.subject.as_str()),
            ("text", message.body.as_str()),
        ];

        let response: SendResponse = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(id = %response.id, status = %response.message, "Message accepted by mailgun");
        Ok(response.id)
    }
}

#[async_trait]
impl Notifier for MailgunNotifier {
    async fn notify(&self, job: Job) {
        let message = compose(&job);
        if let Err(e) = self.send(&message).await {
            error!(job_id = %job.id, to = %message.to, "Error sending email to mailgun: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workers::job::Recipient;
    use url::Url;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn notifier(server: &MockServer) -> MailgunNotifier {
        MailgunNotifier::new(&MailgunConfig {
            api_base: server.uri(),
            domain: "mg.example.com".to_string(),
            api_key: "key-123".to_string(),
            from: "downloads@example.com".to_string(),
            webhook_signing_key: None,
        })
        .unwrap()
    }

    fn finished_job() -> Job {
        let mut job = Job::new(
            Url::parse("https://www.youtube.com/watch?v=abc123").unwrap(),
            Recipient {
                name: "Jorge".to_string(),
                username: "jriquelme".to_string(),
                email: "jorge@larix.cl".to_string(),
            },
        );
        job.title = Some("Demo Video".to_string());
        job.destination_url = Some(Url::parse("https://s3.amazonaws.com/videos/demo.mp4").unwrap());
        job
    }

    #[tokio::test]
    async fn notify_posts_message_form_to_domain_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/mg.example.com/messages"))
            .and(header_exists("authorization"))
            .and(body_string_contains("to=jorge%40larix.cl"))
            .and(body_string_contains("Demo+Video"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "<20261019.1@mg.example.com>",
                "message": "Queued. Thank you."
            })))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server).notify(finished_job()).await;
    }

    #[tokio::test]
    async fn send_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let message = compose(&finished_job());
        let result = notifier(&server).send(&message).await;
        assert!(matches!(result, Err(MailError::Request(_))));
    }

    #[tokio::test]
    async fn notify_swallows_delivery_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        // Must return normally even though mailgun failed
        notifier(&server).notify(finished_job()).await;
    }
}
