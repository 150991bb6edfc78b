pub mod queue;

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};
use url::Url;

use crate::calculator::CalculationRecord;

pub use self::queue::{FailureLog, NotificationQueue, NotifyFailure};

/// Relay path that accepts finalized calculations.
pub const SEND_RESULT_PATH: &str = "send-result";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Reports a finalized calculation to an external service.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, record: &CalculationRecord) -> impl Future<Output = Result<(), String>> + Send;
}

/// Posts calculations to the relay's `/send-result` endpoint.
pub struct HttpNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpNotifier {
    pub fn new(base_url: &Url) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoint: send_result_url(base_url)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Notifier for HttpNotifier {
    async fn notify(&self, record: &CalculationRecord) -> Result<(), String> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(record)
            .send()
            .await
            .map_err(|e| format!("Failed to reach relay at {}: {}", self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Relay rejected notification ({}): {}", status, body);
            return Err(format!("HTTP {}: {}", status.as_u16(), body));
        }

        info!("Relay accepted {} result for '{}'", record.mode, record.expression);
        Ok(())
    }
}

/// `{base}/send-result`, keeping any path prefix on the base URL.
pub fn send_result_url(base_url: &Url) -> Result<Url, String> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(SEND_RESULT_PATH)
        .map_err(|e| format!("Invalid relay URL '{}': {}", base_url, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_result_url_from_bare_host() {
        let base = Url::parse("http://localhost:8787").unwrap();
        assert_eq!(
            send_result_url(&base).unwrap().as_str(),
            "http://localhost:8787/send-result"
        );
    }

    #[test]
    fn test_send_result_url_keeps_prefix() {
        let base = Url::parse("https://calc.example.com/api").unwrap();
        assert_eq!(
            send_result_url(&base).unwrap().as_str(),
            "https://calc.example.com/api/send-result"
        );

        let base = Url::parse("https://calc.example.com/api/").unwrap();
        assert_eq!(
            send_result_url(&base).unwrap().as_str(),
            "https://calc.example.com/api/send-result"
        );
    }

    #[test]
    fn test_http_notifier_builds_endpoint() {
        let notifier = HttpNotifier::new(&Url::parse("http://10.0.2.2:8787").unwrap()).unwrap();
        assert_eq!(notifier.endpoint().path(), "/send-result");
    }
}
