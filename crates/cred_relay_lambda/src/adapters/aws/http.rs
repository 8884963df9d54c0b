use cred_relay_core::error::{RelayError, RelayResult};

use crate::adapters::result_sink::ResultSink;

/// Plain HTTPS client for presigned PUTs. Errors are stripped of the URL so
/// the signed reference never reaches a log line.
#[derive(Debug, Clone)]
pub struct HttpResultSink {
    client: reqwest::Client,
}

impl HttpResultSink {
    pub fn new() -> RelayResult<Self> {
        match reqwest::Client::builder().build() {
            Ok(client) => Ok(Self { client }),
            Err(error) => {
                let reason = error.without_url();
                Err(RelayError::Config(format!("failed to build HTTP client: {reason}")))
            }
        }
    }
}

impl ResultSink for HttpResultSink {
    async fn put(&self, url: &str, body: Vec<u8>) -> RelayResult<()> {
        let response = self
            .client
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(|error| RelayError::provider("object_store.put", error.without_url()))?;

        response
            .error_for_status()
            .map(|_| ())
            .map_err(|error| RelayError::provider("object_store.put", error.without_url()))
    }
}
