use reqwest::Client;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt;

use crate::MethodResponse;

/// An error returned by the HTTP client when a request cannot complete.
#[derive(Debug)]
pub struct HttpError {
    message: String,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for HttpError {}

/// A client for posting method calls to a running scoring daemon.
pub struct ScoringClient {
    client: Client,
    base_url: String,
}

impl ScoringClient {
    /// Creates a client targeting the daemon at `base_url`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// The full URL of the method endpoint.
    pub fn method_url(&self) -> String {
        format!("{}/method", self.base_url.trim_end_matches('/'))
    }

    /// Posts one method-call envelope and decodes the response envelope.
    ///
    /// Failure response codes still decode: the caller inspects
    /// [`MethodResponse::code`] to distinguish outcomes. Only transport
    /// failures and undecodable bodies error here.
    pub async fn call(
        &self,
        envelope: &Map<String, Value>,
    ) -> Result<MethodResponse, Box<dyn Error>> {
        let response = self
            .client
            .post(self.method_url())
            .json(envelope)
            .send()
            .await?;
        let status = response.status();
        response.json::<MethodResponse>().await.map_err(|e| {
            Box::new(HttpError {
                message: format!("undecodable response (status {}): {}", status, e),
            }) as Box<dyn Error>
        })
    }
}
