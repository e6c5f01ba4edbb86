// MeteoAgent widget HTTP client.
// Performs the single bounded GET and hands the body to the parser.

use async_trait::async_trait;
use reqwest::{
    Client, Response,
    header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{FetchError, KIndexError, Result, TransportError};

use super::parser::parse_kindex;
use super::source::KIndexSource;
use super::types::KIndex;

/// Body excerpt length kept in debug logs for unexpected statuses.
const BODY_EXCERPT: usize = 200;

/// HTTP client for the K-index widget page.
#[derive(Debug, Clone)]
pub struct MeteoAgentClient {
    client: Client,
    endpoint: String,
}

impl MeteoAgentClient {
    /// Create a client with browser-like headers and the configured timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| KIndexError::Config(format!("invalid user agent: {e}")))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(KIndexError::Client)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// GET the widget page and return its body.
    pub async fn fetch_page(&self) -> std::result::Result<String, TransportError> {
        debug!(endpoint = %self.endpoint, "fetching K-index widget");

        let response = self.client.get(&self.endpoint).send().await?;
        let response = self.check_response(response).await?;
        let body = response.text().await?;

        debug!(bytes = body.len(), "received K-index widget");
        Ok(body)
    }

    /// Fetch and parse the current readings.
    pub async fn fetch_latest(&self) -> std::result::Result<(KIndex, KIndex), FetchError> {
        let body = self.fetch_page().await?;
        let readings = parse_kindex(&body).inspect_err(|e| {
            warn!(endpoint = %self.endpoint, error = %e, "K-index widget markup not recognised");
        })?;
        Ok(readings)
    }

    /// Reject any non-2xx status.
    async fn check_response(
        &self,
        response: Response,
    ) -> std::result::Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let excerpt: String = body.chars().take(BODY_EXCERPT).collect();
        debug!(status = status.as_u16(), body = %excerpt, "K-index widget returned error status");

        Err(TransportError::Status {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl KIndexSource for MeteoAgentClient {
    async fn fetch_latest(&self) -> std::result::Result<(KIndex, KIndex), FetchError> {
        MeteoAgentClient::fetch_latest(self).await
    }

    fn name(&self) -> &'static str {
        "meteoagent"
    }
}
