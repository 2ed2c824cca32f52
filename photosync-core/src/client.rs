use std::io;
use std::path::Path;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

/// Some archive backends reject the default reqwest identifier, so every
/// request carries a desktop browser user agent unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/79.0.3945.88 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid url {url:?}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    /// True when the failure happened on the wire rather than in the reply.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Request(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub user_agent: String,
    /// Skips TLS peer verification. Off unless a config explicitly enables it.
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

#[derive(Clone)]
pub struct ArchiveClient {
    http: Client,
}

impl ArchiveClient {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(&ClientOptions::default())
    }

    pub fn with_options(options: &ClientOptions) -> Result<Self, FetchError> {
        // reqwest follows up to 10 redirects by default and sets no timeout.
        let http = Client::builder()
            .user_agent(options.user_agent.clone())
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;
        Ok(Self { http })
    }

    pub fn with_http(http: Client) -> Self {
        Self { http }
    }

    pub async fn fetch_text(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.get(url).await?;
        let body = response.bytes().await?;
        debug!(url, bytes = body.len(), "fetched metadata body");
        Ok(body.to_vec())
    }

    /// Streams the response body into `dest`, truncating any existing file.
    /// Returns the number of bytes written.
    pub async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self.get(url).await?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, dest = %dest.display(), bytes = written, "downloaded file");
        Ok(written)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let parsed = Url::parse(url).map_err(|source| FetchError::Url {
            url: url.to_string(),
            source,
        })?;
        let response = self.http.get(parsed).send().await?;
        Self::check_status(response).await
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(FetchError::Status { status, body })
        }
    }
}
