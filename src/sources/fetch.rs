use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use url::Url;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Plain GET; `NetworkUnavailable` when no connection could be made.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, AppError>;
}

/// reqwest-backed fetcher. Single attempt, no timeout: a hung server blocks the command.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("alphadb-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, AppError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_builder() {
                AppError::Reqwest(e)
            } else {
                AppError::NetworkUnavailable(e.to_string())
            }
        })?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .await
            .map_err(|e| AppError::NetworkUnavailable(e.to_string()))?;
        debug!(url, status, bytes = body.len(), "fetched version source");
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Where a version source lives. Anything starting with `http` is a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Web(Url),
    File(PathBuf),
}

impl SourceLocation {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        if is_web(input) {
            Ok(SourceLocation::Web(Url::parse(input)?))
        } else {
            Ok(SourceLocation::File(PathBuf::from(input)))
        }
    }
}

pub fn is_web(location: &str) -> bool {
    location.starts_with("http")
}

/// Fetch and decode a version source. Performs exactly one attempt.
pub async fn resolve<F>(fetcher: &F, location: &str) -> Result<Value, AppError>
where
    F: HttpFetch + ?Sized,
{
    match SourceLocation::parse(location)? {
        SourceLocation::Web(url) => {
            let resp = fetcher.get(url.as_str()).await.inspect_err(|e| {
                warn!(url = %url, error = %e, "version source unreachable");
            })?;
            if resp.status != 200 {
                warn!(url = %url, status = resp.status, "version source responded with error status");
                return Err(AppError::HttpStatus { code: resp.status });
            }
            decode(&resp.body)
        }
        SourceLocation::File(path) => {
            let bytes = read_file(&path)?;
            decode(&bytes)
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, AppError> {
    std::fs::read(path).map_err(|source| AppError::SourceRead {
        path: path.to_path_buf(),
        source,
    })
}

fn decode(body: &[u8]) -> Result<Value, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::MalformedPayload(e.to_string()))
}
