//! HTTP client for the backend's request/response endpoints

use crate::constants::*;
use crate::pager::{SearchDebugInfo, SearchOutcome};
use crate::tracker::ActiveSnapshot;
use crate::types::{DownloadMetadata, FileEntry, SearchResultEntry, SearchType, Source};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned HTTP {0}")]
    Status(u16),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct DownloadRequest<'a> {
    pub url: &'a str,
    pub quality: u8,
}

/// Download started from a search result, echoing what the client already knows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadFromUrlRequest {
    pub url: String,
    pub quality: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
}

impl DownloadFromUrlRequest {
    pub fn from_entry(entry: &SearchResultEntry, url: &str, quality: u8) -> Self {
        let keep = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
        Self {
            url: url.to_string(),
            quality,
            title: keep(&entry.title).or_else(|| Some(entry.display_title().to_string())),
            artist: keep(&entry.artist),
            service: Some(entry.service.clone()).filter(|s| !s.is_empty()),
            album_art: keep(&entry.album_art),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadAccepted {
    pub task_id: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<DownloadMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ServerActive {
    metadata: Option<DownloadMetadata>,
    started: Option<f64>,
}

/// Snapshot from `/api/status`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerStatus {
    pub active: Vec<ActiveSnapshot>,
    pub queue_size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusBody {
    active: HashMap<String, ServerActive>,
    queue_size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchBody {
    results: Option<Vec<SearchResultEntry>>,
    message: Option<String>,
    error: Option<String>,
    debug_info: Option<SearchDebugInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigBody {
    config: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlbumArtBody {
    album_art: Option<String>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self::with_client(http, base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn start_download(&self, url: &str, quality: u8) -> Result<DownloadAccepted, ApiError> {
        debug!(url, quality, "Submitting URL download");
        let response = self
            .http
            .post(self.url(DOWNLOAD_PATH))
            .json(&DownloadRequest { url, quality })
            .send()
            .await?;
        decode(response).await
    }

    pub async fn download_from_url(
        &self,
        request: &DownloadFromUrlRequest,
    ) -> Result<DownloadAccepted, ApiError> {
        debug!(url = %request.url, quality = request.quality, "Submitting search result download");
        let response = self
            .http
            .post(self.url(DOWNLOAD_FROM_URL_PATH))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// Search never maps a failure body to `Err`: `{error}` becomes `SearchOutcome::Failed`
    pub async fn search(
        &self,
        query: &str,
        search_type: SearchType,
        source: Source,
    ) -> Result<SearchOutcome, ApiError> {
        let response = self
            .http
            .post(self.url(SEARCH_PATH))
            .json(&serde_json::json!({
                "query": query,
                "type": search_type.as_str(),
                "source": source.as_str(),
            }))
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: SearchBody = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(_) if !status.is_success() => return Err(ApiError::Status(status.as_u16())),
            Err(e) => return Err(e.into()),
        };

        if let Some(error) = body.error {
            return Ok(SearchOutcome::Failed { error, debug: body.debug_info });
        }
        match body.results {
            Some(results) if !results.is_empty() => Ok(SearchOutcome::Results(results)),
            _ if status.is_success() => Ok(SearchOutcome::Empty { message: body.message }),
            _ => Err(ApiError::Status(status.as_u16())),
        }
    }

    /// Album art url for one search result, `None` when the backend has none
    pub async fn album_art(
        &self,
        source: &str,
        media_type: &str,
        id: &str,
    ) -> Result<Option<String>, ApiError> {
        let response = self
            .http
            .get(self.url(ALBUM_ART_PATH))
            .query(&[("source", source), ("type", media_type), ("id", id)])
            .send()
            .await?;
        let body: AlbumArtBody = decode(response).await?;
        Ok(body.album_art.filter(|u| !u.trim().is_empty()))
    }

    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn load_config(&self) -> Result<String, ApiError> {
        let response = self.http.get(self.url(CONFIG_PATH)).send().await?;
        let body: ConfigBody = decode(response).await?;
        Ok(body.config)
    }

    pub async fn save_config(&self, config: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(CONFIG_PATH))
            .json(&serde_json::json!({ "config": config }))
            .send()
            .await?;
        let _: serde_json::Value = decode(response).await?;
        Ok(())
    }

    pub async fn browse(&self) -> Result<Vec<FileEntry>, ApiError> {
        let response = self.http.get(self.url(BROWSE_PATH)).send().await?;
        decode(response).await
    }

    pub async fn status(&self) -> Result<ServerStatus, ApiError> {
        let response = self.http.get(self.url(STATUS_PATH)).send().await?;
        let body: StatusBody = decode(response).await?;
        let mut active: Vec<ActiveSnapshot> = body
            .active
            .into_iter()
            .map(|(id, entry)| ActiveSnapshot {
                id,
                metadata: entry.metadata.unwrap_or_default(),
                started_at: entry.started.and_then(unix_to_utc),
            })
            .collect();
        active.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        Ok(ServerStatus { active, queue_size: body.queue_size })
    }
}

/// Decode a JSON body, turning `{error}` payloads and bad statuses into errors
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    if !status.is_success() {
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
        return Err(match body.error {
            Some(error) => ApiError::Rejected(error),
            None => ApiError::Status(status.as_u16()),
        });
    }
    if let Ok(ErrorBody { error: Some(error) }) = serde_json::from_slice::<ErrorBody>(&bytes) {
        return Err(ApiError::Rejected(error));
    }
    Ok(serde_json::from_slice(&bytes)?)
}

fn unix_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

/// Check a URL against the services the backend accepts
pub fn validate_download_url(url: &str) -> Result<&str, &'static str> {
    let url = url.trim();
    if url.is_empty() {
        return Err("URL is required");
    }
    let lower = url.to_ascii_lowercase();
    if !SUPPORTED_URL_HOSTS.iter().any(|host| lower.contains(host)) {
        return Err("Unsupported service URL");
    }
    Ok(url)
}
