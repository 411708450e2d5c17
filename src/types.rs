//! Common types and data structures

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Display metadata attached to a download when the backend accepts it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub service: Option<String>,
    #[serde(rename = "album_art")]
    pub album_art_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl DownloadMetadata {
    pub fn title_or_default(&self) -> &str {
        non_blank(self.title.as_deref()).unwrap_or("Unknown title")
    }

    pub fn artist_or_default(&self) -> &str {
        non_blank(self.artist.as_deref()).unwrap_or("Unknown artist")
    }
}

pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Lifecycle status of a tracked download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadStatus {
    Downloading,
    Completed,
    Failed, // download tool exited non-zero
    Error,
}

impl DownloadStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DownloadStatus::Downloading)
    }

    /// Map the free-form `status` of a completion event onto a terminal state
    pub fn from_completion(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "failed" => DownloadStatus::Failed,
            "error" => DownloadStatus::Error,
            _ => DownloadStatus::Completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DownloadStatus::Downloading => "DOWNLOADING",
            DownloadStatus::Completed => "COMPLETED",
            DownloadStatus::Failed => "FAILED",
            DownloadStatus::Error => "ERROR",
        }
    }
}

/// Kind of item a search looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Album,
    Track,
    Artist,
    Playlist,
}

impl SearchType {
    pub const ALL: [SearchType; 4] = [
        SearchType::Album,
        SearchType::Track,
        SearchType::Artist,
        SearchType::Playlist,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::Album => "album",
            SearchType::Track => "track",
            SearchType::Artist => "artist",
            SearchType::Playlist => "playlist",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchType::Album => "Albums",
            SearchType::Track => "Tracks",
            SearchType::Artist => "Artists",
            SearchType::Playlist => "Playlists",
        }
    }
}

/// Streaming service a search runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Qobuz,
    Tidal,
    Deezer,
    Soundcloud,
}

impl Source {
    pub const ALL: [Source; 4] = [Source::Qobuz, Source::Tidal, Source::Deezer, Source::Soundcloud];

    pub fn as_str(self) -> &'static str {
        match self {
            Source::Qobuz => "qobuz",
            Source::Tidal => "tidal",
            Source::Deezer => "deezer",
            Source::Soundcloud => "soundcloud",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::Qobuz => "Qobuz",
            Source::Tidal => "Tidal",
            Source::Deezer => "Deezer",
            Source::Soundcloud => "SoundCloud",
        }
    }

    /// SoundCloud has no album or artist search
    pub fn supports(self, search_type: SearchType) -> bool {
        !matches!(
            (self, search_type),
            (Source::Soundcloud, SearchType::Album) | (Source::Soundcloud, SearchType::Artist)
        )
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of a search response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchResultEntry {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    pub service: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    #[serde(alias = "desc")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub year: Option<String>,
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub track_count: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub duration: Option<u32>,
    pub url: Option<String>,
    pub album_art: Option<String>,
}

impl SearchResultEntry {
    /// Entries without a resolvable url cannot be downloaded
    pub fn download_url(&self) -> Option<&str> {
        non_blank(self.url.as_deref())
    }

    pub fn search_type(&self) -> Option<SearchType> {
        SearchType::parse(&self.kind)
    }

    pub fn display_title(&self) -> &str {
        non_blank(self.title.as_deref())
            .or_else(|| non_blank(self.artist.as_deref()))
            .or_else(|| non_blank(self.description.as_deref()))
            .unwrap_or("Untitled")
    }

    /// Key used to cache album art across pages
    pub fn art_key(&self) -> String {
        format!("{}_{}_{}", self.service, self.kind, self.id)
    }
}

/// File listed by the download browser
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    /// Unix timestamp (seconds, fractional)
    pub modified: f64,
}

/// Top-level tabs of the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Downloads,
    History,
    Search,
    Config,
    Files,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Downloads, Tab::History, Tab::Search, Tab::Config, Tab::Files];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Downloads => "Downloads",
            Tab::History => "History",
            Tab::Search => "Search",
            Tab::Config => "Config",
            Tab::Files => "Files",
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

// Backends hand out ids and years as either numbers or strings
fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(d)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soundcloud_only_supports_track_and_playlist() {
        assert!(!Source::Soundcloud.supports(SearchType::Album));
        assert!(!Source::Soundcloud.supports(SearchType::Artist));
        assert!(Source::Soundcloud.supports(SearchType::Track));
        assert!(Source::Soundcloud.supports(SearchType::Playlist));
        for t in SearchType::ALL {
            assert!(Source::Qobuz.supports(t));
        }
    }

    #[test]
    fn completion_status_maps_to_terminal_states() {
        assert_eq!(DownloadStatus::from_completion("completed"), DownloadStatus::Completed);
        assert_eq!(DownloadStatus::from_completion("FAILED"), DownloadStatus::Failed);
        assert_eq!(DownloadStatus::from_completion("done"), DownloadStatus::Completed);
        assert!(DownloadStatus::from_completion("done").is_terminal());
        assert!(!DownloadStatus::Downloading.is_terminal());
    }

    #[test]
    fn search_entry_tolerates_mixed_field_shapes() {
        let entry: SearchResultEntry = serde_json::from_value(serde_json::json!({
            "id": 1234,
            "service": "qobuz",
            "type": "album",
            "title": "Kind of Blue",
            "artist": "Miles Davis",
            "desc": "Kind of Blue by Miles Davis",
            "year": 1959,
            "track_count": "",
            "url": "https://open.qobuz.com/album/1234",
            "album_art": ""
        }))
        .unwrap();

        assert_eq!(entry.id, "1234");
        assert_eq!(entry.year.as_deref(), Some("1959"));
        assert_eq!(entry.track_count, None);
        assert_eq!(entry.description.as_deref(), Some("Kind of Blue by Miles Davis"));
        assert_eq!(entry.download_url(), Some("https://open.qobuz.com/album/1234"));
        assert_eq!(entry.search_type(), Some(SearchType::Album));
    }

    #[test]
    fn entry_without_url_is_not_downloadable() {
        let entry: SearchResultEntry = serde_json::from_value(serde_json::json!({
            "id": "x", "service": "soundcloud", "type": "track", "url": "  ", "track_count": 12
        }))
        .unwrap();

        assert_eq!(entry.download_url(), None);
        assert_eq!(entry.track_count, Some(12));
        assert_eq!(entry.display_title(), "Untitled");
    }

    #[test]
    fn metadata_defaults_for_missing_fields() {
        let meta: DownloadMetadata =
            serde_json::from_value(serde_json::json!({"title": null, "service": "tidal"})).unwrap();
        assert_eq!(meta.title_or_default(), "Unknown title");
        assert_eq!(meta.artist_or_default(), "Unknown artist");
        assert_eq!(meta.service.as_deref(), Some("tidal"));
    }
}
