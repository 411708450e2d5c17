//! Application constants and configuration

use std::time::Duration;

pub const APP_NAME: &str = "rip-panel";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const BACKEND_ENV_VAR: &str = "RIP_PANEL_BACKEND";

pub const EVENTS_PATH: &str = "/api/events";
pub const DOWNLOAD_PATH: &str = "/api/download";
pub const DOWNLOAD_FROM_URL_PATH: &str = "/api/download-from-url";
pub const SEARCH_PATH: &str = "/api/search";
pub const ALBUM_ART_PATH: &str = "/api/album-art";
pub const CONFIG_PATH: &str = "/api/config";
pub const BROWSE_PATH: &str = "/api/browse";
pub const STATUS_PATH: &str = "/api/status";

/// Fixed delay between a dropped event stream and the next connect attempt
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// How long a completed download stays on the Downloads tab
pub const COMPLETED_GRACE: Duration = Duration::from_millis(3000);
/// How long an errored download stays on the Downloads tab
pub const ERROR_GRACE: Duration = Duration::from_millis(2000);

pub const HISTORY_CAPACITY: usize = 50;
pub const SEARCH_PAGE_SIZE: usize = 10;
pub const ALBUM_ART_CONCURRENCY: usize = 6;

pub const DEFAULT_QUALITY: u8 = 3;
pub const MAX_QUALITY: u8 = 4;

pub const NO_OUTPUT_PLACEHOLDER: &str = "No output captured";
pub const LOST_DOWNLOAD_DETAIL: &str =
    "Lost track of this download while disconnected; final status unknown";

/// Hosts the backend accepts for URL downloads
pub const SUPPORTED_URL_HOSTS: &[&str] = &[
    "spotify.com",
    "deezer.com",
    "tidal.com",
    "qobuz.com",
    "soundcloud.com",
    "youtube.com",
];

pub const DEBUG_OUTPUT_PREVIEW_CHARS: usize = 500;
