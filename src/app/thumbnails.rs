//! Album art loading for result cards and download cards

use super::{App, AppMessage};
use crate::api::ApiClient;
use crate::types::{non_blank, SearchResultEntry};
use eframe::egui;
use tracing::{debug, warn};

/// Where a piece of art comes from
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ArtSource {
    Direct(String),
    /// Ask `/api/album-art` for the url first
    Lookup { source: String, kind: String, id: String },
}

impl ArtSource {
    pub(crate) fn for_entry(entry: &SearchResultEntry) -> Self {
        match non_blank(entry.album_art.as_deref()) {
            Some(url) => ArtSource::Direct(url.to_string()),
            None => ArtSource::Lookup {
                source: entry.service.clone(),
                kind: entry.kind.clone(),
                id: entry.id.clone(),
            },
        }
    }
}

/// Resolve, download and decode one image; any failure yields `None`
async fn load_art(api: ApiClient, key: &str, source: ArtSource) -> Option<egui::ColorImage> {
    let url = match source {
        ArtSource::Direct(url) => url,
        ArtSource::Lookup { source, kind, id } => match api.album_art(&source, &kind, &id).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!(key, "No album art available");
                return None;
            }
            Err(e) => {
                warn!(key, error = %e, "Album art lookup failed");
                return None;
            }
        },
    };

    let bytes = match api.fetch_image(&url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key, url = %url, error = %e, "Album art download failed");
            return None;
        }
    };

    let decoded = tokio::task::spawn_blocking(move || decode_art(&bytes)).await;
    match decoded {
        Ok(Some(image)) => Some(image),
        Ok(None) => {
            warn!(key, url = %url, "Album art could not be decoded");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "Album art decode task failed");
            None
        }
    }
}

pub(crate) fn decode_art(bytes: &[u8]) -> Option<egui::ColorImage> {
    let img = image::load_from_memory(bytes).ok()?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Some(egui::ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw()))
}

impl App {
    /// Cached texture for `key`; starts a background load on first sight
    pub(crate) fn art_for(
        &mut self,
        ctx: &egui::Context,
        key: String,
        source: ArtSource,
    ) -> Option<egui::TextureHandle> {
        if let Some(cached) = self.art_cache.get(&key) {
            return cached.clone();
        }
        if !self.art_loading.insert(key.clone()) {
            return None;
        }

        let api = self.api.clone();
        let limit = self.art_limit.clone();
        self.spawn_task(ctx, async move {
            let image = match limit.acquire_owned().await {
                Ok(_permit) => load_art(api, &key, source).await,
                Err(_) => None,
            };
            AppMessage::ArtLoaded { key, image }
        });
        None
    }

    pub(crate) fn finish_art(&mut self, ctx: &egui::Context, key: String, image: Option<egui::ColorImage>) {
        self.art_loading.remove(&key);
        let texture = image.map(|image| ctx.load_texture(&key, image, egui::TextureOptions::LINEAR));
        self.art_cache.insert(key, texture);
    }
}
