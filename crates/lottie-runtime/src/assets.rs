//! Image assets and the gate that holds playback until they are settled.
//!
//! Embedded `data:` URIs are decoded when the tracker is built. External
//! files are fetched by the host, which reports back through
//! [`AssetTracker::mark_received`] or [`AssetTracker::mark_failed`].

use crate::error::{Result, RuntimeError};
use base64::prelude::*;
use lottie_data::model as data;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Received,
    Failed,
}

#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub id: String,
    pub width: f32,
    pub height: f32,
    /// Where the host should load the file from; `None` for embedded data.
    pub path: Option<String>,
    pub data: Option<Arc<[u8]>>,
    pub state: AssetState,
}

/// Load bookkeeping for every image asset of a document.
#[derive(Debug, Clone, Default)]
pub struct AssetTracker {
    images: Vec<ImageAsset>,
    skip_pending: bool,
}

impl AssetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: &data::Document) -> Self {
        let mut tracker = Self::new();
        for asset in document.assets.iter().filter(|a| a.is_image()) {
            let mut image = ImageAsset {
                id: asset.id.clone(),
                width: asset.w.unwrap_or(0) as f32,
                height: asset.h.unwrap_or(0) as f32,
                path: None,
                data: None,
                state: AssetState::Pending,
            };
            if asset.is_embedded() {
                match asset.p.as_deref().map(|p| decode_data_uri(&asset.id, p)) {
                    Some(Ok(bytes)) => {
                        image.data = Some(bytes.into());
                        image.state = AssetState::Received;
                    }
                    Some(Err(err)) => {
                        warn!(asset = %asset.id, error = %err, "embedded image failed to decode");
                        image.state = AssetState::Failed;
                    }
                    None => image.state = AssetState::Failed,
                }
            } else {
                image.path = asset_path(asset);
            }
            tracker.images.push(image);
        }
        debug!(
            total = tracker.total(),
            received = tracker.received(),
            failed = tracker.failed(),
            "tracked image assets"
        );
        tracker
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    pub fn received(&self) -> usize {
        self.count(AssetState::Received)
    }

    pub fn failed(&self) -> usize {
        self.count(AssetState::Failed)
    }

    pub fn pending(&self) -> usize {
        self.count(AssetState::Pending)
    }

    fn count(&self, state: AssetState) -> usize {
        self.images.iter().filter(|i| i.state == state).count()
    }

    pub fn image(&self, id: &str) -> Option<&ImageAsset> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn images(&self) -> &[ImageAsset] {
        &self.images
    }

    fn image_mut(&mut self, id: &str) -> Result<&mut ImageAsset> {
        self.images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| RuntimeError::UnknownAsset(id.to_string()))
    }

    /// Records a loaded external image. `data` may be omitted when the host
    /// keeps the decoded image itself.
    pub fn mark_received(&mut self, id: &str, data: Option<Vec<u8>>) -> Result<()> {
        let image = self.image_mut(id)?;
        image.data = data.map(Into::into);
        image.state = AssetState::Received;
        debug!(asset = id, "image received");
        Ok(())
    }

    /// Records a failed load. Playback continues with a placeholder.
    pub fn mark_failed(&mut self, id: &str) -> Result<()> {
        let image = self.image_mut(id)?;
        image.state = AssetState::Failed;
        warn!(asset = id, "image failed to load");
        Ok(())
    }

    /// Lets playback start without waiting for the remaining loads.
    pub fn skip_pending(&mut self) {
        self.skip_pending = true;
    }

    /// No load is outstanding, or the caller chose not to wait.
    pub fn is_settled(&self) -> bool {
        self.skip_pending || self.pending() == 0
    }
}

/// Decodes a base64 `data:` URI into raw bytes.
pub fn decode_data_uri(id: &str, uri: &str) -> Result<Vec<u8>> {
    let decode_error = |reason: &str| RuntimeError::AssetDecode {
        id: id.to_string(),
        reason: reason.to_string(),
    };
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| decode_error("missing `,` separator"))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(decode_error("not a base64 data URI"));
    }
    BASE64_STANDARD
        .decode(payload.trim())
        .map_err(|err| decode_error(&err.to_string()))
}

/// `u` directory joined with the `p` file name.
fn asset_path(asset: &data::Asset) -> Option<String> {
    let p = asset.p.as_ref()?;
    match asset.u.as_deref() {
        Some(u) if !u.is_empty() => Some(format!("{u}{p}")),
        _ => Some(p.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(assets: serde_json::Value) -> data::Document {
        serde_json::from_value(json!({
            "ip": 0, "op": 10, "fr": 30, "w": 100, "h": 100,
            "layers": [], "assets": assets
        }))
        .unwrap()
    }

    #[test]
    fn embedded_images_decode_at_load() {
        let doc = document(json!([
            {"id": "a", "w": 2, "h": 2, "e": 1, "p": "data:image/png;base64,aGVsbG8="},
            {"id": "b", "w": 2, "h": 2, "u": "images/", "p": "b.png"},
            {"id": "comp", "layers": []}
        ]));
        let tracker = AssetTracker::from_document(&doc);
        assert_eq!(tracker.total(), 2);
        assert_eq!(tracker.received(), 1);
        assert_eq!(tracker.pending(), 1);
        assert_eq!(tracker.image("a").unwrap().data.as_deref(), Some(&b"hello"[..]));
        assert_eq!(tracker.image("b").unwrap().path.as_deref(), Some("images/b.png"));
        assert!(!tracker.is_settled());
    }

    #[test]
    fn corrupt_embedded_data_counts_as_failed() {
        let doc = document(json!([
            {"id": "bad", "e": 1, "p": "data:image/png;base64,!!!"}
        ]));
        let tracker = AssetTracker::from_document(&doc);
        assert_eq!(tracker.failed(), 1);
        assert!(tracker.is_settled());
    }

    #[test]
    fn reports_settle_the_tracker() {
        let doc = document(json!([
            {"id": "x", "p": "x.png"},
            {"id": "y", "p": "y.png"}
        ]));
        let mut tracker = AssetTracker::from_document(&doc);
        tracker.mark_received("x", Some(vec![1, 2, 3])).unwrap();
        assert!(!tracker.is_settled());
        tracker.mark_failed("y").unwrap();
        assert!(tracker.is_settled());
        assert_eq!((tracker.received(), tracker.failed()), (1, 1));

        let err = tracker.mark_received("nope", None).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownAsset(id) if id == "nope"));
    }

    #[test]
    fn skipping_pending_loads_settles() {
        let doc = document(json!([{"id": "x", "p": "x.png"}]));
        let mut tracker = AssetTracker::from_document(&doc);
        tracker.skip_pending();
        assert!(tracker.is_settled());
        assert_eq!(tracker.pending(), 1);
    }

    #[test]
    fn data_uri_without_base64_marker_is_rejected() {
        assert!(decode_data_uri("a", "data:text/plain,hello").is_err());
        assert_eq!(decode_data_uri("a", "data:;base64,AAE=").unwrap(), vec![0, 1]);
    }
}
