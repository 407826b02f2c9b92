use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ratatui::layout::Rect;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol as ImageProtocol;
use ratatui_image::Resize;
use tracing::{debug, warn};

/// Local file behind a cover reference, if it is one. Remote and inline
/// covers are never fetched.
pub(crate) fn resolve_cover_path(site_root: &str, cover: &str) -> Option<PathBuf> {
    let cover = cover.trim();
    if cover.is_empty() {
        return None;
    }
    let lowered = cover.to_ascii_lowercase();
    if lowered.starts_with("http://")
        || lowered.starts_with("https://")
        || lowered.starts_with("data:")
        || lowered.starts_with("//")
    {
        return None;
    }
    let path = Path::new(cover);
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    let relative = cover.trim_start_matches("./");
    Some(Path::new(site_root).join(relative))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CoverKey {
    path: PathBuf,
    width: u16,
    height: u16,
}

/// Decoded covers by path, plus the protocol for the cover currently shown.
#[derive(Default)]
pub(crate) struct CoverCache {
    images: HashMap<PathBuf, Option<image::DynamicImage>>,
    current: Option<(CoverKey, ImageProtocol)>,
}

impl CoverCache {
    /// Makes `current()` hold `cover` fitted to `area`. Returns false when the
    /// cover cannot be drawn as an image.
    pub(crate) fn prepare(
        &mut self,
        picker: &Picker,
        site_root: &str,
        cover: &str,
        area: Rect,
    ) -> bool {
        if area.width == 0 || area.height == 0 {
            self.current = None;
            return false;
        }
        let Some(path) = resolve_cover_path(site_root, cover) else {
            self.current = None;
            return false;
        };
        let key = CoverKey {
            path: path.clone(),
            width: area.width,
            height: area.height,
        };
        if self.current.as_ref().is_some_and(|(k, _)| *k == key) {
            return true;
        }
        self.current = None;

        let decoded = self
            .images
            .entry(path.clone())
            .or_insert_with(|| match image::open(&path) {
                Ok(img) => Some(img),
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "cover not decodable");
                    None
                }
            })
            .clone();
        let Some(decoded) = decoded else {
            return false;
        };

        let size = Rect::new(0, 0, area.width, area.height);
        match picker.new_protocol(decoded, size, Resize::Fit(None)) {
            Ok(protocol) => {
                self.current = Some((key, protocol));
                true
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to encode cover");
                false
            }
        }
    }

    pub(crate) fn current(&self) -> Option<&ImageProtocol> {
        self.current.as_ref().map(|(_, protocol)| protocol)
    }
}
