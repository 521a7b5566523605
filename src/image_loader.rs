use crate::layout::Rect;
use anyhow::Context as _;
use image::RgbaImage;
use log::{info, warn};
use mime_guess::mime::{self, Mime};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("unsupported media type '{media_type}'")]
    UnsupportedType { media_type: String },
    #[error("failed to read '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Light,
    Dark,
    Background,
}

impl Slot {
    pub const ALL: [Slot; 3] = [Slot::Light, Slot::Dark, Slot::Background];

    pub fn key(self) -> &'static str {
        match self {
            Slot::Light => "light",
            Slot::Dark => "dark",
            Slot::Background => "background",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Slot::Light => "Light mode image",
            Slot::Dark => "Dark mode image",
            Slot::Background => "Background image",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(u64);

/// Image bytes exactly as the user supplied them.
#[derive(Debug)]
pub struct ImageResource {
    id: ResourceId,
    name: String,
    media_type: Mime,
    bytes: Vec<u8>,
}

impl ImageResource {
    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &Mime {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decodes to RGBA8 for upload. The stored bytes are left untouched.
    pub fn decode(&self) -> anyhow::Result<RgbaImage> {
        let image = image::load_from_memory(&self.bytes)
            .with_context(|| format!("Failed to decode '{}'", self.name))?;
        Ok(image.into_rgba8())
    }
}

pub fn is_image_type(media_type: &Mime) -> bool {
    media_type.type_() == mime::IMAGE
}

/// Media type implied by a file name. Unknown extensions map to
/// `application/octet-stream`.
pub fn media_type_of(path: &Path) -> Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}

fn parse_image_type(media_type: &str) -> Result<Mime, AcquireError> {
    match media_type.parse::<Mime>() {
        Ok(parsed) if is_image_type(&parsed) => Ok(parsed),
        _ => Err(AcquireError::UnsupportedType {
            media_type: media_type.to_string(),
        }),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// The three image inputs of a session. Each slot owns its resource alone.
#[derive(Debug, Default)]
pub struct ImageSlots {
    light: Option<ImageResource>,
    dark: Option<ImageResource>,
    background: Option<ImageResource>,
    next_id: u64,
}

impl ImageSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&ImageResource> {
        match slot {
            Slot::Light => self.light.as_ref(),
            Slot::Dark => self.dark.as_ref(),
            Slot::Background => self.background.as_ref(),
        }
    }

    fn entry(&mut self, slot: Slot) -> &mut Option<ImageResource> {
        match slot {
            Slot::Light => &mut self.light,
            Slot::Dark => &mut self.dark,
            Slot::Background => &mut self.background,
        }
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        self.get(slot).is_some()
    }

    pub fn is_complete(&self) -> bool {
        Slot::ALL.iter().all(|slot| self.is_filled(*slot))
    }

    pub fn first_empty(&self) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| !self.is_filled(*slot))
    }

    /// Stores `bytes` in `slot`, dropping whatever was there. A media type
    /// that is not `image/*` leaves the slot as it was.
    pub fn submit(
        &mut self,
        slot: Slot,
        name: impl Into<String>,
        bytes: Vec<u8>,
        media_type: &str,
    ) -> Result<&ImageResource, AcquireError> {
        let media_type = parse_image_type(media_type)?;
        self.next_id += 1;
        let resource = ImageResource {
            id: ResourceId(self.next_id),
            name: name.into(),
            media_type,
            bytes,
        };
        info!(
            "Loaded '{}' ({}, {} bytes) into {} slot",
            resource.name,
            resource.media_type,
            resource.bytes.len(),
            slot
        );
        Ok(self.entry(slot).insert(resource))
    }

    /// File picker path. The type is judged from the file name before reading.
    pub fn submit_path(&mut self, slot: Slot, path: &Path) -> Result<&ImageResource, AcquireError> {
        let media_type = media_type_of(path);
        if !is_image_type(&media_type) {
            return Err(AcquireError::UnsupportedType {
                media_type: media_type.to_string(),
            });
        }
        let bytes = std::fs::read(path).map_err(|source| AcquireError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.submit(slot, display_name(path), bytes, media_type.as_ref())
    }

    /// Drag-and-drop path. Only the first dropped file counts, and a first
    /// file that is not an image is dropped without complaint.
    pub fn submit_drop(&mut self, slot: Slot, paths: &[PathBuf]) -> Option<&ImageResource> {
        let first = paths.first()?;
        if !is_image_type(&media_type_of(first)) {
            return None;
        }
        match self.submit_path(slot, first) {
            Ok(resource) => Some(resource),
            Err(AcquireError::UnsupportedType { .. }) => None,
            Err(e) => {
                warn!("Ignoring dropped file: {}", e);
                None
            }
        }
    }

    pub fn remove(&mut self, slot: Slot) {
        if let Some(old) = self.entry(slot).take() {
            info!("Removed '{}' from {} slot", old.name, slot);
        }
    }
}

/// Picks the slot a window-wide drop belongs to: the drop zone under the
/// cursor, else the first empty slot.
pub fn route_drop(zones: &[(Slot, Rect)], cursor: Option<[f32; 2]>, slots: &ImageSlots) -> Option<Slot> {
    cursor
        .and_then(|point| {
            zones
                .iter()
                .find(|(_, zone)| zone.contains(point))
                .map(|(slot, _)| *slot)
        })
        .or_else(|| slots.first_empty())
}

/// Pointer and file-hover state for window-wide drops.
///
/// The pointer position is only trusted while it is fresh: it is cleared when
/// the pointer leaves the window and when a file drag enters it, because no
/// cursor events arrive during an OS drag and the last known position may
/// belong to a different part of the window.
#[derive(Debug, Default)]
pub struct DropTracker {
    cursor: Option<[f32; 2]>,
    hovering: bool,
    pending: Vec<PathBuf>,
}

impl DropTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<[f32; 2]> {
        self.cursor
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    pub fn cursor_moved(&mut self, point: [f32; 2]) {
        self.cursor = Some(point);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    pub fn file_hovered(&mut self) {
        if !self.hovering {
            self.cursor = None;
        }
        self.hovering = true;
    }

    pub fn hover_cancelled(&mut self) {
        self.hovering = false;
    }

    pub fn file_dropped(&mut self, path: PathBuf) {
        self.hovering = false;
        self.pending.push(path);
    }

    /// Files dropped since the last call, in arrival order.
    pub fn take_batch(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.pending)
    }

    /// Slot a drop would land in right now, if any.
    pub fn target(&self, zones: &[(Slot, Rect)], slots: &ImageSlots) -> Option<Slot> {
        route_drop(zones, self.cursor, slots)
    }
}
