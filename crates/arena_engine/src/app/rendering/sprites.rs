use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::sprite_keys::{sprite_sheet_path, SpriteKeyError};

use super::surface::{SourceRect, SpriteImage};

/// Frames per strip: idle followed by four walk frames.
pub const SHEET_FRAME_COUNT: u32 = 5;

#[derive(Debug, Error)]
pub enum SpriteLoadError {
    #[error("invalid sprite key: {0}")]
    InvalidKey(#[from] SpriteKeyError),
    #[error("failed to open sprite sheet {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode sprite sheet {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(
        "sprite sheet {path} is {width}x{height}; expected a horizontal strip of \
{SHEET_FRAME_COUNT} equal frames"
    )]
    Layout {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteSheet {
    image: SpriteImage,
    frame_width: u32,
}

impl SpriteSheet {
    /// Returns `None` unless the image splits into `SHEET_FRAME_COUNT`
    /// non-empty frames.
    pub fn from_image(image: SpriteImage) -> Option<Self> {
        let expected_len = image.width as usize * image.height as usize * 4;
        if image.height == 0
            || image.width < SHEET_FRAME_COUNT
            || image.width % SHEET_FRAME_COUNT != 0
            || image.rgba.len() < expected_len
        {
            return None;
        }
        Some(Self {
            frame_width: image.width / SHEET_FRAME_COUNT,
            image,
        })
    }

    pub fn image(&self) -> &SpriteImage {
        &self.image
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.image.height)
    }

    /// Source rectangle of `frame`; out-of-range frames clamp to the last.
    pub fn frame_rect(&self, frame: u8) -> SourceRect {
        let index = u32::from(frame).min(SHEET_FRAME_COUNT - 1);
        SourceRect {
            x: index * self.frame_width,
            y: 0,
            width: self.frame_width,
            height: self.image.height,
        }
    }
}

pub fn load_sprite_sheet(path: &Path) -> Result<SpriteSheet, SpriteLoadError> {
    let reader = ImageReader::open(path).map_err(|source| SpriteLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| SpriteLoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let image = SpriteImage {
        width,
        height,
        rgba: rgba.into_raw(),
    };
    SpriteSheet::from_image(image).ok_or_else(|| SpriteLoadError::Layout {
        path: path.to_path_buf(),
        width,
        height,
    })
}

/// Lazily loaded sprite sheets keyed by sprite key. Failures are cached too,
/// so a broken sheet is read and reported once.
#[derive(Debug, Default)]
pub struct SpriteCatalog {
    sprite_dir: Option<PathBuf>,
    sheets: HashMap<String, Option<SpriteSheet>>,
    warned_keys: HashSet<String>,
}

impl SpriteCatalog {
    pub fn new(sprite_dir: impl Into<PathBuf>) -> Self {
        Self {
            sprite_dir: Some(sprite_dir.into()),
            ..Self::default()
        }
    }

    /// A catalog that never touches the filesystem; only inserted sheets
    /// resolve.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, sheet: SpriteSheet) {
        self.sheets.insert(key.into(), Some(sheet));
    }

    pub fn get(&self, key: &str) -> Option<&SpriteSheet> {
        self.sheets.get(key).and_then(Option::as_ref)
    }

    pub fn resolve(&mut self, key: &str) -> Option<&SpriteSheet> {
        if !self.sheets.contains_key(key) {
            let loaded = match self.sprite_dir.as_deref() {
                Some(dir) => match self.load(dir, key) {
                    Ok(sheet) => {
                        debug!(sprite_key = key, "sprite_sheet_loaded");
                        Some(sheet)
                    }
                    Err(error) => {
                        self.warn_once(key, &error);
                        None
                    }
                },
                None => None,
            };
            self.sheets.insert(key.to_string(), loaded);
        }
        self.get(key)
    }

    fn load(&self, dir: &Path, key: &str) -> Result<SpriteSheet, SpriteLoadError> {
        let path = sprite_sheet_path(dir, key)?;
        load_sprite_sheet(&path)
    }

    fn warn_once(&mut self, key: &str, error: &SpriteLoadError) {
        if self.warned_keys.insert(key.to_string()) {
            warn!(sprite_key = key, error = %error, "sprite_sheet_load_failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(width: u32, height: u32) -> SpriteImage {
        SpriteImage {
            width,
            height,
            rgba: vec![255; (width * height * 4) as usize],
        }
    }

    #[test]
    fn frame_rects_walk_across_strip() {
        let sheet = SpriteSheet::from_image(strip(40, 8)).expect("valid strip");
        assert_eq!(sheet.frame_size(), (8, 8));
        assert_eq!(sheet.frame_rect(0).x, 0);
        assert_eq!(sheet.frame_rect(3).x, 24);
        assert_eq!(sheet.frame_rect(9).x, 32);
    }

    #[test]
    fn uneven_strip_is_rejected() {
        assert!(SpriteSheet::from_image(strip(42, 8)).is_none());
        assert!(SpriteSheet::from_image(strip(3, 8)).is_none());
        assert!(SpriteSheet::from_image(strip(40, 0)).is_none());
    }

    #[test]
    fn missing_sheet_is_cached_as_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut catalog = SpriteCatalog::new(dir.path());
        assert!(catalog.resolve("ghost").is_none());
        assert!(catalog.sheets.contains_key("ghost"));
        assert_eq!(catalog.warned_keys.len(), 1);

        assert!(catalog.resolve("ghost").is_none());
        assert_eq!(catalog.warned_keys.len(), 1);
    }

    #[test]
    fn invalid_key_never_reaches_filesystem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = SpriteCatalog::new(dir.path())
            .load(dir.path(), "../escape")
            .expect_err("invalid key");
        assert!(matches!(error, SpriteLoadError::InvalidKey(_)));
    }

    #[test]
    fn empty_catalog_only_serves_inserted_sheets() {
        let mut catalog = SpriteCatalog::empty();
        let sheet = SpriteSheet::from_image(strip(10, 2)).expect("valid strip");
        catalog.insert("robot", sheet);
        assert!(catalog.resolve("robot").is_some());
        assert!(catalog.resolve("other").is_none());
        assert!(catalog.warned_keys.is_empty());
    }
}
