use std::path::{Path, PathBuf};

use thiserror::Error;

pub const MAX_SPRITE_KEY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key is {len} bytes, the limit is {MAX_SPRITE_KEY_LEN}")]
    TooLong { len: usize },
    #[error("sprite key must not start or end with '/'")]
    EdgeSlash,
    #[error("sprite key has an empty path segment")]
    EmptySegment,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character {character:?}")]
    InvalidCharacter { character: char },
}

/// Sprite keys name a sheet under the sprite directory: lowercase ASCII,
/// digits, `_`, `-`, and `/` between non-empty segments.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.len() > MAX_SPRITE_KEY_LEN {
        return Err(SpriteKeyError::TooLong { len: key.len() });
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(SpriteKeyError::EdgeSlash);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    if key.split('/').any(str::is_empty) {
        return Err(SpriteKeyError::EmptySegment);
    }
    if let Some(character) = key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-' | '/')))
    {
        return Err(SpriteKeyError::InvalidCharacter { character });
    }
    Ok(())
}

/// `<sprite_dir>/<key>.png` for a validated key.
pub fn sprite_sheet_path(sprite_dir: &Path, key: &str) -> Result<PathBuf, SpriteKeyError> {
    validate_sprite_key(key)?;
    Ok(sprite_dir.join(format!("{key}.png")))
}
