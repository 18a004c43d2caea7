//! Numbered save slots on disk.
//!
//! Development saves are pretty-printed JSON. Release saves hold the same
//! document compacted and base64 encoded, so loading sniffs the payload and
//! decodes it first when it only uses the base64 alphabet.

use std::{
    error::Error,
    fmt, fs,
    path::{Path, PathBuf},
    string::FromUtf8Error,
};

use addd_world::{query, save, World};
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use tracing::info;

/// Number of save slots offered to the player.
pub(crate) const SLOT_COUNT: usize = 3;

/// Save slot directory and encoding policy.
#[derive(Clone, Debug)]
pub(crate) struct SaveSlots {
    dir: PathBuf,
    dev: bool,
}

/// What a slot currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum SlotStatus {
    /// No file has been written yet.
    Empty,
    /// A readable save at the given game time, in minutes.
    Saved {
        /// Game time stored in the save.
        minutes: u64,
        /// Number of entities stored in the save.
        entities: usize,
    },
    /// The file exists but cannot be loaded.
    Unreadable(String),
}

impl SaveSlots {
    pub(crate) fn new(dir: impl Into<PathBuf>, dev: bool) -> Self {
        Self {
            dir: dir.into(),
            dev,
        }
    }

    /// Location of a slot's file.
    pub(crate) fn path(&self, slot: usize) -> Result<PathBuf, SlotError> {
        if slot >= SLOT_COUNT {
            return Err(SlotError::NoSuchSlot(slot));
        }
        Ok(self.dir.join(format!("save{slot}.json")))
    }

    /// Writes the world into a slot, replacing previous contents.
    pub(crate) fn save(&self, slot: usize, world: &World) -> Result<PathBuf> {
        let path = self.path(slot)?;
        let json = save::to_json(world, self.dev)?;
        let data = if self.dev {
            json
        } else {
            STANDARD_NO_PAD.encode(json)
        };

        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        fs::write(&path, data).with_context(|| format!("failed to write {}", path.display()))?;
        info!(slot, path = %path.display(), dev = self.dev, "saved to slot");
        Ok(path)
    }

    /// Reads a world back from a slot.
    pub(crate) fn load(&self, slot: usize) -> Result<World> {
        let path = self.path(slot)?;
        info!(slot, path = %path.display(), "loading slot");
        load_file(&path)
    }

    /// Reports the contents of every slot.
    pub(crate) fn list(&self) -> Vec<(usize, SlotStatus)> {
        (0..SLOT_COUNT)
            .map(|slot| {
                let status = match self.path(slot) {
                    Ok(path) if !path.exists() => SlotStatus::Empty,
                    Ok(path) => match load_file(&path) {
                        Ok(world) => SlotStatus::Saved {
                            minutes: query::clock(&world).minutes(),
                            entities: query::entities(&world).len(),
                        },
                        Err(error) => SlotStatus::Unreadable(format!("{error:#}")),
                    },
                    Err(error) => SlotStatus::Unreadable(error.to_string()),
                };
                (slot, status)
            })
            .collect()
    }
}

fn load_file(path: &Path) -> Result<World> {
    let data =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let json = decode(&data)?;
    let world =
        save::from_json(&json).with_context(|| format!("failed to load {}", path.display()))?;
    Ok(world)
}

/// Returns the JSON text held by a save file.
pub(crate) fn decode(data: &str) -> Result<String, SlotError> {
    let trimmed = data.trim();
    if !is_base64(trimmed) {
        return Ok(trimmed.to_owned());
    }

    let bytes = STANDARD_NO_PAD
        .decode(trimmed.trim_end_matches('='))
        .map_err(SlotError::InvalidEncoding)?;
    String::from_utf8(bytes).map_err(SlotError::InvalidText)
}

fn is_base64(data: &str) -> bool {
    !data.is_empty()
        && data
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'/' | b'='))
}

/// Errors raised while locating or decoding save slots.
#[derive(Debug)]
pub(crate) enum SlotError {
    /// The slot number is out of range.
    NoSuchSlot(usize),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload is not UTF-8 text.
    InvalidText(FromUtf8Error),
}

impl fmt::Display for SlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchSlot(slot) => {
                write!(f, "no save slot {slot} (slots 0..{} exist)", SLOT_COUNT - 1)
            }
            Self::InvalidEncoding(error) => write!(f, "could not decode save payload: {error}"),
            Self::InvalidText(error) => write!(f, "save payload is not text: {error}"),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidText(error) => Some(error),
            Self::NoSuchSlot(_) => None,
        }
    }
}
