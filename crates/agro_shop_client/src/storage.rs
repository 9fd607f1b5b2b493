//! crates/agro_shop_client/src/storage.rs
//!
//! A `CartStorage` that keeps the cart as a JSON file, the desktop
//! counterpart of the browser's local storage.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use agro_shop_core::{CartState, CartStorage, PortError, PortResult};
use tracing::warn;

pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CartStorage for FileCartStorage {
    /// A missing file is an empty cart. A file that no longer parses is
    /// discarded the same way, so a bad write never locks the shopper out.
    fn load(&self) -> PortResult<Option<CartState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };
        match serde_json::from_str(&raw) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable cart file");
                Ok(None)
            }
        }
    }

    fn save(&self, state: &CartState) -> PortResult<()> {
        let raw = serde_json::to_string(state).map_err(|e| PortError::Unexpected(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| PortError::Unexpected(e.to_string()))
    }
}
