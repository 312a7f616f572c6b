//! ==============================================================================
//! state.rs - persisted cursor
//! ==============================================================================
//!
//! the cursor survives restarts in a tiny json file: `{"cursor":N}`.
//! a missing or unreadable file is not an error, we start again from row 0.
//!
//! ==============================================================================

use crate::domain::CursorState;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// read the saved cursor, or the default when there is nothing usable
pub fn load(path: &Path) -> CursorState {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no saved cursor, starting at row 0");
            return CursorState::default();
        }
    };

    match serde_json::from_str(&text) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cursor state");
            CursorState::default()
        }
    }
}

/// overwrite the state file with `state`
pub fn save(path: &Path, state: &CursorState) -> Result<()> {
    let json = serde_json::to_string(state)?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write state file {}", path.display()))
}
