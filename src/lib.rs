//! water-feed: republishes water-quality spreadsheet rows as json feeds.
//!
//! each poll cycle reads the whole sheet, publishes the row under the
//! persisted cursor to `data.json`, appends it to the capped `history.json`
//! window and moves the cursor on, wrapping at the end of the sheet.

pub mod config;
pub mod domain;
pub mod feed;
pub mod publish;
pub mod sample;
pub mod source;
pub mod state;

pub use config::FeedConfig;
pub use domain::{CursorState, Sample};
pub use feed::{Cycle, Feed};
