//! ==============================================================================
//! publish.rs - json feed writer
//! ==============================================================================
//!
//! purpose:
//!     writes the two files the dashboard polls:
//!     - current: the latest Sample as a pretty-printed json object
//!     - history: a pretty-printed json array of the last `max_len` samples,
//!       oldest first
//!
//! ```text
//!     both are plain whole-file overwrites. the history file is re-read on
//!     every publish, so the on-disk window is the source of truth.
//! ```
//!
//! ==============================================================================

use crate::domain::Sample;

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

/// rolling window of recent samples, capped at `cap`
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    samples: VecDeque<Sample>,
    cap: usize,
}

impl History {
    pub fn new(cap: usize) -> Self {
        Self { samples: VecDeque::new(), cap }
    }

    /// read the window saved at `path`; absent or unreadable means empty
    pub fn load(path: &Path, cap: usize) -> Self {
        let mut history = Self::new(cap);
        let saved: Vec<Sample> = match fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "history file unreadable, starting empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        for sample in saved {
            history.push(sample);
        }
        history
    }

    /// append and evict from the front until we are back under the cap
    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.cap {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.samples)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write history file {}", path.display()))
    }
}

/// where the feed files go and how long the window is
#[derive(Debug, Clone)]
pub struct Publisher {
    current: PathBuf,
    history: PathBuf,
    cap: usize,
}

impl Publisher {
    pub fn new(current: impl Into<PathBuf>, history: impl Into<PathBuf>, cap: usize) -> Self {
        Self { current: current.into(), history: history.into(), cap }
    }

    /// overwrite the current file, then append to the history window.
    /// returns the window length after the append.
    pub fn publish(&self, sample: &Sample) -> Result<usize> {
        let json = serde_json::to_string_pretty(sample)?;
        fs::write(&self.current, json)
            .with_context(|| format!("Failed to write current file {}", self.current.display()))?;

        let mut history = History::load(&self.history, self.cap);
        history.push(sample.clone());
        history.save(&self.history)?;
        Ok(history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(n: u32) -> Sample {
        Sample {
            timestamp: format!("2024-05-01T10:00:{:02}", n),
            ph: 7.0 + f64::from(n) / 10.0,
            turbidity: 1.0,
            temperature: 20.0,
            tds: 300.0,
            conductivity: 450.0,
        }
    }

    fn saved(path: &Path) -> Vec<Sample> {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn push_keeps_most_recent_within_cap() {
        let mut history = History::new(3);
        for n in 0..5 {
            history.push(sample(n));
        }

        let kept: Vec<_> = history.iter().cloned().collect();
        assert_eq!(kept, vec![sample(2), sample(3), sample(4)]);
    }

    #[test]
    fn huge_cap_does_not_preallocate() {
        let mut history = History::new(usize::MAX);
        history.push(sample(0));
        history.push(sample(1));

        assert_eq!(history.len(), 2);
    }

    #[test]
    fn load_trims_an_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let mut big = History::new(10);
        for n in 0..10 {
            big.push(sample(n));
        }
        big.save(&path).unwrap();

        let history = History::load(&path, 4);

        assert_eq!(history.len(), 4);
        assert_eq!(history.iter().next(), Some(&sample(6)));
    }

    #[test]
    fn unreadable_history_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ broken").unwrap();

        assert!(History::load(&path, 5).is_empty());
        assert!(History::load(&dir.path().join("absent.json"), 5).is_empty());
    }

    #[test]
    fn publish_writes_current_and_appends_history() {
        let dir = TempDir::new().unwrap();
        let current = dir.path().join("data.json");
        let history = dir.path().join("history.json");
        let publisher = Publisher::new(&current, &history, 2);

        assert_eq!(publisher.publish(&sample(1)).unwrap(), 1);
        assert_eq!(publisher.publish(&sample(2)).unwrap(), 2);
        assert_eq!(publisher.publish(&sample(3)).unwrap(), 2);

        let latest: Sample = serde_json::from_str(&fs::read_to_string(&current).unwrap()).unwrap();
        assert_eq!(latest, sample(3));
        assert_eq!(saved(&history), vec![sample(2), sample(3)]);
    }

    #[test]
    fn output_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let current = dir.path().join("data.json");
        let history = dir.path().join("history.json");

        Publisher::new(&current, &history, 5).publish(&sample(0)).unwrap();

        let text = fs::read_to_string(&current).unwrap();
        assert!(text.starts_with("{\n  \"timestamp\": \"2024-05-01T10:00:00\","));
        assert!(fs::read_to_string(&history).unwrap().starts_with("[\n  {\n"));
    }
}
