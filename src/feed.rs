//! ==============================================================================
//! feed.rs - the poll loop
//! ==============================================================================
//!
//! purpose:
//!     one cycle = read spreadsheet -> pick row at cursor -> publish -> advance.
//!     cycles repeat on a fixed interval until ctrl-c.
//!
//! cycle:
//!
//! ```text
//!     ┌──────────┐   rows   ┌────────────┐  sample  ┌────────────┐
//!     │ reading  │ ───────> │ extracting │ ───────> │ publishing │
//!     └──────────┘          └────────────┘          └─────┬──────┘
//!          ^                                              │ cursor = index + 1
//!          │               ┌──────────┐                   │
//!          └────────────── │ sleeping │ <─────────────────┘
//!                          └──────────┘
//! ```
//!
//! ```text
//!     an empty sheet or any error skips straight to sleeping. nothing is
//!     rolled back and nothing is retried before the next tick.
//! ```
//!
//! relationships:
//!     - uses: source.rs, sample.rs, publish.rs, state.rs
//!     - used by: main.rs
//!
//! ==============================================================================

use crate::config::FeedConfig;
use crate::domain::{CursorState, Sample};
use crate::publish::Publisher;
use crate::source;
use crate::state;

use anyhow::{Context, Result};
use std::fs;
use std::future::Future;
use std::time::Duration;

/// what a single cycle did
#[derive(Debug, Clone, PartialEq)]
pub enum Cycle {
    /// the sheet had no usable rows; nothing was written
    Empty,
    Published {
        /// 0-based row that was published
        index: usize,
        rows: usize,
        history_len: usize,
        sample: Sample,
    },
}

pub struct Feed {
    config: FeedConfig,
    publisher: Publisher,
    cursor: CursorState,
}

impl Feed {
    /// set up from config, picking up the cursor saved by a previous run
    pub fn new(config: FeedConfig) -> Self {
        let publisher = Publisher::new(
            &config.paths.current,
            &config.paths.history,
            config.history.max_len,
        );
        let cursor = state::load(&config.paths.state);
        Self { config, publisher, cursor }
    }

    pub fn cursor(&self) -> CursorState {
        self.cursor
    }

    /// make sure the directories of all output files exist
    pub fn prepare_dirs(&self) -> Result<()> {
        let paths = &self.config.paths;
        for file in [&paths.current, &paths.history, &paths.state] {
            if let Some(dir) = file.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// run one cycle. the cursor moves once the sample is published, even if
    /// persisting it afterwards fails.
    pub fn run_cycle(&mut self) -> Result<Cycle> {
        let source_path = &self.config.paths.source;
        let table = source::read_table(source_path, &self.config.columns)
            .with_context(|| format!("Failed to load {}", source_path.display()))?;

        if table.is_empty() {
            return Ok(Cycle::Empty);
        }

        let rows = table.len();
        let index = self.cursor.index(rows);
        let sample = table.sample_at(index)?;
        let history_len = self.publisher.publish(&sample)?;

        self.cursor.advance_past(index);
        state::save(&self.config.paths.state, &self.cursor)?;

        Ok(Cycle::Published { index, rows, history_len, sample })
    }

    /// run one cycle and log the outcome; errors never escape
    pub fn tick(&mut self) {
        match self.run_cycle() {
            Ok(Cycle::Empty) => {
                tracing::warn!("No rows in spreadsheet yet");
            }
            Ok(Cycle::Published { index, rows, history_len, sample }) => {
                tracing::info!(
                    row = index + 1,
                    rows,
                    history = history_len,
                    "wrote current + history [{} pts], row {}/{}",
                    history_len,
                    index + 1,
                    rows
                );
                if self.config.logging.show_samples {
                    tracing::info!(
                        timestamp = %sample.timestamp,
                        ph = sample.ph,
                        turbidity = sample.turbidity,
                        temperature = sample.temperature,
                        tds = sample.tds,
                        conductivity = sample.conductivity,
                        "sample"
                    );
                }
            }
            Err(e) => {
                tracing::error!("cycle failed: {:#}", e);
            }
        }
    }

    /// poll forever, sleeping `polling.interval_seconds` between cycles.
    /// returns once ctrl-c is received.
    pub async fn run(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for ctrl-c, feed runs until killed");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// poll until `shutdown` resolves. the future is created once and kept
    /// across cycles, so a signal that lands mid-cycle stops the next sleep.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let interval = Duration::from_secs(self.config.polling.interval_seconds);
        tokio::pin!(shutdown);

        loop {
            self.tick();

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => {
                    tracing::info!(cursor = self.cursor.cursor, "interrupted, stopping feed");
                    break;
                }
            }
        }
    }
}
