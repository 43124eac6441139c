use outb_reader::core::constants::DEFAULT_CHUNK_VALUES;
use outb_reader::ReadOptions;
use serde::{Deserialize, Serialize};
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub buffered: bool,
    pub chunk_values: usize,
    pub log_level: String,
    /// Seconds; rows before this are left out of summaries
    pub window_start: Option<f64>,
    pub window_end: Option<f64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            buffered: true,
            chunk_values: DEFAULT_CHUNK_VALUES,
            log_level: "info".to_string(),
            window_start: None,
            window_end: None,
        }
    }
}

impl ReaderConfig {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            buffered: self.buffered,
            chunk_values: self.chunk_values,
        }
    }

    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    /// Inclusive time window, open ends default to unbounded.
    pub fn window(&self) -> Option<(f64, f64)> {
        if self.window_start.is_none() && self.window_end.is_none() {
            return None;
        }
        Some((
            self.window_start.unwrap_or(f64::NEG_INFINITY),
            self.window_end.unwrap_or(f64::INFINITY),
        ))
    }
}
