// Reconstructed physical table, row-major, column 0 is time

use crate::core::error::{OutbError, Result};
use crate::core::format::OutbMetadata;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    width: usize,
    data: Vec<f64>,
}

impl Table {
    /// Zero-filled table of `rows` x `width`.
    pub fn zeros(rows: usize, width: usize) -> Self {
        Self {
            width,
            data: vec![0.0; rows * width],
        }
    }

    /// Wraps row-major data. `data.len()` must be a multiple of `width`.
    pub fn from_row_major(width: usize, data: Vec<f64>) -> Self {
        assert!(width > 0, "table needs at least the time column");
        assert_eq!(data.len() % width, 0, "data does not fill whole rows");
        Self { width, data }
    }

    pub fn n_rows(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn n_columns(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        let start = idx.checked_mul(self.width)?;
        self.data.get(start..start + self.width)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.width)
    }

    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        if col >= self.width {
            return None;
        }
        Some(self.rows().map(|row| row[col]).collect())
    }

    pub fn time(&self) -> Vec<f64> {
        self.rows().map(|row| row[0]).collect()
    }

    /// Column of the named channel, names as listed in `metadata`.
    pub fn channel(&self, metadata: &OutbMetadata, name: &str) -> Result<Vec<f64>> {
        metadata
            .column_index(name)
            .and_then(|col| self.column(col))
            .ok_or_else(|| OutbError::ChannelNotFound(name.to_string()))
    }

    /// Rows with `start <= time <= end`.
    pub fn window(&self, start: f64, end: f64) -> Table {
        let data = self
            .rows()
            .filter(|row| row[0] >= start && row[0] <= end)
            .flatten()
            .copied()
            .collect();

        Table {
            width: self.width,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_row_major(
            3,
            vec![
                0.0, 10.0, 100.0, //
                0.5, 11.0, 101.0, //
                1.0, 12.0, 102.0, //
                1.5, 13.0, 103.0,
            ],
        )
    }

    #[test]
    fn test_shape_and_access() {
        let table = sample();
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.n_columns(), 3);
        assert_eq!(table.row(1), Some(&[0.5, 11.0, 101.0][..]));
        assert_eq!(table.row(4), None);
        assert_eq!(table.column(2), Some(vec![100.0, 101.0, 102.0, 103.0]));
        assert_eq!(table.column(3), None);
        assert_eq!(table.time(), vec![0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_channel_by_name() {
        let meta = OutbMetadata {
            name: "sample".into(),
            description: String::new(),
            format_id: 2,
            channel_names: vec!["Time".into(), "BldPitch1".into(), "GenTq".into()],
            channel_units: vec!["s".into(), "deg".into(), "kN-m".into()],
        };
        let table = sample();
        assert_eq!(table.channel(&meta, "BldPitch1").unwrap(), vec![10.0, 11.0, 12.0, 13.0]);
        assert!(matches!(
            table.channel(&meta, "RotSpeed"),
            Err(OutbError::ChannelNotFound(name)) if name == "RotSpeed"
        ));
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = sample().window(0.5, 1.0);
        assert_eq!(window.n_rows(), 2);
        assert_eq!(window.time(), vec![0.5, 1.0]);
        assert_eq!(window.column(1), Some(vec![11.0, 12.0]));

        assert!(sample().window(5.0, 6.0).is_empty());
    }
}
