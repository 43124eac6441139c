use outb_reader::{OutbMetadata, Table};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub path: String,
    pub description: String,
    pub format_id: i16,
    pub step_count: usize,
    pub time_start: Option<f64>,
    pub time_end: Option<f64>,
    pub channels: Vec<ChannelSummary>,
}

#[derive(Debug, Serialize)]
pub struct ChannelSummary {
    pub name: String,
    pub unit: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FileSummary {
    pub fn new(path: &Path, table: &Table, metadata: &OutbMetadata) -> Self {
        let time = table.time();

        // slot 0 is time
        let channels = metadata
            .channel_names
            .iter()
            .zip(&metadata.channel_units)
            .enumerate()
            .skip(1)
            .map(|(col, (name, unit))| {
                let (min, max) = table
                    .column(col)
                    .map(|values| min_max(&values))
                    .unwrap_or((None, None));
                ChannelSummary {
                    name: name.clone(),
                    unit: unit.clone(),
                    min,
                    max,
                }
            })
            .collect();

        Self {
            name: metadata.name.clone(),
            path: path.display().to_string(),
            description: metadata.description.clone(),
            format_id: metadata.format_id,
            step_count: table.n_rows(),
            time_start: time.first().copied(),
            time_end: time.last().copied(),
            channels,
        }
    }
}

fn min_max(values: &[f64]) -> (Option<f64>, Option<f64>) {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold((None, None), |(lo, hi), v| {
            (
                Some(lo.map_or(v, |lo: f64| lo.min(v))),
                Some(hi.map_or(v, |hi: f64| hi.max(v))),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_skips_time_column() {
        let table = Table::from_row_major(3, vec![0.0, 5.0, -1.0, 0.5, 7.0, f64::NAN, 1.0, 6.0, -3.0]);
        let meta = OutbMetadata {
            name: "seed_1801".into(),
            description: "demo".into(),
            format_id: 2,
            channel_names: vec!["Time".into(), "RotSpeed".into(), "GenTq".into()],
            channel_units: vec!["s".into(), "rpm".into(), "kN-m".into()],
        };

        let summary = FileSummary::new(Path::new("out/seed_1801.outb"), &table, &meta);
        assert_eq!(summary.step_count, 3);
        assert_eq!(summary.time_start, Some(0.0));
        assert_eq!(summary.time_end, Some(1.0));
        assert_eq!(summary.channels.len(), 2);
        assert_eq!(summary.channels[0].name, "RotSpeed");
        assert_eq!((summary.channels[0].min, summary.channels[0].max), (Some(5.0), Some(7.0)));
        assert_eq!((summary.channels[1].min, summary.channels[1].max), (Some(-3.0), Some(-1.0)));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["channels"][1]["unit"], "kN-m");
    }

    #[test]
    fn test_empty_table() {
        let meta = OutbMetadata {
            name: "empty".into(),
            description: String::new(),
            format_id: 3,
            channel_names: vec!["Time".into(), "RotSpeed".into()],
            channel_units: vec!["s".into(), "rpm".into()],
        };
        let summary = FileSummary::new(Path::new("empty.outb"), &Table::zeros(0, 2), &meta);
        assert_eq!(summary.time_start, None);
        assert_eq!((summary.channels[0].min, summary.channels[0].max), (None, None));
    }
}
