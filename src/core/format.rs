// Data structures for the .outb format

use crate::core::constants::{ElementType, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How the time column is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeEncoding {
    /// int32 time column stored ahead of the payload
    Packed { scale: f64, offset: f64 },
    /// Uniform time computed from the first time and the step
    Computed { start: f64, increment: f64 },
}

impl TimeEncoding {
    /// Time of row `step`. `packed` is the stored time column and is only
    /// consulted for packed time, where it must hold at least `step + 1` values.
    #[inline]
    pub fn time_at(&self, step: usize, packed: &[i32]) -> f64 {
        match *self {
            TimeEncoding::Packed { scale, offset } => (f64::from(packed[step]) - offset) / scale,
            TimeEncoding::Computed { start, increment } => start + increment * step as f64,
        }
    }
}

/// Parsed file header, everything ahead of the packed time / payload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub format: FileFormat,
    pub name_length: usize,
    pub channel_count: usize,
    pub step_count: usize,
    pub time: TimeEncoding,
    pub channel_scale: Vec<f32>,
    pub channel_offset: Vec<f32>,
    pub description: String,
    /// `channel_count + 1` entries, slot 0 is time
    pub channel_names: Vec<String>,
    /// `channel_count + 1` entries, slot 0 is time
    pub channel_units: Vec<String>,
}

impl FileHeader {
    /// Resolves the format into everything the payload reader needs.
    pub fn plan(&self) -> ReadPlan {
        let scaling = self
            .channel_scale
            .iter()
            .zip(&self.channel_offset)
            .enumerate()
            .map(|(idx, (&scale, &offset))| {
                let scaling = ChannelScaling::new(scale, offset);
                if scaling == ChannelScaling::Zero {
                    warn!(
                        "channel {} has NaN scale and offset, filling with zeros",
                        self.channel_names.get(idx + 1).map(String::as_str).unwrap_or("?")
                    );
                }
                scaling
            })
            .collect();

        ReadPlan {
            element: self.format.element_type(),
            time: self.time,
            packed_time: self.format.has_packed_time(),
            channel_count: self.channel_count,
            step_count: self.step_count,
            scaling,
        }
    }

    pub fn metadata(&self, name: impl Into<String>) -> OutbMetadata {
        OutbMetadata {
            name: name.into(),
            description: self.description.clone(),
            format_id: self.format.id(),
            channel_names: self.channel_names.clone(),
            channel_units: self.channel_units.clone(),
        }
    }

    /// Number of payload elements (time excluded).
    pub fn value_count(&self) -> Option<usize> {
        self.step_count.checked_mul(self.channel_count)
    }
}

/// Linear dequantization of a single channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelScaling {
    /// Both scale and offset were NaN in the file
    Zero,
    Linear { scale: f64, offset: f64 },
}

impl ChannelScaling {
    pub fn new(scale: f32, offset: f32) -> Self {
        if scale.is_nan() && offset.is_nan() {
            ChannelScaling::Zero
        } else {
            ChannelScaling::Linear {
                scale: f64::from(scale),
                offset: f64::from(offset),
            }
        }
    }

    #[inline]
    pub fn apply(&self, stored: f64) -> f64 {
        match *self {
            ChannelScaling::Zero => 0.0,
            ChannelScaling::Linear { scale, offset } => (stored - offset) / scale,
        }
    }
}

/// Fully resolved payload layout, built once per file.
#[derive(Debug, Clone)]
pub struct ReadPlan {
    pub element: ElementType,
    pub time: TimeEncoding,
    pub packed_time: bool,
    pub channel_count: usize,
    pub step_count: usize,
    pub scaling: Vec<ChannelScaling>,
}

impl ReadPlan {
    /// Table width including the leading time column.
    pub fn width(&self) -> usize {
        self.channel_count + 1
    }

    /// Dequantizes one row in place; `row[0]` is the time slot.
    #[inline]
    pub fn scale_row(&self, row: &mut [f64]) {
        for (value, scaling) in row[1..].iter_mut().zip(&self.scaling) {
            *value = scaling.apply(*value);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutbMetadata {
    pub name: String,
    pub description: String,
    pub format_id: i16,
    pub channel_names: Vec<String>,
    pub channel_units: Vec<String>,
}

impl OutbMetadata {
    /// Table column of the named channel (0 is time).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.channel_names.iter().position(|n| n == name)
    }

    pub fn unit(&self, name: &str) -> Option<&str> {
        self.column_index(name)
            .and_then(|idx| self.channel_units.get(idx))
            .map(String::as_str)
    }
}

/// Decodes fixed-width text, one char per byte, trimmed.
/// Bytes are not validated, every value maps to the char of the same code.
pub fn decode_text(raw: &[u8]) -> String {
    let text: String = raw.iter().copied().map(char::from).collect();
    text.trim_matches(is_padding).to_string()
}

/// Unicode whitespace plus the information separators U+001C..=U+001F,
/// which the simulator's tooling also strips as padding.
fn is_padding(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Unit fields are stored as e.g. `(m/s)`: trim, then drop one char on each side.
pub fn decode_unit(raw: &[u8]) -> String {
    let text = decode_text(raw);
    let mut chars = text.chars();
    if chars.next().is_none() || chars.next_back().is_none() {
        return String::new();
    }
    chars.as_str().to_string()
}
