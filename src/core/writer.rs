// .outb encoder: writes all four layouts and packs physical data the way the simulator does

use crate::core::constants::*;
use crate::core::error::{OutbError, Result};
use crate::core::format::{FileHeader, TimeEncoding};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Payload elements as stored in the file, row-major.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Int16(Vec<i16>),
    Float64(Vec<f64>),
}

impl RawPayload {
    pub fn len(&self) -> usize {
        match self {
            RawPayload::Int16(values) => values.len(),
            RawPayload::Float64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            RawPayload::Int16(_) => ElementType::Int16,
            RawPayload::Float64(_) => ElementType::Float64,
        }
    }
}

pub struct OutbWriter<W: Write> {
    inner: W,
    path: PathBuf,
}

impl OutbWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| OutbError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> OutbWriter<W> {
    /// `path` only labels IO errors.
    pub fn new(inner: W, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }

    /// Writes one complete file. `packed_time` is required for format 1 and
    /// rejected otherwise.
    pub fn write(
        &mut self,
        header: &FileHeader,
        packed_time: Option<&[i32]>,
        payload: &RawPayload,
    ) -> Result<()> {
        validate(header, packed_time, payload)?;
        debug!(
            "writing format {} with {} channels x {} steps to {}",
            header.format.id(),
            header.channel_count,
            header.step_count,
            self.path.display()
        );

        let mut out = Vec::new();
        out.extend_from_slice(&header.format.id().to_le_bytes());
        if header.format.has_name_length() {
            out.extend_from_slice(&(header.name_length as i16).to_le_bytes());
        }
        out.extend_from_slice(&(header.channel_count as i32).to_le_bytes());
        out.extend_from_slice(&(header.step_count as i32).to_le_bytes());

        let (first, second) = match header.time {
            TimeEncoding::Packed { scale, offset } => (scale, offset),
            TimeEncoding::Computed { start, increment } => (start, increment),
        };
        out.extend_from_slice(&first.to_le_bytes());
        out.extend_from_slice(&second.to_le_bytes());

        if header.format.has_channel_scaling() {
            for scale in &header.channel_scale {
                out.extend_from_slice(&scale.to_le_bytes());
            }
            for offset in &header.channel_offset {
                out.extend_from_slice(&offset.to_le_bytes());
            }
        }

        let description = encode_text(&header.description)?;
        out.extend_from_slice(&(description.len() as i32).to_le_bytes());
        out.extend_from_slice(&description);

        for name in &header.channel_names {
            out.extend_from_slice(&fixed_width(name, header.name_length)?);
        }
        for unit in &header.channel_units {
            out.extend_from_slice(&fixed_width(&format!("({unit})"), header.name_length)?);
        }

        for time in packed_time.unwrap_or_default() {
            out.extend_from_slice(&time.to_le_bytes());
        }

        match payload {
            RawPayload::Int16(values) => {
                for value in values {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
            RawPayload::Float64(values) => {
                for value in values {
                    out.extend_from_slice(&value.to_le_bytes());
                }
            }
        }

        self.inner
            .write_all(&out)
            .and_then(|_| self.inner.flush())
            .map_err(|source| OutbError::Io {
                path: self.path.clone(),
                source,
            })
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Encodes a complete file into memory.
pub fn encode(
    header: &FileHeader,
    packed_time: Option<&[i32]>,
    payload: &RawPayload,
) -> Result<Vec<u8>> {
    let mut writer = OutbWriter::new(Vec::new(), "<memory>");
    writer.write(header, packed_time, payload)?;
    Ok(writer.into_inner())
}

fn validate(header: &FileHeader, packed_time: Option<&[i32]>, payload: &RawPayload) -> Result<()> {
    let channels = header.channel_count;
    let steps = header.step_count;

    if i32::try_from(channels).is_err() || i32::try_from(steps).is_err() {
        return Err(OutbError::Encode("channel or step count exceeds int32".into()));
    }
    if header.format.has_name_length() {
        if i16::try_from(header.name_length).is_err() {
            return Err(OutbError::Encode(format!(
                "name length {} exceeds int16",
                header.name_length
            )));
        }
    } else if header.name_length != DEFAULT_NAME_LENGTH {
        return Err(OutbError::Encode(format!(
            "format {} stores names in {} chars, got {}",
            header.format.id(),
            DEFAULT_NAME_LENGTH,
            header.name_length
        )));
    }
    if header.channel_names.len() != channels + 1 || header.channel_units.len() != channels + 1 {
        return Err(OutbError::Encode(format!(
            "expected {} names and units, got {} and {}",
            channels + 1,
            header.channel_names.len(),
            header.channel_units.len()
        )));
    }
    if header.format.has_channel_scaling()
        && (header.channel_scale.len() != channels || header.channel_offset.len() != channels)
    {
        return Err(OutbError::Encode(format!(
            "expected {} channel scales and offsets",
            channels
        )));
    }

    let packed_time_expected = header.format.has_packed_time();
    if packed_time_expected != matches!(header.time, TimeEncoding::Packed { .. }) {
        return Err(OutbError::Encode(format!(
            "time encoding does not match format {}",
            header.format.id()
        )));
    }
    match packed_time {
        Some(times) if packed_time_expected && times.len() == steps => {}
        None if !packed_time_expected => {}
        _ => {
            return Err(OutbError::Encode(format!(
                "format {} needs {} packed time values",
                header.format.id(),
                if packed_time_expected { steps } else { 0 }
            )))
        }
    }

    if payload.element_type() != header.format.element_type() {
        return Err(OutbError::Encode(format!(
            "format {} stores {:?} elements, payload is {:?}",
            header.format.id(),
            header.format.element_type(),
            payload.element_type()
        )));
    }
    if payload.len() != steps * channels {
        return Err(OutbError::Encode(format!(
            "payload has {} values, header declares {}",
            payload.len(),
            steps * channels
        )));
    }
    Ok(())
}

fn encode_text(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| OutbError::Encode(format!("character {c:?} does not fit a byte")))
        })
        .collect()
}

/// Space-padded or truncated to `width` bytes.
fn fixed_width(text: &str, width: usize) -> Result<Vec<u8>> {
    let mut bytes = encode_text(text)?;
    bytes.resize(width, b' ');
    Ok(bytes)
}

/// Packs a channel into the full int16 range. Returns `(scale, offset, packed)`
/// such that `(packed - offset) / scale` approximates the input.
pub fn quantize_channel(values: &[f64]) -> (f32, f32, Vec<i16>) {
    let Some((min, max)) = min_max(values) else {
        return (1.0, 0.0, Vec::new());
    };

    let scale = if max == min { 1.0 } else { INT16_RANGE / (max - min) };
    let offset = INT16_MIN - scale * min;
    let (scale, offset) = (scale as f32, offset as f32);

    let packed = values
        .iter()
        .map(|v| {
            let scaled = f64::from(scale) * v + f64::from(offset);
            scaled.clamp(INT16_MIN, INT16_MIN + INT16_RANGE).round() as i16
        })
        .collect();

    (scale, offset, packed)
}

/// Packs a time column into the full int32 range for format 1.
pub fn quantize_time(times: &[f64]) -> (TimeEncoding, Vec<i32>) {
    let Some((min, max)) = min_max(times) else {
        return (TimeEncoding::Packed { scale: 1.0, offset: 0.0 }, Vec::new());
    };

    let scale = if max == min { 1.0 } else { INT32_RANGE / (max - min) };
    let offset = INT32_MIN - scale * min;

    let packed = times
        .iter()
        .map(|t| (scale * t + offset).clamp(INT32_MIN, INT32_MIN + INT32_RANGE).round() as i32)
        .collect();

    (TimeEncoding::Packed { scale, offset }, packed)
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    Some(finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
