// OpenFAST binary output (.outb) reader

use crate::core::constants::*;
use crate::core::error::{OutbError, Result};
use crate::core::format::*;
use crate::core::table::Table;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Payload read strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Fill the preallocated table chunk by chunk instead of decoding the
    /// whole payload into a transient buffer first.
    pub buffered: bool,
    /// Elements per buffered read, rounded to whole rows (at least one).
    pub chunk_values: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            buffered: true,
            chunk_values: DEFAULT_CHUNK_VALUES,
        }
    }
}

/// Reads a whole file into a table and its metadata.
pub fn read<P: AsRef<Path>>(path: P, buffered: bool) -> Result<(Table, OutbMetadata)> {
    read_with_options(
        path,
        &ReadOptions {
            buffered,
            ..ReadOptions::default()
        },
    )
}

pub fn read_with_options<P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
) -> Result<(Table, OutbMetadata)> {
    let reader = OutbReader::open(path)?;
    let metadata = reader.metadata();
    let table = reader.read_table(options)?;
    Ok((table, metadata))
}

/// Parses the header only.
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<FileHeader> {
    Ok(OutbReader::open(path)?.header)
}

/// A file whose header has been parsed; the payload is read by `read_table`.
pub struct OutbReader<R: Read> {
    source: FieldReader<R>,
    header: FileHeader,
}

impl OutbReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| OutbError::Io {
            path: path.clone(),
            source,
        })?;
        let len = file.metadata().ok().map(|meta| meta.len());

        OutbReader::from_reader(BufReader::new(file), path, len)
    }
}

impl<R: Read> OutbReader<R> {
    /// Parses the header from any byte source. `path` labels errors and names
    /// the metadata; `len` is the total source length when known, which lets
    /// short payloads fail before the table is allocated.
    pub fn from_reader(inner: R, path: impl Into<PathBuf>, len: Option<u64>) -> Result<Self> {
        let mut source = FieldReader {
            inner,
            path: path.into(),
            position: 0,
            len,
        };
        let header = Self::read_header(&mut source)?;

        Ok(Self { source, header })
    }

    fn read_header(source: &mut FieldReader<R>) -> Result<FileHeader> {
        let format_id = source.read_i16("format id")?;
        let format = FileFormat::from_i16(format_id).ok_or_else(|| OutbError::UnsupportedFormat {
            path: source.path.clone(),
            format_id,
        })?;

        let name_length = if format.has_name_length() {
            let len = source.read_i16("name length")?;
            source.count("name length", i64::from(len))?
        } else {
            DEFAULT_NAME_LENGTH
        };

        let channel_count = source.read_i32("channel count")?;
        let channel_count = source.count("channel count", i64::from(channel_count))?;
        let step_count = source.read_i32("time step count")?;
        let step_count = source.count("time step count", i64::from(step_count))?;

        // the full table must be addressable
        if step_count.checked_mul(channel_count + 1).is_none() {
            return Err(source.invalid("time step count", step_count as i64));
        }

        let first = source.read_f64("time scale")?;
        let second = source.read_f64("time offset")?;
        let time = if format.has_packed_time() {
            TimeEncoding::Packed {
                scale: first,
                offset: second,
            }
        } else {
            TimeEncoding::Computed {
                start: first,
                increment: second,
            }
        };

        let (channel_scale, channel_offset) = if format.has_channel_scaling() {
            (
                source.read_f32_vec(channel_count, "channel scales")?,
                source.read_f32_vec(channel_count, "channel offsets")?,
            )
        } else {
            (Vec::new(), Vec::new())
        };

        let description_length = source.read_i32("description length")?;
        let description_length = source.count("description length", i64::from(description_length))?;
        let description = decode_text(&source.read_bytes(description_length, "description bytes")?);

        // grown as bytes arrive, the declared count is not trusted for allocation
        let mut channel_names = Vec::new();
        for _ in 0..=channel_count {
            channel_names.push(decode_text(&source.read_bytes(name_length, "channel name bytes")?));
        }

        let mut channel_units = Vec::new();
        for _ in 0..=channel_count {
            channel_units.push(decode_unit(&source.read_bytes(name_length, "channel unit bytes")?));
        }

        // uncompressed files store no scaling, synthesized once the names proved the count
        let (channel_scale, channel_offset) = if format.has_channel_scaling() {
            (channel_scale, channel_offset)
        } else {
            (vec![1.0; channel_count], vec![0.0; channel_count])
        };

        debug!(
            "{}: format {}, {} channels, {} steps, {:?}",
            source.path.display(),
            format_id,
            channel_count,
            step_count,
            time
        );

        Ok(FileHeader {
            format,
            name_length,
            channel_count,
            step_count,
            time,
            channel_scale,
            channel_offset,
            description,
            channel_names,
            channel_units,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Metadata named after the file stem.
    pub fn metadata(&self) -> OutbMetadata {
        let name = self
            .source
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.header.metadata(name)
    }

    /// Reads packed time and payload, consuming the reader.
    pub fn read_table(mut self, options: &ReadOptions) -> Result<Table> {
        let plan = self.header.plan();
        let total = self
            .header
            .value_count()
            .ok_or_else(|| self.source.invalid("time step count", plan.step_count as i64))?;

        let packed_time = if plan.packed_time {
            self.source.read_i32_vec(plan.step_count, "time values")?
        } else {
            Vec::new()
        };

        debug!(
            "{}: reading {} values ({})",
            self.source.path.display(),
            total,
            if options.buffered { "buffered" } else { "unbuffered" }
        );

        if options.buffered {
            self.read_buffered(&plan, &packed_time, total, options.chunk_values)
        } else {
            self.read_unbuffered(&plan, &packed_time, total)
        }
    }

    fn read_buffered(
        &mut self,
        plan: &ReadPlan,
        packed_time: &[i32],
        total: usize,
        chunk_values: usize,
    ) -> Result<Table> {
        let width = plan.width();
        let channels = plan.channel_count;
        let element_width = plan.element.width();
        let table_len = plan.step_count * width;

        self.source.ensure_available(total, element_width, "channel values")?;

        let data = if channels == 0 {
            vec![0.0; table_len]
        } else {
            let rows_per_chunk = (chunk_values / channels).clamp(1, plan.step_count.max(1));
            let row_bytes = channels * element_width;
            let mut buffer = vec![0u8; rows_per_chunk * row_bytes];

            // a known length already proved the payload, otherwise grow per chunk
            let capacity = if self.source.len.is_some() {
                table_len
            } else {
                table_len.min(rows_per_chunk * width)
            };
            let mut data = Vec::with_capacity(capacity);
            let mut values_read = 0;

            while data.len() < table_len {
                let n_rows = rows_per_chunk.min((table_len - data.len()) / width);
                let raw = &mut buffer[..n_rows * row_bytes];
                let filled = self.source.fill(raw)?;
                if filled < raw.len() {
                    return Err(self.source.truncated(
                        "channel values",
                        values_read + filled / element_width,
                        total,
                    ));
                }

                let start = data.len();
                data.resize(start + n_rows * width, 0.0);
                for (row, raw_row) in data[start..].chunks_exact_mut(width).zip(raw.chunks_exact(row_bytes)) {
                    plan.element.decode_into(raw_row, &mut row[1..]);
                }
                values_read += raw.len() / element_width;
            }
            data
        };

        let mut table = Table::from_row_major(width, data);
        for (step, row) in table.as_mut_slice().chunks_exact_mut(width).enumerate() {
            plan.scale_row(row);
            row[0] = plan.time.time_at(step, packed_time);
        }

        Ok(table)
    }

    fn read_unbuffered(&mut self, plan: &ReadPlan, packed_time: &[i32], total: usize) -> Result<Table> {
        let channels = plan.channel_count;

        let raw = self.source.read_field(total, plan.element.width(), "channel values")?;
        let mut values = vec![0.0; total];
        plan.element.decode_into(&raw, &mut values);
        drop(raw);

        let mut data = Vec::with_capacity(plan.step_count * plan.width());
        for step in 0..plan.step_count {
            data.push(plan.time.time_at(step, packed_time));
            let row = &values[step * channels..(step + 1) * channels];
            data.extend(row.iter().zip(&plan.scaling).map(|(value, scaling)| scaling.apply(*value)));
        }

        Ok(Table::from_row_major(plan.width(), data))
    }
}

/// Little-endian field reads with truncation accounting.
struct FieldReader<R: Read> {
    inner: R,
    path: PathBuf,
    position: u64,
    len: Option<u64>,
}

impl<R: Read> FieldReader<R> {
    /// Reads until `buf` is full or the source is exhausted.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(OutbError::Io {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }

    /// Fails early when the source length is known and too short.
    fn ensure_available(&self, count: usize, width: usize, field: &'static str) -> Result<()> {
        if let Some(len) = self.len {
            let remaining = len.saturating_sub(self.position);
            let needed = (count as u64).saturating_mul(width as u64);
            if remaining < needed {
                return Err(self.truncated(field, (remaining / width as u64) as usize, count));
            }
        }
        Ok(())
    }

    /// Reads `count` elements of `width` bytes in bounded steps, so a
    /// declared count never allocates more than the source has delivered.
    fn read_field(&mut self, count: usize, width: usize, field: &'static str) -> Result<Vec<u8>> {
        self.ensure_available(count, width, field)?;
        let expected = count
            .checked_mul(width)
            .ok_or_else(|| self.invalid(field, count as i64))?;

        let mut buf = Vec::with_capacity(expected.min(READ_CHUNK_BYTES));
        while buf.len() < expected {
            let start = buf.len();
            let step = (expected - start).min(READ_CHUNK_BYTES);
            buf.resize(start + step, 0);
            let filled = self.fill(&mut buf[start..])?;
            if filled < step {
                return Err(self.truncated(field, (start + filled) / width, count));
            }
        }
        Ok(buf)
    }

    fn read_array<const N: usize>(&mut self, field: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        let filled = self.fill(&mut buf)?;
        if filled < N {
            return Err(self.truncated(field, filled, N));
        }
        Ok(buf)
    }

    fn read_i16(&mut self, field: &'static str) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array(field)?))
    }

    fn read_i32(&mut self, field: &'static str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array(field)?))
    }

    fn read_f64(&mut self, field: &'static str) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array(field)?))
    }

    fn read_bytes(&mut self, count: usize, field: &'static str) -> Result<Vec<u8>> {
        self.read_field(count, 1, field)
    }

    fn read_f32_vec(&mut self, count: usize, field: &'static str) -> Result<Vec<f32>> {
        let raw = self.read_field(count, 4, field)?;
        Ok(raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    fn read_i32_vec(&mut self, count: usize, field: &'static str) -> Result<Vec<i32>> {
        let raw = self.read_field(count, 4, field)?;
        Ok(raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }

    /// Header counts are signed in the file.
    fn count(&self, field: &'static str, value: i64) -> Result<usize> {
        usize::try_from(value).map_err(|_| self.invalid(field, value))
    }

    fn invalid(&self, field: &'static str, value: i64) -> OutbError {
        OutbError::InvalidHeader {
            path: self.path.clone(),
            field,
            value,
        }
    }

    fn truncated(&self, field: &'static str, read: usize, expected: usize) -> OutbError {
        OutbError::TruncatedFile {
            path: self.path.clone(),
            field,
            read,
            expected,
        }
    }
}
