// Format constants for OpenFAST binary output (.outb)

// File format identifiers, first int16 of every file
pub const FORMAT_WITH_TIME: i16 = 1;
pub const FORMAT_WITHOUT_TIME: i16 = 2;
pub const FORMAT_NO_COMPRESS_WITHOUT_TIME: i16 = 3;
pub const FORMAT_CHAN_LEN_IN: i16 = 4;

// Characters per channel name / unit unless the file says otherwise
pub const DEFAULT_NAME_LENGTH: usize = 10;

// Elements per buffered payload read (4096 * 40)
pub const DEFAULT_CHUNK_VALUES: usize = 163_840;

// Upper bound on a single header/field read before its bytes have arrived
pub const READ_CHUNK_BYTES: usize = 64 * 1024;

// Quantization ranges used when packing channels and time
pub const INT16_MIN: f64 = -32_768.0;
pub const INT16_RANGE: f64 = 65_535.0;
pub const INT32_MIN: f64 = -2_147_483_648.0;
pub const INT32_RANGE: f64 = 4_294_967_295.0;

#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    WithTime = 1,
    WithoutTime = 2,
    NoCompressWithoutTime = 3,
    ChanLenIn = 4,
}

impl FileFormat {
    pub fn from_i16(val: i16) -> Option<Self> {
        match val {
            FORMAT_WITH_TIME => Some(FileFormat::WithTime),
            FORMAT_WITHOUT_TIME => Some(FileFormat::WithoutTime),
            FORMAT_NO_COMPRESS_WITHOUT_TIME => Some(FileFormat::NoCompressWithoutTime),
            FORMAT_CHAN_LEN_IN => Some(FileFormat::ChanLenIn),
            _ => None,
        }
    }

    pub fn id(self) -> i16 {
        self as i16
    }

    /// Packed int32 time column precedes the payload.
    pub fn has_packed_time(self) -> bool {
        self == FileFormat::WithTime
    }

    /// Per-channel scale/offset arrays are stored in the header.
    pub fn has_channel_scaling(self) -> bool {
        self != FileFormat::NoCompressWithoutTime
    }

    /// Name width is stored right after the format id.
    pub fn has_name_length(self) -> bool {
        self == FileFormat::ChanLenIn
    }

    pub fn element_type(self) -> ElementType {
        match self {
            FileFormat::NoCompressWithoutTime => ElementType::Float64,
            _ => ElementType::Int16,
        }
    }
}

/// Storage type of payload elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Int16,
    Float64,
}

impl ElementType {
    pub fn width(self) -> usize {
        match self {
            ElementType::Int16 => 2,
            ElementType::Float64 => 8,
        }
    }

    /// Decodes little-endian elements from `raw` into `out`.
    /// `raw.len()` must equal `out.len() * self.width()`.
    pub fn decode_into(self, raw: &[u8], out: &mut [f64]) {
        debug_assert_eq!(raw.len(), out.len() * self.width());
        match self {
            ElementType::Int16 => {
                for (dst, src) in out.iter_mut().zip(raw.chunks_exact(2)) {
                    *dst = f64::from(i16::from_le_bytes([src[0], src[1]]));
                }
            }
            ElementType::Float64 => {
                for (dst, src) in out.iter_mut().zip(raw.chunks_exact(8)) {
                    let mut bytes = [0u8; 8];
                    bytes.copy_from_slice(src);
                    *dst = f64::from_le_bytes(bytes);
                }
            }
        }
    }
}
