// OpenFAST binary output (.outb) reader
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::constants::{ElementType, FileFormat};
pub use crate::core::error::{OutbError, Result};
pub use crate::core::format::{ChannelScaling, FileHeader, OutbMetadata, ReadPlan, TimeEncoding};
pub use crate::core::reader::{read, read_header, read_with_options, OutbReader, ReadOptions};
pub use crate::core::table::Table;
pub use crate::core::writer::{encode, quantize_channel, quantize_time, OutbWriter, RawPayload};

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(DEFAULT_NAME_LENGTH, 10);
        assert_eq!(DEFAULT_CHUNK_VALUES, 4096 * 40);
        assert_eq!(FORMAT_CHAN_LEN_IN, 4);
    }
}
