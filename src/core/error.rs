// Error handling for the .outb reader

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OutbError>;

#[derive(Error, Debug)]
pub enum OutbError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported format id {format_id} in {}: is it an OpenFAST binary file?", .path.display())]
    UnsupportedFormat { path: PathBuf, format_id: i16 },

    #[error("Could not read entire {} file: read {read} of {expected} {field}", .path.display())]
    TruncatedFile {
        path: PathBuf,
        field: &'static str,
        read: usize,
        expected: usize,
    },

    #[error("Invalid header in {}: {field} = {value}", .path.display())]
    InvalidHeader {
        path: PathBuf,
        field: &'static str,
        value: i64,
    },

    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    #[error("Encoding error: {0}")]
    Encode(String),
}

impl OutbError {
    /// Path of the file the error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            OutbError::Io { path, .. }
            | OutbError::UnsupportedFormat { path, .. }
            | OutbError::TruncatedFile { path, .. }
            | OutbError::InvalidHeader { path, .. } => Some(path),
            OutbError::ChannelNotFound(_) | OutbError::Encode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_message_names_counts_and_path() {
        let err = OutbError::TruncatedFile {
            path: PathBuf::from("runs/seed_01.outb"),
            field: "channel values",
            read: 7,
            expected: 12,
        };
        let msg = err.to_string();
        assert!(msg.contains("runs/seed_01.outb"));
        assert!(msg.contains("read 7 of 12 channel values"));
        assert_eq!(err.path(), Some(&PathBuf::from("runs/seed_01.outb")));
    }

    #[test]
    fn test_unsupported_message() {
        let err = OutbError::UnsupportedFormat {
            path: PathBuf::from("a.outb"),
            format_id: 9,
        };
        assert!(err.to_string().contains("format id 9"));
        assert!(OutbError::ChannelNotFound("RotSpeed".into()).path().is_none());
    }
}
