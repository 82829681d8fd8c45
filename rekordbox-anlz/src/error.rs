//! Error types for rekordbox-anlz

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binary format error: {0}")]
    BinRw(String),

    #[error("Invalid file magic: expected '{expected}', found '{found}'")]
    InvalidMagic { expected: String, found: String },

    /// The byte stream ends before a header or a declared tag length is satisfied
    #[error("Truncated {context} at offset {offset}: needs {needed} bytes, {available} available")]
    Truncated {
        context: String,
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Malformed '{code}' tag at offset {offset}: {reason}")]
    Decode {
        code: String,
        offset: usize,
        reason: String,
    },

    /// Serialized tag does not match its `len_tag`
    #[error("`len_tag` ({expected}) of '{code}' does not match the data length ({actual})")]
    TagLength {
        code: String,
        expected: u32,
        actual: usize,
    },

    /// Serialized file does not match its `len_file`
    #[error("`len_file` ({expected}) does not match the data length ({actual})")]
    FileLength { expected: u32, actual: usize },

    /// A count or length computed from the content doesn't fit its field
    #[error("{field} of '{code}' ({value}) does not fit its field")]
    LengthOverflow {
        code: String,
        field: &'static str,
        value: usize,
    },

    #[error("File type '{0}' not supported")]
    UnsupportedExtension(String),

    #[error("Tag '{0}' not present")]
    MissingTag(String),

    #[error("Invalid value: {0}")]
    Value(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<binrw::Error> for Error {
    fn from(e: binrw::Error) -> Self {
        Error::BinRw(e.to_string())
    }
}
