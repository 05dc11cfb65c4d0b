use thiserror::Error;

/// Errors produced while decoding wire-format bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("end of buffer")]
    EndOfBuffer,
    #[error("varint is longer than 10 bytes")]
    MalformedVarint,
    #[error("invalid wire type {0}")]
    InvalidWireType(u32),
    #[error("length-delimited payload is not valid utf-8")]
    InvalidUtf8,
}
