//! Protocol Buffers wire-format writer and reader.
//!
//! The writer is deferred: scalar writes queue operations and track the
//! exact byte length, and `finish` emits the whole queue into a single
//! exact-size buffer. Nested length-delimited messages are built with
//! `fork`/`ldelim` without knowing the inner length in advance.
//!
//! # Example
//!
//! ```
//! use protowire::{Reader, WireType, Writer};
//!
//! let mut writer = Writer::new();
//! writer.tag(1, WireType::LengthDelimited).string("testing");
//! let buf = writer.finish();
//! assert_eq!(buf, b"\x0a\x07testing");
//!
//! let mut reader = Reader::new(&buf);
//! assert_eq!(reader.tag(), Ok((1, WireType::LengthDelimited)));
//! assert_eq!(reader.string(), Ok("testing"));
//! ```

mod error;
mod op;
mod reader;
mod types;
pub mod utf8;
mod writer;

pub use error::ReadError;
pub use reader::Reader;
pub use types::WireType;
pub use writer::Writer;

pub use protowire_longbits::{LongBits, LongBitsError};
