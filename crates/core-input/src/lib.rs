//! Byte stream → typed key events, including escape-sequence assembly with
//! an explicit timeout.

pub mod decoder;
pub mod tty;

pub use decoder::{ByteOutcome, ByteSource, Decoder};
pub use tty::TtyReader;
