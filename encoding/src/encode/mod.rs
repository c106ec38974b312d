//! This module provides the data element encoding traits and their
//! implementations for the three base transfer syntaxes,
//! plus the byte-order conversion helper used when transcoding.

pub mod explicit_be;
pub mod explicit_le;
pub mod implicit_le;

use dcmgate_core::header::DataElementHeader;
use dcmgate_core::Tag;
use snafu::{Backtrace, Snafu};
use std::io::Write;

pub use self::explicit_be::ExplicitVRBigEndianEncoder;
pub use self::explicit_le::ExplicitVRLittleEndianEncoder;
pub use self::implicit_le::ImplicitVRLittleEndianEncoder;

/// An error occurred while encoding data element structures.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not write tag {}", tag))]
    WriteTag {
        tag: Tag,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not write element header of {}", tag))]
    WriteHeader {
        tag: Tag,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not write item header"))]
    WriteItemHeader {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Type trait for encoding data element headers to a sink
/// in a transfer syntax' byte order and VR form.
pub trait Encode {
    /// Encode and write a single attribute tag.
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write;

    /// Encode and write a data element header.
    /// Returns the number of bytes written.
    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write;

    /// Encode and write an item header with the given length.
    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write;

    /// Encode and write an item delimiter.
    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;

    /// Encode and write a sequence delimiter.
    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write;
}

/// Reverse the bytes of each `unit`-sized group in `data` in place,
/// converting values between little and big endian.
/// A unit size below 2 leaves the data untouched.
/// The data length is expected to be a multiple of the unit size.
pub fn swap_value_bytes(data: &mut [u8], unit: usize) {
    if unit < 2 {
        return;
    }
    for chunk in data.chunks_exact_mut(unit) {
        chunk.reverse();
    }
}

/// A data element encoder with its concrete transfer syntax
/// decided at run time.
#[derive(Debug, Clone)]
pub enum DataEncoder {
    /// Implicit VR Little Endian
    ImplicitLE(ImplicitVRLittleEndianEncoder),
    /// Explicit VR Little Endian
    ExplicitLE(ExplicitVRLittleEndianEncoder),
    /// Explicit VR Big Endian
    ExplicitBE(ExplicitVRBigEndianEncoder),
}

impl DataEncoder {
    /// Obtain an encoder for the given transfer syntax parameters.
    pub fn new(ts: &crate::transfer_syntax::TransferSyntax) -> Self {
        use crate::transfer_syntax::Endianness;
        match (ts.explicit_vr, ts.endianness) {
            (false, _) => DataEncoder::ImplicitLE(ImplicitVRLittleEndianEncoder::default()),
            (true, Endianness::Little) => {
                DataEncoder::ExplicitLE(ExplicitVRLittleEndianEncoder::default())
            }
            (true, Endianness::Big) => {
                DataEncoder::ExplicitBE(ExplicitVRBigEndianEncoder::default())
            }
        }
    }
}

macro_rules! dispatch {
    ($s:expr, |$e:ident| $f:expr) => {
        match $s {
            DataEncoder::ImplicitLE($e) => $f,
            DataEncoder::ExplicitLE($e) => $f,
            DataEncoder::ExplicitBE($e) => $f,
        }
    };
}

impl Encode for DataEncoder {
    fn encode_tag<W>(&self, to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        dispatch!(self, |e| e.encode_tag(to, tag))
    }

    fn encode_element_header<W>(&self, to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        dispatch!(self, |e| e.encode_element_header(to, de))
    }

    fn encode_item_header<W>(&self, to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        dispatch!(self, |e| e.encode_item_header(to, len))
    }

    fn encode_item_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        dispatch!(self, |e| e.encode_item_delimiter(to))
    }

    fn encode_sequence_delimiter<W>(&self, to: W) -> Result<()>
    where
        W: Write,
    {
        dispatch!(self, |e| e.encode_sequence_delimiter(to))
    }
}

#[cfg(test)]
mod tests {
    use super::swap_value_bytes;

    #[test]
    fn swapping_units() {
        let mut data = [0x01u8, 0x02, 0x03, 0x04];
        swap_value_bytes(&mut data, 2);
        assert_eq!(data, [0x02, 0x01, 0x04, 0x03]);

        let mut data = [0x01u8, 0x02, 0x03, 0x04];
        swap_value_bytes(&mut data, 4);
        assert_eq!(data, [0x04, 0x03, 0x02, 0x01]);

        let mut data = [0x01u8, 0x02];
        swap_value_bytes(&mut data, 1);
        assert_eq!(data, [0x01, 0x02]);
    }
}
