//! This module provides the data element decoding traits and their
//! implementations for the three base transfer syntaxes.

pub mod basic;
pub mod explicit_be;
pub mod explicit_le;
pub mod implicit_le;

use dcmgate_core::header::{DataElementHeader, SequenceItemHeader, Tag};
use snafu::{Backtrace, Snafu};
use std::io::Read;

pub use self::basic::{BasicDecode, BasicDecoder};
pub use self::explicit_be::ExplicitVRBigEndianDecoder;
pub use self::explicit_le::ExplicitVRLittleEndianDecoder;
pub use self::implicit_le::ImplicitVRLittleEndianDecoder;

/// An error occurred during the decoding of a data element header.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not read tag at the start of an element header"))]
    ReadHeaderTag {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not read the value representation of an element header"))]
    ReadVr {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not read the reserved field of an element header"))]
    ReadReserved {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not read the length of an element header"))]
    ReadLength {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not read an item header"))]
    ReadItemHeader {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not read a tag"))]
    ReadTag {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Could not read a primitive value"))]
    Read {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    #[snafu(display("Invalid sequence item header"))]
    BadSequenceHeader {
        #[snafu(backtrace)]
        source: dcmgate_core::header::SequenceItemError,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Type trait for decoding data element headers from a source.
/// The decoder knows the transfer syntax' byte order and
/// whether value representations are in the stream.
pub trait Decode {
    /// Fetch and decode the next data element header from the given source.
    /// The value data is not decoded and the source is left at the
    /// beginning of the element's value.
    ///
    /// Returns the header and the exact number of bytes it occupied
    /// in the stream.
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read;

    /// Fetch and decode the next sequence item head from the given source.
    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read;

    /// Decode a single attribute tag from the given source.
    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read;
}

/// Obtain the decoder used for the file meta group,
/// which is always in Explicit VR Little Endian.
pub fn file_header_decoder() -> ExplicitVRLittleEndianDecoder {
    ExplicitVRLittleEndianDecoder::default()
}

/// A data element decoder with its concrete transfer syntax
/// decided at run time.
#[derive(Debug, Clone)]
pub enum DataDecoder {
    /// Implicit VR Little Endian
    ImplicitLE(ImplicitVRLittleEndianDecoder),
    /// Explicit VR Little Endian
    ExplicitLE(ExplicitVRLittleEndianDecoder),
    /// Explicit VR Big Endian
    ExplicitBE(ExplicitVRBigEndianDecoder),
}

impl DataDecoder {
    /// Obtain a decoder for the given transfer syntax parameters.
    pub fn new(ts: &crate::transfer_syntax::TransferSyntax) -> Self {
        use crate::transfer_syntax::Endianness;
        match (ts.explicit_vr, ts.endianness) {
            (false, _) => DataDecoder::ImplicitLE(ImplicitVRLittleEndianDecoder::default()),
            (true, Endianness::Little) => {
                DataDecoder::ExplicitLE(ExplicitVRLittleEndianDecoder::default())
            }
            (true, Endianness::Big) => {
                DataDecoder::ExplicitBE(ExplicitVRBigEndianDecoder::default())
            }
        }
    }
}

macro_rules! dispatch {
    ($s:expr, |$d:ident| $f:expr) => {
        match $s {
            DataDecoder::ImplicitLE($d) => $f,
            DataDecoder::ExplicitLE($d) => $f,
            DataDecoder::ExplicitBE($d) => $f,
        }
    };
}

impl Decode for DataDecoder {
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        dispatch!(self, |d| d.decode_header(source))
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        dispatch!(self, |d| d.decode_item_header(source))
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        dispatch!(self, |d| d.decode_tag(source))
    }
}
