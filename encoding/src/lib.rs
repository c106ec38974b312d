#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]
//! DICOM encoding and decoding primitives.
//!
//! This crate provides the byte-level codecs for the three base transfer
//! syntaxes (implicit VR little endian, explicit VR little and big endian),
//! the specific character set text codecs, and the transfer syntax registry.

pub mod decode;
pub mod encode;
pub mod text;
pub mod transfer_syntax;

pub use crate::decode::{DataDecoder, Decode};
pub use crate::encode::{DataEncoder, Encode};
pub use crate::text::{SpecificCharacterSet, TextCodec};
pub use crate::transfer_syntax::{Endianness, TransferSyntax, TransferSyntaxRegistry};
