#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]
//! This crate contains the foundational types for reading, inspecting and
//! writing DICOM data sets: attribute tags, value representations, element
//! headers, and the standard attribute and UID dictionaries.
//!
//! The types here are independent of any particular encoding; the sibling
//! crates build the transfer syntax codecs and the file object on top of
//! them.

pub mod dictionary;
pub mod header;
pub mod tags;

pub use crate::dictionary::{DataDictionary, DictionaryEntry, StandardDataDictionary};
pub use crate::header::{DataElementHeader, Header, Length, SequenceItemHeader, Tag, VR};
