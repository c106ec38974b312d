//! This module contains reusable components for encoding and decoding text
//! in DICOM data structures, including support for character repertoires.
//!
//! Supported character sets: ISO-IR 6 (default), the ISO-8859 family
//! (ISO-IR 100/101/109/110/144), ISO-IR 192 (UTF-8), and GB18030.
//! These capabilities are available through [`SpecificCharacterSet`].

use encoding::all::{GB18030, ISO_8859_1, ISO_8859_2, ISO_8859_3, ISO_8859_4, ISO_8859_5, UTF_8};
use encoding::{DecoderTrap, EncoderTrap, Encoding};
use snafu::{Backtrace, Snafu};
use std::borrow::Cow;
use std::fmt::Debug;

/// An error type for text encoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum EncodeTextError {
    /// A custom error message,
    /// for when the underlying error type does not encode error semantics
    /// into type variants.
    #[snafu(display("{}", message))]
    EncodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

/// An error type for text decoding issues.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DecodeTextError {
    /// A custom error message,
    /// for when the underlying error type does not encode error semantics
    /// into type variants.
    #[snafu(display("{}", message))]
    DecodeCustom {
        /// The error message in plain text.
        message: Cow<'static, str>,
        /// The generated backtrace, if available.
        backtrace: Backtrace,
    },
}

type EncodeResult<T> = Result<T, EncodeTextError>;
type DecodeResult<T> = Result<T, DecodeTextError>;

/// A holder of encoding and decoding mechanisms for text in DICOM content,
/// which according to the standard, depends on the specific character set.
pub trait TextCodec {
    /// Obtain the defined term (unique name) of the text encoding,
    /// which may be used as the value of a
    /// Specific Character Set (0008,0005) element to refer to this codec.
    ///
    /// Should contain no leading or trailing spaces.
    fn name(&self) -> Cow<'static, str>;

    /// Decode the given byte buffer as a single string. The resulting string
    /// _may_ contain backslash characters ('\') to delimit individual values,
    /// and should be split later on if required.
    fn decode(&self, text: &[u8]) -> DecodeResult<String>;

    /// Encode a text value into a byte vector. The input string can
    /// feature multiple text values by using the backslash character ('\')
    /// as the value delimiter.
    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>>;
}

impl<T: ?Sized> TextCodec for Box<T>
where
    T: TextCodec,
{
    fn name(&self) -> Cow<'static, str> {
        self.as_ref().name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        self.as_ref().decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        self.as_ref().encode(text)
    }
}

impl<'a, T: ?Sized> TextCodec for &'a T
where
    T: TextCodec,
{
    fn name(&self) -> Cow<'static, str> {
        (**self).name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        (**self).decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        (**self).encode(text)
    }
}

/// A descriptor for a specific character set,
/// taking part in text encoding and decoding.
///
/// Use [`from_code`](SpecificCharacterSet::from_code)
/// or one of the associated constants to create a character set.
/// From there, use the [`TextCodec`] trait to encode and decode text.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SpecificCharacterSet(CharsetImpl);

impl SpecificCharacterSet {
    /// ISO IR 6: The default character set, as defined by the DICOM standard.
    pub const ISO_IR_6: SpecificCharacterSet = SpecificCharacterSet(CharsetImpl::Default);

    /// ISO IR 100: ISO 8859-1, the Western Europe character set
    pub const ISO_IR_100: SpecificCharacterSet = SpecificCharacterSet(CharsetImpl::IsoIr100);

    /// ISO IR 192: UTF-8 encoding
    pub const ISO_IR_192: SpecificCharacterSet = SpecificCharacterSet(CharsetImpl::IsoIr192);

    /// Obtain the specific character set identified by the given code string.
    ///
    /// Supported code strings include the possible values
    /// in the respective DICOM element (0008,0005).
    pub fn from_code(code: &str) -> Option<Self> {
        CharsetImpl::from_code(code).map(SpecificCharacterSet)
    }
}

impl TextCodec for SpecificCharacterSet {
    fn name(&self) -> Cow<'static, str> {
        self.0.name()
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        self.0.decode(text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        self.0.encode(text)
    }
}

/// An enum type for individual supported character sets.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
#[non_exhaustive]
enum CharsetImpl {
    /// **ISO-IR 6**: the default character set.
    #[default]
    Default,
    /// **ISO-IR 100** (ISO-8859-1): Right-hand part of the Latin alphabet no. 1,
    /// the Western Europe character set.
    IsoIr100,
    /// **ISO-IR 101** (ISO-8859-2): Right-hand part of the Latin alphabet no. 2,
    /// the Central/Eastern Europe character set.
    IsoIr101,
    /// **ISO-IR 109** (ISO-8859-3): Right-hand part of the Latin alphabet no. 3,
    /// the South Europe character set.
    IsoIr109,
    /// **ISO-IR 110** (ISO-8859-4): Right-hand part of the Latin alphabet no. 4,
    /// the North Europe character set.
    IsoIr110,
    /// **ISO-IR 144**: The Latin/Cyrillic character set.
    IsoIr144,
    /// **ISO-IR 192**: The Unicode character set based on the UTF-8 encoding.
    IsoIr192,
    /// **GB18030**: The Simplified Chinese character set.
    Gb18030,
}

impl CharsetImpl {
    /// Obtain the specific character set identified by the given code string.
    pub fn from_code(uid: &str) -> Option<Self> {
        use self::CharsetImpl::*;
        match uid.trim_end() {
            "Default" | "ISO_IR_6" | "ISO_IR 6" | "ISO 2022 IR 6" | "" => Some(Default),
            "ISO_IR_100" | "ISO_IR 100" | "ISO 2022 IR 100" => Some(IsoIr100),
            "ISO_IR_101" | "ISO_IR 101" | "ISO 2022 IR 101" => Some(IsoIr101),
            "ISO_IR_109" | "ISO_IR 109" | "ISO 2022 IR 109" => Some(IsoIr109),
            "ISO_IR_110" | "ISO_IR 110" | "ISO 2022 IR 110" => Some(IsoIr110),
            "ISO_IR_144" | "ISO_IR 144" | "ISO 2022 IR 144" => Some(IsoIr144),
            "ISO_IR_192" | "ISO_IR 192" => Some(IsoIr192),
            "GB18030" => Some(Gb18030),
            _ => None,
        }
    }
}

impl TextCodec for CharsetImpl {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(match self {
            CharsetImpl::Default => "ISO_IR 6",
            CharsetImpl::IsoIr100 => "ISO_IR 100",
            CharsetImpl::IsoIr101 => "ISO_IR 101",
            CharsetImpl::IsoIr109 => "ISO_IR 109",
            CharsetImpl::IsoIr110 => "ISO_IR 110",
            CharsetImpl::IsoIr144 => "ISO_IR 144",
            CharsetImpl::IsoIr192 => "ISO_IR 192",
            CharsetImpl::Gb18030 => "GB18030",
        })
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        match self {
            CharsetImpl::Default => decode_text_trap(&DefaultCharacterSetCodec, text),
            CharsetImpl::IsoIr100 => decode_text(ISO_8859_1, text),
            CharsetImpl::IsoIr101 => decode_text(ISO_8859_2, text),
            CharsetImpl::IsoIr109 => decode_text(ISO_8859_3, text),
            CharsetImpl::IsoIr110 => decode_text(ISO_8859_4, text),
            CharsetImpl::IsoIr144 => decode_text(ISO_8859_5, text),
            CharsetImpl::IsoIr192 => decode_text(UTF_8, text),
            CharsetImpl::Gb18030 => decode_text(GB18030, text),
        }
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        match self {
            CharsetImpl::Default => DefaultCharacterSetCodec.encode(text),
            CharsetImpl::IsoIr100 => encode_text(ISO_8859_1, text),
            CharsetImpl::IsoIr101 => encode_text(ISO_8859_2, text),
            CharsetImpl::IsoIr109 => encode_text(ISO_8859_3, text),
            CharsetImpl::IsoIr110 => encode_text(ISO_8859_4, text),
            CharsetImpl::IsoIr144 => encode_text(ISO_8859_5, text),
            CharsetImpl::IsoIr192 => encode_text(UTF_8, text),
            CharsetImpl::Gb18030 => encode_text(GB18030, text),
        }
    }
}

fn decode_text(codec: &'static dyn Encoding, text: &[u8]) -> DecodeResult<String> {
    codec
        .decode(text, DecoderTrap::Replace)
        .map_err(|message| DecodeCustomSnafu { message }.build())
}

fn decode_text_trap<T>(codec: &T, text: &[u8]) -> DecodeResult<String>
where
    T: TextCodec,
{
    codec.decode(text)
}

fn encode_text(codec: &'static dyn Encoding, text: &str) -> EncodeResult<Vec<u8>> {
    codec
        .encode(text, EncoderTrap::Strict)
        .map_err(|message| EncodeCustomSnafu { message }.build())
}

/// Data type for the default character set text codec (ISO-IR 6).
///
/// Decoding is lenient: bytes outside the basic repertoire are mapped
/// through ISO-8859-1, so that hand-written files with stray high bytes
/// still produce a string.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefaultCharacterSetCodec;

impl TextCodec for DefaultCharacterSetCodec {
    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("ISO_IR 6")
    }

    fn decode(&self, text: &[u8]) -> DecodeResult<String> {
        decode_text(ISO_8859_1, text)
    }

    fn encode(&self, text: &str) -> EncodeResult<Vec<u8>> {
        encode_text(ISO_8859_1, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_codec<T: TextCodec>(codec: T, string: &str, bytes: &[u8]) {
        assert_eq!(codec.decode(bytes).expect("decoding"), string);
        assert_eq!(codec.encode(string).expect("encoding"), bytes);
    }

    #[test]
    fn default_codec_iso_ir_6() {
        let codec = SpecificCharacterSet::default();
        test_codec(&codec, "Smith^John", b"Smith^John");
        test_codec(&codec, "Doe^John", b"Doe^John");
    }

    #[test]
    fn iso_ir_100() {
        let codec = SpecificCharacterSet::from_code("ISO_IR 100").expect("known character set");
        test_codec(&codec, "Sim\u{f5}es^Jo\u{e3}o", b"Sim\xF5es^Jo\xE3o");
    }

    #[test]
    fn utf_8() {
        let codec = SpecificCharacterSet::from_code("ISO_IR 192").expect("known character set");
        test_codec(&codec, "Иванков^Андрей", &[
            0xD0, 0x98, 0xD0, 0xB2, 0xD0, 0xB0, 0xD0, 0xBD, 0xD0, 0xBA, 0xD0, 0xBE, 0xD0, 0xB2,
            0x5E, 0xD0, 0x90, 0xD0, 0xBD, 0xD0, 0xB4, 0xD1, 0x80, 0xD0, 0xB5, 0xD0, 0xB9,
        ]);
    }

    #[test]
    fn from_code_aliases() {
        assert_eq!(
            SpecificCharacterSet::from_code("ISO 2022 IR 100"),
            SpecificCharacterSet::from_code("ISO_IR 100"),
        );
        assert_eq!(SpecificCharacterSet::from_code("GB9999"), None);
    }
}
