//! Basic data types for interpreting DICOM data elements: attribute tags,
//! value representations, lengths, and element headers.

use snafu::{Backtrace, Snafu};
use std::fmt;
use std::str::from_utf8;

/// An error raised when building a sequence item header
/// from properties which do not describe one.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum SequenceItemError {
    /// The tag is not an item or delimiter tag.
    #[snafu(display("Unexpected tag {} for sequence item header", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },

    /// Delimiters must have a length of zero.
    #[snafu(display("Unexpected delimiter length {}", len))]
    UnexpectedDelimiterLength { len: Length, backtrace: Backtrace },
}

/// A trait for any data type containing a DICOM element header.
#[allow(clippy::len_without_is_empty)]
pub trait Header {
    /// Retrieve the element's tag as a `(group, element)` tuple.
    fn tag(&self) -> Tag;

    /// Retrieve the value data's length as specified by the data element,
    /// in bytes. The concrete value size may be undefined,
    /// which can be the case for sequence elements.
    fn len(&self) -> Length;

    /// Check whether this is the header of a sequence item.
    fn is_item(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE000)
    }

    /// Check whether this is the header of an item delimiter.
    fn is_item_delimiter(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE00D)
    }

    /// Check whether this is the header of a sequence delimiter.
    fn is_sequence_delimiter(&self) -> bool {
        self.tag() == Tag(0xFFFE, 0xE0DD)
    }
}

/// The data element tag: an idiomatic tuple of group and element numbers.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Tag(pub u16, pub u16);

impl Tag {
    /// Getter for the tag's group number.
    #[inline]
    pub fn group(self) -> u16 {
        self.0
    }

    /// Getter for the tag's element number.
    #[inline]
    pub fn element(self) -> u16 {
        self.1
    }

    /// Whether the tag belongs to a private group
    /// (odd group number).
    #[inline]
    pub fn is_private(self) -> bool {
        self.0 & 1 == 1
    }

    /// The private creator tag claiming this element's block:
    /// `(group, 0x0010 | (element >> 8))`.
    /// Only meaningful when [`is_private`](Tag::is_private) is true.
    #[inline]
    pub fn creator_tag(self) -> Tag {
        Tag(self.0, 0x0010 | (self.1 >> 8))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag(0x{:04X}, 0x{:04X})", self.0, self.1)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({:04X},{:04X})", self.0, self.1)
    }
}

impl From<(u16, u16)> for Tag {
    #[inline]
    fn from((g, e): (u16, u16)) -> Tag {
        Tag(g, e)
    }
}

impl From<u32> for Tag {
    /// Split a packed 32-bit tag, group in the high word.
    #[inline]
    fn from(value: u32) -> Tag {
        Tag((value >> 16) as u16, value as u16)
    }
}

impl From<Tag> for u32 {
    #[inline]
    fn from(tag: Tag) -> u32 {
        (u32::from(tag.0) << 16) | u32::from(tag.1)
    }
}

/// A data element length, which may be undefined (`0xFFFF_FFFF`).
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Length(pub u32);

const UNDEFINED_LEN: u32 = 0xFFFF_FFFF;

impl Length {
    /// A length that is undefined.
    pub const UNDEFINED: Length = Length(UNDEFINED_LEN);

    /// Check whether this length is undefined.
    #[inline]
    pub fn is_undefined(self) -> bool {
        self.0 == UNDEFINED_LEN
    }

    /// Check whether this length is well defined.
    #[inline]
    pub fn is_defined(self) -> bool {
        !self.is_undefined()
    }

    /// Fetch the concrete length value, if defined.
    #[inline]
    pub fn get(self) -> Option<u32> {
        if self.is_undefined() {
            None
        } else {
            Some(self.0)
        }
    }
}

impl From<u32> for Length {
    #[inline]
    fn from(o: u32) -> Self {
        Length(o)
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_undefined() {
            f.write_str("Length(Undefined)")
        } else {
            write!(f, "Length({})", self.0)
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_undefined() {
            f.write_str("U/L")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// An enum type for a DICOM value representation.
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, Ord, PartialOrd)]
pub enum VR {
    /// Application Entity
    AE,
    /// Age String
    AS,
    /// Attribute Tag
    AT,
    /// Code String
    CS,
    /// Date
    DA,
    /// Decimal String
    DS,
    /// Date Time
    DT,
    /// Floating Point Single
    FL,
    /// Floating Point Double
    FD,
    /// Integer String
    IS,
    /// Long String
    LO,
    /// Long Text
    LT,
    /// Other Byte
    OB,
    /// Other Double
    OD,
    /// Other Float
    OF,
    /// Other Long
    OL,
    /// Other Very Long
    OV,
    /// Other Word
    OW,
    /// Person Name
    PN,
    /// Short String
    SH,
    /// Signed Long
    SL,
    /// Sequence of Items
    SQ,
    /// Signed Short
    SS,
    /// Short Text
    ST,
    /// Signed Very Long
    SV,
    /// Time
    TM,
    /// Unlimited Characters
    UC,
    /// Unique Identifier (UID)
    UI,
    /// Unsigned Long
    UL,
    /// Unknown
    UN,
    /// Universal Resource Identifier or Locator (URI/URL)
    UR,
    /// Unsigned Short
    US,
    /// Unlimited Text
    UT,
    /// Unsigned Very Long
    UV,
}

impl VR {
    /// Obtain the value representation corresponding to the given two bytes.
    /// Each byte should represent an alphabetic character in upper case.
    pub fn from_binary(chars: [u8; 2]) -> Option<Self> {
        from_utf8(chars.as_ref()).ok().and_then(|s| match s {
            "AE" => Some(VR::AE),
            "AS" => Some(VR::AS),
            "AT" => Some(VR::AT),
            "CS" => Some(VR::CS),
            "DA" => Some(VR::DA),
            "DS" => Some(VR::DS),
            "DT" => Some(VR::DT),
            "FL" => Some(VR::FL),
            "FD" => Some(VR::FD),
            "IS" => Some(VR::IS),
            "LO" => Some(VR::LO),
            "LT" => Some(VR::LT),
            "OB" => Some(VR::OB),
            "OD" => Some(VR::OD),
            "OF" => Some(VR::OF),
            "OL" => Some(VR::OL),
            "OV" => Some(VR::OV),
            "OW" => Some(VR::OW),
            "PN" => Some(VR::PN),
            "SH" => Some(VR::SH),
            "SL" => Some(VR::SL),
            "SQ" => Some(VR::SQ),
            "SS" => Some(VR::SS),
            "ST" => Some(VR::ST),
            "SV" => Some(VR::SV),
            "TM" => Some(VR::TM),
            "UC" => Some(VR::UC),
            "UI" => Some(VR::UI),
            "UL" => Some(VR::UL),
            "UN" => Some(VR::UN),
            "UR" => Some(VR::UR),
            "US" => Some(VR::US),
            "UT" => Some(VR::UT),
            "UV" => Some(VR::UV),
            _ => None,
        })
    }

    /// Retrieve a string representation of this VR.
    pub fn to_string(self) -> &'static str {
        match self {
            VR::AE => "AE",
            VR::AS => "AS",
            VR::AT => "AT",
            VR::CS => "CS",
            VR::DA => "DA",
            VR::DS => "DS",
            VR::DT => "DT",
            VR::FL => "FL",
            VR::FD => "FD",
            VR::IS => "IS",
            VR::LO => "LO",
            VR::LT => "LT",
            VR::OB => "OB",
            VR::OD => "OD",
            VR::OF => "OF",
            VR::OL => "OL",
            VR::OV => "OV",
            VR::OW => "OW",
            VR::PN => "PN",
            VR::SH => "SH",
            VR::SL => "SL",
            VR::SQ => "SQ",
            VR::SS => "SS",
            VR::ST => "ST",
            VR::SV => "SV",
            VR::TM => "TM",
            VR::UC => "UC",
            VR::UI => "UI",
            VR::UL => "UL",
            VR::UN => "UN",
            VR::UR => "UR",
            VR::US => "US",
            VR::UT => "UT",
            VR::UV => "UV",
        }
    }

    /// Retrieve a copy of this VR's byte representation.
    /// The function returns 2 alphabetic characters in upper case.
    pub fn to_bytes(self) -> [u8; 2] {
        let bytes = self.to_string().as_bytes();
        [bytes[0], bytes[1]]
    }

    /// Whether this VR is in the string class:
    /// its values are character data decoded through the
    /// active character repertoire.
    pub fn is_string(self) -> bool {
        matches!(
            self,
            VR::AE
                | VR::AS
                | VR::CS
                | VR::DA
                | VR::DS
                | VR::DT
                | VR::IS
                | VR::LO
                | VR::LT
                | VR::PN
                | VR::SH
                | VR::ST
                | VR::TM
                | VR::UC
                | VR::UI
                | VR::UR
        )
    }

    /// The byte used to pad values of this VR to an even length.
    /// UI values and the binary class pad with NUL,
    /// the remaining string VRs pad with a space.
    pub fn padding(self) -> u8 {
        if self.is_string() && self != VR::UI {
            b' '
        } else {
            0
        }
    }

    /// The unit size in bytes for byte-order conversion of values
    /// with this VR. Values are swapped in units of this size
    /// when moving between little and big endian encodings.
    pub fn unit_size(self) -> usize {
        match self {
            VR::US | VR::SS | VR::OW | VR::AT => 2,
            VR::UL | VR::SL | VR::FL | VR::OF | VR::OL => 4,
            VR::FD | VR::OD | VR::SV | VR::UV | VR::OV => 8,
            _ => 1,
        }
    }

    /// Whether the explicit VR form of an element with this VR
    /// carries a 2-byte reserved field followed by a 4-byte length,
    /// rather than a 2-byte length.
    pub fn has_long_header(self) -> bool {
        matches!(
            self,
            VR::OB
                | VR::OD
                | VR::OF
                | VR::OL
                | VR::OV
                | VR::OW
                | VR::SQ
                | VR::SV
                | VR::UC
                | VR::UN
                | VR::UR
                | VR::UT
                | VR::UV
        )
    }
}

impl fmt::Display for VR {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(VR::to_string(*self))
    }
}

/// A data structure for a data element header, containing
/// a tag, value representation and specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct DataElementHeader {
    /// DICOM tag
    pub tag: Tag,
    /// Value Representation
    pub vr: VR,
    /// Element length
    pub len: Length,
}

impl Header for DataElementHeader {
    fn tag(&self) -> Tag {
        self.tag
    }

    fn len(&self) -> Length {
        self.len
    }
}

impl DataElementHeader {
    /// Create a new data element header with the given properties.
    pub fn new<T: Into<Tag>>(tag: T, vr: VR, len: Length) -> DataElementHeader {
        DataElementHeader {
            tag: tag.into(),
            vr,
            len,
        }
    }

    /// Retrieve the element's value representation.
    pub fn vr(&self) -> VR {
        self.vr
    }
}

/// Data type for describing a sequence item data element.
/// If the element represents an item, it will also contain
/// the specified length.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum SequenceItemHeader {
    /// The cursor contains an item.
    Item {
        /// the length of the item in bytes (can be undefined)
        len: Length,
    },
    /// The cursor read an item delimiter.
    /// The element ends here and should not be read any further.
    ItemDelimiter,
    /// The cursor read a sequence delimiter.
    /// The element ends here and should not be read any further.
    SequenceDelimiter,
}

impl SequenceItemHeader {
    /// Create a sequence item header from the element's raw properties.
    /// An error is raised if the given properties do not relate to a
    /// sequence item, an item delimiter or a sequence delimiter.
    pub fn new<T: Into<Tag>>(
        tag: T,
        len: Length,
    ) -> Result<SequenceItemHeader, SequenceItemError> {
        match tag.into() {
            Tag(0xFFFE, 0xE000) => Ok(SequenceItemHeader::Item { len }),
            Tag(0xFFFE, 0xE00D) => {
                // delimiters should not have a positive length
                if len != Length(0) {
                    UnexpectedDelimiterLengthSnafu { len }.fail()
                } else {
                    Ok(SequenceItemHeader::ItemDelimiter)
                }
            }
            Tag(0xFFFE, 0xE0DD) => {
                if len != Length(0) {
                    UnexpectedDelimiterLengthSnafu { len }.fail()
                } else {
                    Ok(SequenceItemHeader::SequenceDelimiter)
                }
            }
            tag => UnexpectedTagSnafu { tag }.fail(),
        }
    }
}

impl Header for SequenceItemHeader {
    fn tag(&self) -> Tag {
        match *self {
            SequenceItemHeader::Item { .. } => Tag(0xFFFE, 0xE000),
            SequenceItemHeader::ItemDelimiter => Tag(0xFFFE, 0xE00D),
            SequenceItemHeader::SequenceDelimiter => Tag(0xFFFE, 0xE0DD),
        }
    }

    fn len(&self) -> Length {
        match *self {
            SequenceItemHeader::Item { len } => len,
            SequenceItemHeader::ItemDelimiter | SequenceItemHeader::SequenceDelimiter => Length(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_from_u32_and_back() {
        let tag = Tag::from(0x0010_0020);
        assert_eq!(tag, Tag(0x0010, 0x0020));
        assert_eq!(u32::from(tag), 0x0010_0020);
        assert_eq!(tag.to_string(), "(0010,0020)");
    }

    #[test]
    fn private_creator_tag() {
        let tag = Tag(0x0013, 0x1010);
        assert!(tag.is_private());
        assert_eq!(tag.creator_tag(), Tag(0x0013, 0x0010));
        assert!(!Tag(0x0010, 0x0020).is_private());
    }

    #[test]
    fn length_undefined() {
        assert!(Length(0xFFFF_FFFF).is_undefined());
        assert_eq!(Length(0xFFFF_FFFF).get(), None);
        assert_eq!(Length(12).get(), Some(12));
        assert_eq!(Length::UNDEFINED.to_string(), "U/L");
    }

    #[test]
    fn vr_binary_round_trip() {
        assert_eq!(VR::from_binary([b'P', b'N']), Some(VR::PN));
        assert_eq!(VR::from_binary([b'Z', b'Z']), None);
        assert_eq!(VR::PN.to_bytes(), [b'P', b'N']);
    }

    #[test]
    fn vr_classification() {
        assert!(VR::PN.is_string());
        assert!(!VR::OB.is_string());
        assert_eq!(VR::UI.padding(), 0);
        assert_eq!(VR::LO.padding(), b' ');
        assert_eq!(VR::OW.unit_size(), 2);
        assert_eq!(VR::FD.unit_size(), 8);
        assert!(VR::SQ.has_long_header());
        assert!(!VR::US.has_long_header());
    }

    #[test]
    fn sequence_item_header_validation() {
        assert!(matches!(
            SequenceItemHeader::new(Tag(0xFFFE, 0xE000), Length::UNDEFINED),
            Ok(SequenceItemHeader::Item { .. })
        ));
        assert!(matches!(
            SequenceItemHeader::new(Tag(0xFFFE, 0xE0DD), Length(0)),
            Ok(SequenceItemHeader::SequenceDelimiter)
        ));
        assert!(SequenceItemHeader::new(Tag(0xFFFE, 0xE00D), Length(2)).is_err());
        assert!(SequenceItemHeader::new(Tag(0x0008, 0x0005), Length(0)).is_err());
    }
}
