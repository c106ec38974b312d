//! Implicit VR Little Endian syntax transfer implementation:
//! the element header carries no VR, so the decoder consults
//! the attribute dictionary for the canonical representation.

use crate::decode::{
    BadSequenceHeaderSnafu, Decode, ReadHeaderTagSnafu, ReadItemHeaderSnafu, ReadLengthSnafu,
    ReadTagSnafu, Result,
};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmgate_core::dictionary::DataDictionary;
use dcmgate_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmgate_core::{StandardDataDictionary, Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// A data element decoder for the Implicit VR Little Endian transfer syntax,
/// parameterized over an attribute dictionary for VR resolution.
#[derive(Debug, Default, Clone)]
pub struct ImplicitVRLittleEndianDecoder<D = StandardDataDictionary> {
    dict: D,
}

impl<D> ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    /// Create a decoder resolving VRs through the given dictionary.
    pub fn with_dict(dict: D) -> Self {
        ImplicitVRLittleEndianDecoder { dict }
    }
}

impl<D> Decode for ImplicitVRLittleEndianDecoder<D>
where
    D: DataDictionary,
{
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadHeaderTagSnafu)?;
        let group = LittleEndian::read_u16(&buf[0..2]);
        let element = LittleEndian::read_u16(&buf[2..4]);
        let tag = Tag(group, element);

        source.read_exact(&mut buf).context(ReadLengthSnafu)?;
        let len = Length(LittleEndian::read_u32(&buf));

        // VR comes from the dictionary; unknown tags default to UN,
        // and an undefined length forces the element to be a sequence
        let mut vr = if group == 0xFFFE {
            VR::UN
        } else {
            self.dict.vr_of(tag)
        };
        if len.is_undefined() && vr != VR::SQ && tag != Tag(0x7FE0, 0x0010) && group != 0xFFFE {
            vr = VR::SQ;
        }

        Ok((DataElementHeader::new(tag, vr, len), 8))
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf).context(ReadItemHeaderSnafu)?;
        let group = LittleEndian::read_u16(&buf[0..2]);
        let element = LittleEndian::read_u16(&buf[2..4]);
        let len = LittleEndian::read_u32(&buf[4..8]);

        SequenceItemHeader::new((group, element), Length(len)).context(BadSequenceHeaderSnafu)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadTagSnafu)?;
        Ok(Tag(
            LittleEndian::read_u16(&buf[0..2]),
            LittleEndian::read_u16(&buf[2..4]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::ImplicitVRLittleEndianDecoder;
    use crate::decode::Decode;
    use dcmgate_core::header::{Header, Length};
    use dcmgate_core::{StandardDataDictionary, Tag, VR};
    use std::io::Cursor;

    //  Tag: (0010,0020) Patient ID
    //  Length: 6
    //  Value: "ABC123"
    // --
    //  Tag: (0009,0001) (private, unknown)
    //  Length: 2
    //  Value: 0x0102
    const RAW: &'static [u8] = &[
        0x10, 0x00, 0x20, 0x00, 0x06, 0x00, 0x00, 0x00, b'A', b'B', b'C', b'1', b'2', b'3', 0x09,
        0x00, 0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0x01, 0x02,
    ];

    #[test]
    fn vr_comes_from_the_dictionary() {
        let dec = ImplicitVRLittleEndianDecoder::<StandardDataDictionary>::default();
        let mut cursor = Cursor::new(RAW);
        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0010, 0x0020));
        assert_eq!(elem.vr(), VR::LO);
        assert_eq!(elem.len(), Length(6));
        assert_eq!(bytes_read, 8);
    }

    #[test]
    fn unknown_tags_default_to_un() {
        let dec = ImplicitVRLittleEndianDecoder::<StandardDataDictionary>::default();
        let mut cursor = Cursor::new(&RAW[14..]);
        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0009, 0x0001));
        assert_eq!(elem.vr(), VR::UN);
    }

    //  Tag: (0008,103F) (not in the subset dictionary)
    //  Length: undefined → decoded as a sequence
    const RAW_UNDEFINED_SEQ: &'static [u8] = &[
        0x08, 0x00, 0x3F, 0x10, 0xFF, 0xFF, 0xFF, 0xFF,
    ];

    #[test]
    fn undefined_length_implies_sequence() {
        let dec = ImplicitVRLittleEndianDecoder::<StandardDataDictionary>::default();
        let mut cursor = Cursor::new(RAW_UNDEFINED_SEQ);
        let (elem, _) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.vr(), VR::SQ);
        assert!(elem.len().is_undefined());
    }
}
