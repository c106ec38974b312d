//! Explicit VR Big Endian syntax transfer implementation.
//! The tag, length and numeric fields are in big endian;
//! the VR code bytes have no byte order.

use crate::decode::{
    BadSequenceHeaderSnafu, Decode, ReadHeaderTagSnafu, ReadItemHeaderSnafu, ReadLengthSnafu,
    ReadReservedSnafu, ReadTagSnafu, ReadVrSnafu, Result,
};
use byteordered::byteorder::{BigEndian, ByteOrder};
use dcmgate_core::header::{DataElementHeader, Length, SequenceItemHeader};
use dcmgate_core::{Tag, VR};
use snafu::ResultExt;
use std::io::Read;

/// A data element decoder for the Explicit VR Big Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRBigEndianDecoder;

impl Decode for ExplicitVRBigEndianDecoder {
    fn decode_header<S>(&self, source: &mut S) -> Result<(DataElementHeader, usize)>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadHeaderTagSnafu)?;
        let group = BigEndian::read_u16(&buf[0..2]);
        let element = BigEndian::read_u16(&buf[2..4]);

        if group == 0xFFFE {
            // item delimiters do not have VR or reserved field
            source.read_exact(&mut buf).context(ReadItemHeaderSnafu)?;
            let len = BigEndian::read_u32(&buf);
            return Ok((
                DataElementHeader::new((group, element), VR::UN, Length(len)),
                8,
            ));
        }

        source.read_exact(&mut buf[0..2]).context(ReadVrSnafu)?;
        let vr = VR::from_binary([buf[0], buf[1]]).unwrap_or(VR::UN);
        let bytes_read;

        let len = if vr.has_long_header() {
            source.read_exact(&mut buf[0..2]).context(ReadReservedSnafu)?;
            source.read_exact(&mut buf).context(ReadLengthSnafu)?;
            bytes_read = 12;
            BigEndian::read_u32(&buf)
        } else {
            source.read_exact(&mut buf[0..2]).context(ReadLengthSnafu)?;
            bytes_read = 8;
            u32::from(BigEndian::read_u16(&buf[0..2]))
        };

        Ok((
            DataElementHeader::new((group, element), vr, Length(len)),
            bytes_read,
        ))
    }

    fn decode_item_header<S>(&self, source: &mut S) -> Result<SequenceItemHeader>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 8];
        source.read_exact(&mut buf).context(ReadItemHeaderSnafu)?;
        let group = BigEndian::read_u16(&buf[0..2]);
        let element = BigEndian::read_u16(&buf[2..4]);
        let len = BigEndian::read_u32(&buf[4..8]);

        SequenceItemHeader::new((group, element), Length(len)).context(BadSequenceHeaderSnafu)
    }

    fn decode_tag<S>(&self, source: &mut S) -> Result<Tag>
    where
        S: ?Sized + Read,
    {
        let mut buf = [0u8; 4];
        source.read_exact(&mut buf).context(ReadTagSnafu)?;
        Ok(Tag(
            BigEndian::read_u16(&buf[0..2]),
            BigEndian::read_u16(&buf[2..4]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::ExplicitVRBigEndianDecoder;
    use crate::decode::Decode;
    use dcmgate_core::header::{Header, Length};
    use dcmgate_core::{Tag, VR};
    use std::io::Cursor;

    //  Tag: (0010,0010) Patient Name
    //  VR: PN
    //  Length: 8
    //  Value: "DOE^JOHN"
    const RAW: &'static [u8] = &[
        0x00, 0x10, 0x00, 0x10, b'P', b'N', 0x00, 0x08, b'D', b'O', b'E', b'^', b'J', b'O', b'H',
        b'N',
    ];

    #[test]
    fn decode_big_endian_element() {
        let dec = ExplicitVRBigEndianDecoder::default();
        let mut cursor = Cursor::new(RAW);
        let (elem, bytes_read) = dec
            .decode_header(&mut cursor)
            .expect("should find an element");
        assert_eq!(elem.tag(), Tag(0x0010, 0x0010));
        assert_eq!(elem.vr(), VR::PN);
        assert_eq!(elem.len(), Length(8));
        assert_eq!(bytes_read, 8);
    }
}
