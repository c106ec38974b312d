//! Explicit VR Big Endian encoding.

use crate::encode::{Encode, Result, WriteHeaderSnafu, WriteItemHeaderSnafu, WriteTagSnafu};
use byteordered::byteorder::{BigEndian, ByteOrder};
use dcmgate_core::header::{DataElementHeader, Header};
use dcmgate_core::Tag;
use snafu::ResultExt;
use std::io::Write;

/// A data element encoder for the Explicit VR Big Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRBigEndianEncoder;

impl Encode for ExplicitVRBigEndianEncoder {
    fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        BigEndian::write_u16(&mut buf[0..2], tag.group());
        BigEndian::write_u16(&mut buf[2..4], tag.element());
        to.write_all(&buf).context(WriteTagSnafu { tag })?;
        Ok(())
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        if de.vr().has_long_header() {
            let mut buf = [0u8; 12];
            BigEndian::write_u16(&mut buf[0..2], de.tag().group());
            BigEndian::write_u16(&mut buf[2..4], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            BigEndian::write_u32(&mut buf[8..12], de.len().0);
            to.write_all(&buf).context(WriteHeaderSnafu { tag: de.tag() })?;
            Ok(12)
        } else {
            let mut buf = [0u8; 8];
            BigEndian::write_u16(&mut buf[0..2], de.tag().group());
            BigEndian::write_u16(&mut buf[2..4], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            BigEndian::write_u16(&mut buf[6..8], de.len().0 as u16);
            to.write_all(&buf).context(WriteHeaderSnafu { tag: de.tag() })?;
            Ok(8)
        }
    }

    fn encode_item_header<W>(&self, mut to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf[0..2], 0xFFFE);
        BigEndian::write_u16(&mut buf[2..4], 0xE000);
        BigEndian::write_u32(&mut buf[4..8], len);
        to.write_all(&buf).context(WriteItemHeaderSnafu)?;
        Ok(())
    }

    fn encode_item_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf[0..2], 0xFFFE);
        BigEndian::write_u16(&mut buf[2..4], 0xE00D);
        to.write_all(&buf).context(WriteItemHeaderSnafu)?;
        Ok(())
    }

    fn encode_sequence_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        BigEndian::write_u16(&mut buf[0..2], 0xFFFE);
        BigEndian::write_u16(&mut buf[2..4], 0xE0DD);
        to.write_all(&buf).context(WriteItemHeaderSnafu)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmgate_core::{Length, VR};

    #[test]
    fn big_endian_header() {
        let enc = ExplicitVRBigEndianEncoder::default();
        let mut out = Vec::new();
        enc.encode_element_header(
            &mut out,
            DataElementHeader::new(Tag(0x0010, 0x0010), VR::PN, Length(8)),
        )
        .unwrap();
        assert_eq!(
            out,
            vec![0x00, 0x10, 0x00, 0x10, b'P', b'N', 0x00, 0x08]
        );
    }
}
