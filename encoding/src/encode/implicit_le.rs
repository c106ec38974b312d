//! Implicit VR Little Endian encoding.

use crate::encode::{Encode, Result, WriteHeaderSnafu, WriteItemHeaderSnafu, WriteTagSnafu};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmgate_core::header::{DataElementHeader, Header};
use dcmgate_core::Tag;
use snafu::ResultExt;
use std::io::Write;

/// A data element encoder for the Implicit VR Little Endian transfer syntax.
/// The header carries no VR; elements are always tag + 4-byte length.
#[derive(Debug, Default, Clone)]
pub struct ImplicitVRLittleEndianEncoder;

impl Encode for ImplicitVRLittleEndianEncoder {
    fn encode_tag<W>(&self, mut to: W, tag: Tag) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 4];
        LittleEndian::write_u16(&mut buf[0..2], tag.group());
        LittleEndian::write_u16(&mut buf[2..4], tag.element());
        to.write_all(&buf).context(WriteTagSnafu { tag })?;
        Ok(())
    }

    fn encode_element_header<W>(&self, mut to: W, de: DataElementHeader) -> Result<usize>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], de.tag().group());
        LittleEndian::write_u16(&mut buf[2..4], de.tag().element());
        LittleEndian::write_u32(&mut buf[4..8], de.len().0);
        to.write_all(&buf).context(WriteHeaderSnafu { tag: de.tag() })?;
        Ok(8)
    }

    fn encode_item_header<W>(&self, mut to: W, len: u32) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..4], 0xE000);
        LittleEndian::write_u32(&mut buf[4..8], len);
        to.write_all(&buf).context(WriteItemHeaderSnafu)?;
        Ok(())
    }

    fn encode_item_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..4], 0xE00D);
        to.write_all(&buf).context(WriteItemHeaderSnafu)?;
        Ok(())
    }

    fn encode_sequence_delimiter<W>(&self, mut to: W) -> Result<()>
    where
        W: Write,
    {
        let mut buf = [0u8; 8];
        LittleEndian::write_u16(&mut buf[0..2], 0xFFFE);
        LittleEndian::write_u16(&mut buf[2..4], 0xE0DD);
        to.write_all(&buf).context(WriteItemHeaderSnafu)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmgate_core::{Length, VR};

    #[test]
    fn header_has_no_vr() {
        let enc = ImplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        let n = enc
            .encode_element_header(
                &mut out,
                DataElementHeader::new(Tag(0x0010, 0x0020), VR::LO, Length(6)),
            )
            .unwrap();
        assert_eq!(n, 8);
        assert_eq!(
            out,
            vec![0x10, 0x00, 0x20, 0x00, 0x06, 0x00, 0x00, 0x00]
        );
    }
}
