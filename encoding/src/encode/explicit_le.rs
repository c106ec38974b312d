//! Explicit VR Little Endian encoding.

use crate::encode::{Encode, Result, WriteHeaderSnafu, WriteItemHeaderSnafu, WriteTagSnafu};
use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmgate_core::header::{DataElementHeader, Header};
use dcmgate_core::{Tag, VR};
use snafu::ResultExt;
use std::io::Write;

/// A data element encoder for the Explicit VR Little Endian transfer syntax.
#[derive(Debug, Default, Clone)]
pub struct ExplicitVRLittleEndianEncoder;

impl Encode for ExplicitVRLittleEndianEncoder {
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
        if de.vr().has_long_header() {
            let mut buf = [0u8; 12];
            LittleEndian::write_u16(&mut buf[0..2], de.tag().group());
            LittleEndian::write_u16(&mut buf[2..4], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            // buf[6..8] is the reserved field, zeroed
            LittleEndian::write_u32(&mut buf[8..12], de.len().0);
            to.write_all(&buf).context(WriteHeaderSnafu { tag: de.tag() })?;
            Ok(12)
        } else {
            let mut buf = [0u8; 8];
            LittleEndian::write_u16(&mut buf[0..2], de.tag().group());
            LittleEndian::write_u16(&mut buf[2..4], de.tag().element());
            let vr_bytes = de.vr().to_bytes();
            buf[4] = vr_bytes[0];
            buf[5] = vr_bytes[1];
            LittleEndian::write_u16(&mut buf[6..8], de.len().0 as u16);
            to.write_all(&buf).context(WriteHeaderSnafu { tag: de.tag() })?;
            Ok(8)
        }
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

// checks the short and long explicit header forms against
// manually encoded bytes
#[cfg(test)]
mod tests {
    use super::*;
    use dcmgate_core::Length;

    #[test]
    fn short_form_header() {
        let enc = ExplicitVRLittleEndianEncoder::default();
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
            vec![0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x06, 0x00]
        );
    }

    #[test]
    fn long_form_header() {
        let enc = ExplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        let n = enc
            .encode_element_header(
                &mut out,
                DataElementHeader::new(Tag(0x7FE0, 0x0010), VR::OB, Length::UNDEFINED),
            )
            .unwrap();
        assert_eq!(n, 12);
        assert_eq!(
            out,
            vec![0xE0, 0x7F, 0x10, 0x00, b'O', b'B', 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn delimiters() {
        let enc = ExplicitVRLittleEndianEncoder::default();
        let mut out = Vec::new();
        enc.encode_item_header(&mut out, 0).unwrap();
        enc.encode_item_delimiter(&mut out).unwrap();
        enc.encode_sequence_delimiter(&mut out).unwrap();
        assert_eq!(
            out,
            vec![
                0xFE, 0xFF, 0x00, 0xE0, 0x00, 0x00, 0x00, 0x00, //
                0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, //
                0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00,
            ]
        );
    }
}
