//! This module implements the streaming data set reader: file format
//! detection, the file meta group, and the main data set up to (but not
//! including) the pixel data value. The reader keeps a cursor so that a
//! later save can resume copying the remainder of the source stream.

use crate::mem::{DataSet, Element, Strings, Value};
use crate::meta::FileMetaTable;
use dcmgate_core::header::{Header, SequenceItemHeader};
use dcmgate_core::{tags, Length, Tag, VR};
use dcmgate_encoding::decode::{self, DataDecoder, Decode};
use dcmgate_encoding::text::{SpecificCharacterSet, TextCodec};
use dcmgate_encoding::transfer_syntax::{self, TransferSyntax, TransferSyntaxRegistry};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Seek, SeekFrom};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The source does not look like a DICOM stream in any of the
    /// recognized encodings.
    #[snafu(display("Unrecognized file format"))]
    UnrecognizedFormat { backtrace: Backtrace },

    /// The transfer syntax declared in the file meta group is unknown
    /// or cannot be decoded by this implementation.
    #[snafu(display("Unsupported transfer syntax `{}`", uid))]
    UnsupportedTransferSyntax { uid: String, backtrace: Backtrace },

    /// The file meta group could not be parsed.
    #[snafu(display("Could not read file meta group"))]
    ReadMeta {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },

    /// A data element header could not be decoded.
    #[snafu(display("Could not decode data element header at position {}", position))]
    DecodeHeader {
        position: u64,
        #[snafu(backtrace)]
        source: decode::Error,
    },

    /// A data element value could not be read.
    #[snafu(display("Could not read value at position {}", position))]
    ReadValue {
        position: u64,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// An item or delimiter tag appeared where it is not allowed.
    #[snafu(display("Unexpected tag {} at position {}", tag, position))]
    UnexpectedToken {
        tag: Tag,
        position: u64,
        backtrace: Backtrace,
    },

    /// The source could not be repositioned.
    #[snafu(display("Could not reposition the source stream"))]
    Seek {
        backtrace: Backtrace,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// The reader's resumption state after a parse that stopped at the
/// pixel data element: the header at the read cursor and the stream
/// position of the first value byte.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadCursor {
    /// the tag at the read cursor (always PixelData)
    pub tag: Tag,
    /// the value representation at the read cursor
    pub vr: VR,
    /// the declared value length at the read cursor
    pub len: Length,
    /// stream position of the first byte of the value
    pub position: u64,
}

/// Everything a single parse pass produces.
#[derive(Debug)]
pub(crate) struct ParseOutcome {
    pub meta: Option<FileMetaTable>,
    pub dataset: DataSet,
    pub ts: &'static TransferSyntax,
    pub cursor: Option<ReadCursor>,
}

/// Parse a DICOM object from the given source,
/// leaving the stream at the read cursor.
pub(crate) fn read_object<S>(source: &mut S) -> Result<ParseOutcome>
where
    S: Read + Seek,
{
    source.seek(SeekFrom::Start(0)).context(SeekSnafu)?;
    let mut head = [0u8; 132];
    let head_len = read_fully(source, &mut head).context(ReadValueSnafu { position: 0u64 })?;

    if head_len == 132 && head[128..132] == *b"DICM" {
        // preamble + magic: file meta group follows
        source.seek(SeekFrom::Start(128)).context(SeekSnafu)?;
        let meta = FileMetaTable::from_reader(&mut *source).context(ReadMetaSnafu)?;
        let uid = meta.transfer_syntax().to_string();
        let ts = TransferSyntaxRegistry::get(&uid)
            .context(UnsupportedTransferSyntaxSnafu { uid: uid.clone() })?;
        ensure!(ts.is_decodable(), UnsupportedTransferSyntaxSnafu { uid });

        let position = source.seek(SeekFrom::Current(0)).context(SeekSnafu)?;
        let mut reader = DataSetReader::new(DataDecoder::new(ts), position);
        let (dataset, cursor) = reader.read_root(source)?;
        return Ok(ParseOutcome {
            meta: Some(meta),
            dataset,
            ts,
            cursor,
        });
    }

    // no magic code: probe for a raw data set
    let ts = detect_raw_encoding(&head[..head_len])?;
    source.seek(SeekFrom::Start(0)).context(SeekSnafu)?;
    let mut reader = DataSetReader::new(DataDecoder::new(ts), 0);
    let (dataset, cursor) = reader.read_root(source)?;
    Ok(ParseOutcome {
        meta: None,
        dataset,
        ts,
        cursor,
    })
}

/// Guess the encoding of a headerless data set from its first bytes.
///
/// A plausible first element has an even group number up to 0x0008
/// (or the pixel data group) and a defined length below 256 MiB.
/// When the bytes at offset 4 form a known VR code the element must be
/// explicit VR; otherwise implicit VR little endian is assumed.
fn detect_raw_encoding(head: &[u8]) -> Result<&'static TransferSyntax> {
    ensure!(head.len() >= 8, UnrecognizedFormatSnafu);

    let group_le = u16::from(head[0]) | (u16::from(head[1]) << 8);
    let group_be = (u16::from(head[0]) << 8) | u16::from(head[1]);
    let len_le = u32::from(head[4])
        | (u32::from(head[5]) << 8)
        | (u32::from(head[6]) << 16)
        | (u32::from(head[7]) << 24);
    let vr_known = head[4].is_ascii_uppercase()
        && head[5].is_ascii_uppercase()
        && VR::from_binary([head[4], head[5]]).is_some();

    if plausible_group(group_le) && !vr_known && len_le < 0x1000_0000 {
        return Ok(&transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN);
    }
    if plausible_group(group_le) && vr_known {
        return Ok(&transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN);
    }
    if plausible_group(group_be) && vr_known {
        return Ok(&transfer_syntax::EXPLICIT_VR_BIG_ENDIAN);
    }
    UnrecognizedFormatSnafu.fail()
}

fn plausible_group(group: u16) -> bool {
    (group % 2 == 0 && (0x0002..=0x0008).contains(&group)) || group == 0x7FE0
}

/// Fill the buffer from the source, stopping early at end of stream.
/// Returns the number of bytes actually read.
fn read_fully<S: Read>(source: &mut S, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match source.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}

/// Whether the decoding error is a clean end of stream at an element
/// boundary (the only place where running out of data is not an error).
fn is_eof(e: &decode::Error) -> bool {
    matches!(
        e,
        decode::Error::ReadHeaderTag { source, .. }
            if source.kind() == std::io::ErrorKind::UnexpectedEof
    )
}

/// A stateful data set reader which tracks the stream position
/// as it consumes element headers and values.
#[derive(Debug)]
pub(crate) struct DataSetReader {
    decoder: DataDecoder,
    position: u64,
}

impl DataSetReader {
    pub fn new(decoder: DataDecoder, position: u64) -> Self {
        DataSetReader { decoder, position }
    }

    /// Read the root data set. Stops cleanly at end of stream or at the
    /// pixel data element, whose value is left unread in the source.
    pub fn read_root<S>(&mut self, source: &mut S) -> Result<(DataSet, Option<ReadCursor>)>
    where
        S: Read,
    {
        let mut ds = DataSet::new();
        let cursor = loop {
            let header = match self.decoder.decode_header(source) {
                Ok((header, bytes_read)) => {
                    self.position += bytes_read as u64;
                    header
                }
                Err(e) if is_eof(&e) => break None,
                Err(e) => {
                    return Err(e).context(DecodeHeaderSnafu {
                        position: self.position,
                    })
                }
            };

            if header.tag() == tags::PIXEL_DATA {
                // do not consume the value; the cursor points at it
                break Some(ReadCursor {
                    tag: header.tag(),
                    vr: header.vr(),
                    len: header.len(),
                    position: self.position,
                });
            }

            let elem = self.read_element(source, header, &mut ds)?;
            ds.put(elem);
        };
        Ok((ds, cursor))
    }

    /// Read a single element whose header was already consumed,
    /// updating the data set's character set when a
    /// _SpecificCharacterSet_ element passes through.
    fn read_element<S>(
        &mut self,
        source: &mut S,
        header: dcmgate_core::DataElementHeader,
        ds: &mut DataSet,
    ) -> Result<Element>
    where
        S: Read,
    {
        let tag = header.tag();

        ensure!(
            tag.group() != 0xFFFE,
            UnexpectedTokenSnafu {
                tag,
                position: self.position,
            }
        );

        if header.vr() == VR::SQ || header.len().is_undefined() {
            let items = self.read_sequence(source, header.len(), ds.charset().clone())?;
            return Ok(Element::new(tag, VR::SQ, header.len(), Value::Sequence(items)));
        }

        // a defined-length primitive value
        let len = header.len().0 as usize;
        let mut data = vec![0; len];
        source.read_exact(&mut data).context(ReadValueSnafu {
            position: self.position,
        })?;
        self.position += len as u64;

        let value = if header.vr().is_string() {
            match ds.charset().decode(&data) {
                Ok(text) => {
                    let pad = header.vr().padding() as char;
                    let text = text.trim_end_matches(pad);
                    let strings: Strings = if text.is_empty() {
                        Strings::new()
                    } else {
                        text.split('\\').map(|s| s.to_string()).collect()
                    };
                    Value::Strings(strings)
                }
                Err(e) => {
                    tracing::warn!("Could not decode text of {}: {}", tag, e);
                    Value::Primitive(data)
                }
            }
        } else {
            Value::Primitive(data)
        };

        if tag == tags::SPECIFIC_CHARACTER_SET {
            self.install_charset(&value, ds);
        }

        Ok(Element::new(tag, header.vr(), header.len(), value))
    }

    /// Install the character set named by a freshly parsed
    /// _SpecificCharacterSet_ element for the rest of this scope.
    fn install_charset(&self, value: &Value, ds: &mut DataSet) {
        let code = value
            .strings()
            .and_then(|s| s.first())
            .map(String::as_str)
            .unwrap_or("");
        match SpecificCharacterSet::from_code(code) {
            Some(charset) => ds.set_charset(charset),
            None => {
                tracing::warn!("Unsupported character set `{}`, keeping the current one", code);
            }
        }
    }

    /// Read the items of a sequence value. Defined-length sequences are
    /// bounded by their byte count; undefined-length sequences end at the
    /// sequence delimitation item.
    fn read_sequence<S>(
        &mut self,
        source: &mut S,
        len: Length,
        charset: SpecificCharacterSet,
    ) -> Result<Vec<DataSet>>
    where
        S: Read,
    {
        let mut items = Vec::new();
        let end = len.get().map(|l| self.position + u64::from(l));

        loop {
            if let Some(end) = end {
                if self.position >= end {
                    break;
                }
            }
            let item = self
                .decoder
                .decode_item_header(source)
                .context(DecodeHeaderSnafu {
                    position: self.position,
                })?;
            self.position += 8;
            match item {
                SequenceItemHeader::Item { len } => {
                    items.push(self.read_item(source, len, charset.clone())?);
                }
                SequenceItemHeader::SequenceDelimiter => break,
                SequenceItemHeader::ItemDelimiter => {
                    return UnexpectedTokenSnafu {
                        tag: Tag(0xFFFE, 0xE00D),
                        position: self.position,
                    }
                    .fail();
                }
            }
        }
        Ok(items)
    }

    /// Read a single sequence item as a nested data set,
    /// inheriting the enclosing scope's character set.
    fn read_item<S>(
        &mut self,
        source: &mut S,
        len: Length,
        charset: SpecificCharacterSet,
    ) -> Result<DataSet>
    where
        S: Read,
    {
        let mut ds = DataSet::with_charset(charset);
        match len.get() {
            Some(len) => {
                let end = self.position + u64::from(len);
                while self.position < end {
                    let (header, bytes_read) =
                        self.decoder
                            .decode_header(source)
                            .context(DecodeHeaderSnafu {
                                position: self.position,
                            })?;
                    self.position += bytes_read as u64;
                    let elem = self.read_element(source, header, &mut ds)?;
                    ds.put(elem);
                }
            }
            None => loop {
                let (header, bytes_read) =
                    self.decoder
                        .decode_header(source)
                        .context(DecodeHeaderSnafu {
                            position: self.position,
                        })?;
                self.position += bytes_read as u64;
                if header.tag() == tags::ITEM_DELIMITATION_ITEM {
                    break;
                }
                let elem = self.read_element(source, header, &mut ds)?;
                ds.put(elem);
            },
        }
        Ok(ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcmgate_core::header::Header;
    use std::io::Cursor;

    // raw data set in implicit VR little endian:
    //  (0008,0060) CS "CT", (0010,0020) LO "ABC123"
    const RAW_IMPLICIT: &'static [u8] = &[
        0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, b'C', b'T', //
        0x10, 0x00, 0x20, 0x00, 0x06, 0x00, 0x00, 0x00, b'A', b'B', b'C', b'1', b'2', b'3',
    ];

    #[test]
    fn raw_implicit_data_set() {
        let mut cursor = Cursor::new(RAW_IMPLICIT.to_vec());
        let outcome = read_object(&mut cursor).expect("should parse");
        assert!(outcome.meta.is_none());
        assert_eq!(outcome.ts.uid, "1.2.840.10008.1.2");
        assert!(outcome.cursor.is_none());
        let modality = outcome.dataset.get(Tag(0x0008, 0x0060)).unwrap();
        assert_eq!(modality.joined_strings('\\').unwrap(), "CT");
        let id = outcome.dataset.get(Tag(0x0010, 0x0020)).unwrap();
        assert_eq!(id.joined_strings('\\').unwrap(), "ABC123");
    }

    // raw data set in explicit VR little endian
    const RAW_EXPLICIT: &'static [u8] = &[
        0x08, 0x00, 0x60, 0x00, b'C', b'S', 0x02, 0x00, b'M', b'R', //
        0x10, 0x00, 0x20, 0x00, b'L', b'O', 0x06, 0x00, b'X', b'Y', b'Z', b'9', b'8', b'7',
    ];

    #[test]
    fn raw_explicit_data_set() {
        let mut cursor = Cursor::new(RAW_EXPLICIT.to_vec());
        let outcome = read_object(&mut cursor).expect("should parse");
        assert_eq!(outcome.ts.uid, "1.2.840.10008.1.2.1");
        let modality = outcome.dataset.get(Tag(0x0008, 0x0060)).unwrap();
        assert_eq!(modality.joined_strings('\\').unwrap(), "MR");
    }

    #[test]
    fn garbage_is_unrecognized() {
        let mut cursor = Cursor::new(b"this is not a DICOM file at all".to_vec());
        assert!(matches!(
            read_object(&mut cursor),
            Err(Error::UnrecognizedFormat { .. })
        ));
    }

    // undefined-length sequence with one item holding (0010,0020) LO "A",
    // followed by a top-level element
    const RAW_SEQ: &'static [u8] = &[
        // (0004,1220) SQ undefined length
        0x04, 0x00, 0x20, 0x12, 0xFF, 0xFF, 0xFF, 0xFF, //
        // item, undefined length
        0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF, //
        // (0010,0020) LO "A " (padded)
        0x10, 0x00, 0x20, 0x00, 0x02, 0x00, 0x00, 0x00, b'A', b' ', //
        // item delimitation
        0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00, //
        // sequence delimitation
        0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00, //
        // (0008,0060) CS "CT"
        0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, b'C', b'T',
    ];

    #[test]
    fn undefined_length_sequence() {
        // note: the sequence comes first, so the detection heuristic sees
        // group 0x0004 with a huge "length"; make it a preamble-less
        // implicit file by prepending a plausible first element
        let mut data = RAW_IMPLICIT.to_vec();
        data.extend_from_slice(RAW_SEQ);
        let mut cursor = Cursor::new(data);
        let outcome = read_object(&mut cursor).expect("should parse");

        let seq = outcome.dataset.get(Tag(0x0004, 0x1220)).unwrap();
        assert_eq!(seq.vr(), VR::SQ);
        let items = seq.value().items().unwrap();
        assert_eq!(items.len(), 1);
        let inner = items[0].get(Tag(0x0010, 0x0020)).unwrap();
        // trailing pad byte is trimmed
        assert_eq!(inner.joined_strings('\\').unwrap(), "A");
        // parsing continues after the sequence
        assert!(outcome.dataset.contains(Tag(0x0008, 0x0060)));
    }

    #[test]
    fn parse_stops_at_pixel_data() {
        let mut data = RAW_IMPLICIT.to_vec();
        // (7FE0,0010) len 4, value not to be consumed
        data.extend_from_slice(&[
            0xE0, 0x7F, 0x10, 0x00, 0x04, 0x00, 0x00, 0x00, 0xAA, 0xBB, 0xCC, 0xDD,
        ]);
        let mut cursor = Cursor::new(data);
        let outcome = read_object(&mut cursor).expect("should parse");
        let cursor_state = outcome.cursor.expect("should have stopped at pixel data");
        assert_eq!(cursor_state.tag, Tag(0x7FE0, 0x0010));
        assert_eq!(cursor_state.len, Length(4));
        assert_eq!(cursor_state.position, RAW_IMPLICIT.len() as u64 + 8);
        assert!(!outcome.dataset.contains(Tag(0x7FE0, 0x0010)));
    }
}
