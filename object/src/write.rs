//! This module implements the transfer-syntax-aware writer: the file meta
//! group, the in-memory data set re-encoded in the target syntax, and the
//! pass-through of pixel data and trailing elements from the source stream,
//! with byte swapping where the byte order changes.

use crate::mem::{DataSet, Element, Value};
use crate::meta::FileMetaTable;
use crate::read::ReadCursor;
use dcmgate_core::header::{Header, SequenceItemHeader};
use dcmgate_core::{tags, DataElementHeader, Length, Tag, VR};
use dcmgate_encoding::decode::{self, DataDecoder, Decode};
use dcmgate_encoding::encode::{self, swap_value_bytes, DataEncoder, Encode};
use dcmgate_encoding::text::TextCodec;
use dcmgate_encoding::transfer_syntax::{self, Endianness, TransferSyntax};
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Seek, SeekFrom, Write};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The file meta group could not be written.
    #[snafu(display("Could not write file meta group"))]
    WriteMeta {
        #[snafu(backtrace)]
        source: crate::meta::Error,
    },

    /// A data element header could not be encoded.
    #[snafu(display("Could not encode data element header"))]
    EncodeElement {
        #[snafu(backtrace)]
        source: encode::Error,
    },

    /// A text value could not be encoded in the active character set.
    #[snafu(display("Could not encode text of {}", tag))]
    EncodeText {
        tag: Tag,
        #[snafu(backtrace)]
        source: dcmgate_encoding::text::EncodeTextError,
    },

    /// Value data could not be written to the sink.
    #[snafu(display("Could not write value data"))]
    WriteValue {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// An unexpected tag or a delimiter with a non-zero length was found
    /// inside the encapsulated pixel data.
    #[snafu(display("Malformed encapsulated pixel data"))]
    BadEncapsulation { backtrace: Backtrace },

    /// A byte swap was required on a value with an odd length.
    #[snafu(display("Cannot swap bytes of a value with odd length {}", len))]
    OddLengthSwap { len: u32, backtrace: Backtrace },

    /// The pixel data element has an undefined length
    /// but the target transfer syntax is not encapsulated.
    #[snafu(display("Undefined pixel data length in a non-encapsulated stream"))]
    UndefinedPixelLength { backtrace: Backtrace },

    /// A data element header could not be decoded from the source
    /// while streaming the remainder of the object.
    #[snafu(display("Could not decode data element from the source stream"))]
    DecodeSource {
        #[snafu(backtrace)]
        source: decode::Error,
    },

    /// Value data could not be read from the source stream.
    #[snafu(display("Could not read value data from the source stream"))]
    ReadSource {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The source stream could not be repositioned.
    #[snafu(display("Could not reposition the source stream"))]
    Seek {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// An item or delimiter tag appeared in the source stream
    /// where it is not allowed.
    #[snafu(display("Unexpected tag {} in the source stream", tag))]
    UnexpectedSourceToken { tag: Tag, backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Options controlling a save operation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SaveOptions {
    /// Force the output transfer syntax to Implicit VR Little Endian.
    /// Ignored when the source pixel data is encapsulated,
    /// since the fragments cannot be represented in that syntax.
    pub force_implicit_le: bool,
}

/// Serialize a whole object to the given sink: preamble, file meta group,
/// data set, and — when the parse stopped at pixel data — the remainder
/// of the source stream. On success the source stream position is
/// restored to its value at entry.
pub(crate) fn save_object<S, W>(
    out: &mut W,
    meta: &FileMetaTable,
    dataset: &DataSet,
    source_ts: &TransferSyntax,
    cursor: Option<&ReadCursor>,
    source: &mut S,
    options: &SaveOptions,
) -> Result<()>
where
    S: Read + Seek,
    W: Write,
{
    let target_ts = if options.force_implicit_le {
        if source_ts.encapsulated {
            tracing::warn!(
                "Cannot force implicit VR on encapsulated pixel data, keeping {}",
                source_ts.uid
            );
            source_ts
        } else {
            &transfer_syntax::IMPLICIT_VR_LITTLE_ENDIAN
        }
    } else {
        source_ts
    };

    // preamble and file meta group, always explicit VR little endian
    let mut meta = meta.clone();
    meta.set_transfer_syntax(target_ts.uid);
    out.write_all(&[0u8; 128]).context(WriteValueSnafu)?;
    meta.write(&mut *out).context(WriteMetaSnafu)?;

    let encoder = DataEncoder::new(target_ts);
    write_dataset(out, dataset, &encoder, source_ts.endianness, target_ts.endianness)?;

    if let Some(cursor) = cursor {
        let entry_position = source.seek(SeekFrom::Current(0)).context(SeekSnafu)?;
        copy_remainder(out, cursor, source_ts, target_ts, &encoder, source)?;
        source
            .seek(SeekFrom::Start(entry_position))
            .context(SeekSnafu)?;
    }

    out.flush().context(WriteValueSnafu)?;
    Ok(())
}

/// Re-encode the parsed data set in the target encoding.
/// Text is encoded through the character set of its scope and padded to
/// an even length; binary values are byte-swapped when the byte order
/// changes; sequences are written with undefined length.
fn write_dataset<W>(
    out: &mut W,
    ds: &DataSet,
    encoder: &DataEncoder,
    source_endianness: Endianness,
    target_endianness: Endianness,
) -> Result<()>
where
    W: Write,
{
    for elem in ds {
        write_element(out, ds, elem, encoder, source_endianness, target_endianness)?;
    }
    Ok(())
}

fn write_element<W>(
    out: &mut W,
    ds: &DataSet,
    elem: &Element,
    encoder: &DataEncoder,
    source_endianness: Endianness,
    target_endianness: Endianness,
) -> Result<()>
where
    W: Write,
{
    match elem.value() {
        Value::Strings(strings) => {
            let text = strings.join("\\");
            let mut data = ds
                .charset()
                .encode(&text)
                .context(EncodeTextSnafu { tag: elem.tag() })?;
            if data.len() % 2 != 0 {
                data.push(elem.vr().padding());
            }
            encoder
                .encode_element_header(
                    &mut *out,
                    DataElementHeader::new(elem.tag(), elem.vr(), Length(data.len() as u32)),
                )
                .context(EncodeElementSnafu)?;
            out.write_all(&data).context(WriteValueSnafu)?;
        }
        Value::Primitive(bytes) => {
            let mut data = bytes.clone();
            if data.len() % 2 != 0 {
                data.push(elem.vr().padding());
            }
            if source_endianness != target_endianness {
                swap_value_bytes(&mut data, elem.vr().unit_size());
            }
            encoder
                .encode_element_header(
                    &mut *out,
                    DataElementHeader::new(elem.tag(), elem.vr(), Length(data.len() as u32)),
                )
                .context(EncodeElementSnafu)?;
            out.write_all(&data).context(WriteValueSnafu)?;
        }
        Value::Sequence(items) => {
            encoder
                .encode_element_header(
                    &mut *out,
                    DataElementHeader::new(elem.tag(), VR::SQ, Length::UNDEFINED),
                )
                .context(EncodeElementSnafu)?;
            for item in items {
                encoder
                    .encode_item_header(&mut *out, Length::UNDEFINED.0)
                    .context(EncodeElementSnafu)?;
                write_dataset(out, item, encoder, source_endianness, target_endianness)?;
                encoder
                    .encode_item_delimiter(&mut *out)
                    .context(EncodeElementSnafu)?;
            }
            encoder
                .encode_sequence_delimiter(&mut *out)
                .context(EncodeElementSnafu)?;
        }
    }
    Ok(())
}

/// Copy the pixel data value and any elements following it
/// from the source stream to the sink.
fn copy_remainder<S, W>(
    out: &mut W,
    cursor: &ReadCursor,
    source_ts: &TransferSyntax,
    target_ts: &TransferSyntax,
    encoder: &DataEncoder,
    source: &mut S,
) -> Result<()>
where
    S: Read + Seek,
    W: Write,
{
    source
        .seek(SeekFrom::Start(cursor.position))
        .context(SeekSnafu)?;
    let decoder = DataDecoder::new(source_ts);

    // re-emit the pixel data header
    encoder
        .encode_element_header(
            &mut *out,
            DataElementHeader::new(cursor.tag, cursor.vr, cursor.len),
        )
        .context(EncodeElementSnafu)?;

    if target_ts.encapsulated {
        copy_pixel_fragments(out, &decoder, encoder, source)?;
    } else {
        let len = cursor.len.get().context(UndefinedPixelLengthSnafu)?;
        let swap = source_ts.endianness != target_ts.endianness && cursor.vr == VR::OW;
        if swap && len % 2 != 0 {
            return OddLengthSwapSnafu { len }.fail();
        }
        copy_value(out, source, u64::from(len), swap)?;
    }

    // elements after the pixel data, one at a time
    loop {
        let header = match decoder.decode_header(source) {
            Ok((header, _)) => header,
            Err(e) if is_eof(&e) => break,
            Err(e) => return Err(e).context(DecodeSourceSnafu),
        };
        if header.tag() == tags::DATA_SET_TRAILING_PADDING {
            break;
        }
        encoder
            .encode_element_header(&mut *out, header)
            .context(EncodeElementSnafu)?;
        match header.len().get() {
            Some(len) => {
                let swap = source_ts.endianness != target_ts.endianness
                    && header.vr() == VR::OW;
                if swap && len % 2 != 0 {
                    return OddLengthSwapSnafu { len }.fail();
                }
                copy_value(out, source, u64::from(len), swap)?;
            }
            None => copy_undefined_value(out, &decoder, encoder, source)?,
        }
    }
    Ok(())
}

/// Copy encapsulated pixel data: a run of item fragments closed by the
/// sequence delimitation item. Any other token is malformed.
fn copy_pixel_fragments<S, W>(
    out: &mut W,
    decoder: &DataDecoder,
    encoder: &DataEncoder,
    source: &mut S,
) -> Result<()>
where
    S: Read,
    W: Write,
{
    loop {
        let item = decoder
            .decode_item_header(source)
            .map_err(|_| BadEncapsulationSnafu.build())?;
        match item {
            SequenceItemHeader::Item { len } => {
                let len = match len.get() {
                    Some(len) => len,
                    None => return BadEncapsulationSnafu.fail(),
                };
                encoder
                    .encode_item_header(&mut *out, len)
                    .context(EncodeElementSnafu)?;
                copy_value(out, source, u64::from(len), false)?;
            }
            SequenceItemHeader::SequenceDelimiter => {
                encoder
                    .encode_sequence_delimiter(&mut *out)
                    .context(EncodeElementSnafu)?;
                break;
            }
            SequenceItemHeader::ItemDelimiter => return BadEncapsulationSnafu.fail(),
        }
    }
    Ok(())
}

/// Stream an undefined-length value (a sequence of items) from the source,
/// re-emitting the framing in the target encoding.
fn copy_undefined_value<S, W>(
    out: &mut W,
    decoder: &DataDecoder,
    encoder: &DataEncoder,
    source: &mut S,
) -> Result<()>
where
    S: Read,
    W: Write,
{
    loop {
        let item = decoder
            .decode_item_header(source)
            .context(DecodeSourceSnafu)?;
        match item {
            SequenceItemHeader::Item { len } => match len.get() {
                Some(len) => {
                    encoder
                        .encode_item_header(&mut *out, len)
                        .context(EncodeElementSnafu)?;
                    copy_value(out, source, u64::from(len), false)?;
                }
                None => {
                    encoder
                        .encode_item_header(&mut *out, Length::UNDEFINED.0)
                        .context(EncodeElementSnafu)?;
                    copy_undefined_item(out, decoder, encoder, source)?;
                }
            },
            SequenceItemHeader::SequenceDelimiter => {
                encoder
                    .encode_sequence_delimiter(&mut *out)
                    .context(EncodeElementSnafu)?;
                break;
            }
            SequenceItemHeader::ItemDelimiter => {
                return UnexpectedSourceTokenSnafu {
                    tag: Tag(0xFFFE, 0xE00D),
                }
                .fail();
            }
        }
    }
    Ok(())
}

/// Stream the elements of an undefined-length item up to the item
/// delimitation item.
fn copy_undefined_item<S, W>(
    out: &mut W,
    decoder: &DataDecoder,
    encoder: &DataEncoder,
    source: &mut S,
) -> Result<()>
where
    S: Read,
    W: Write,
{
    loop {
        let (header, _) = decoder.decode_header(source).context(DecodeSourceSnafu)?;
        if header.tag() == tags::ITEM_DELIMITATION_ITEM {
            encoder
                .encode_item_delimiter(&mut *out)
                .context(EncodeElementSnafu)?;
            break;
        }
        encoder
            .encode_element_header(&mut *out, header)
            .context(EncodeElementSnafu)?;
        match header.len().get() {
            Some(len) => copy_value(out, source, u64::from(len), false)?,
            None => copy_undefined_value(out, decoder, encoder, source)?,
        }
    }
    Ok(())
}

/// Copy `len` bytes from the source to the sink, optionally swapping
/// byte pairs for byte-order conversion.
fn copy_value<S, W>(out: &mut W, source: &mut S, len: u64, swap: bool) -> Result<()>
where
    S: Read,
    W: Write,
{
    if !swap {
        let copied = std::io::copy(&mut source.take(len), out).context(ReadSourceSnafu)?;
        if copied != len {
            return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof))
                .context(ReadSourceSnafu);
        }
        return Ok(());
    }

    let mut remaining = len;
    let mut buf = [0u8; 64 * 1024];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        // chunk is even except possibly at the very end,
        // and odd total lengths are rejected before we get here
        source
            .read_exact(&mut buf[..chunk])
            .context(ReadSourceSnafu)?;
        swap_value_bytes(&mut buf[..chunk], 2);
        out.write_all(&buf[..chunk]).context(WriteValueSnafu)?;
        remaining -= chunk as u64;
    }
    Ok(())
}

fn is_eof(e: &decode::Error) -> bool {
    matches!(
        e,
        decode::Error::ReadHeaderTag { source, .. }
            if source.kind() == std::io::ErrorKind::UnexpectedEof
    )
}
