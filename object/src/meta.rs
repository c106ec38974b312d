//! Module containing data structures and readers of DICOM file meta
//! information tables.

use byteordered::byteorder::{ByteOrder, LittleEndian};
use dcmgate_core::header::Header;
use dcmgate_core::{DataElementHeader, Length, Tag, VR};
use dcmgate_encoding::decode::{self, Decode};
use dcmgate_encoding::encode::{Encode, ExplicitVRLittleEndianEncoder};
use dcmgate_encoding::text::{DefaultCharacterSetCodec, TextCodec};
use snafu::{ensure, Backtrace, OptionExt, ResultExt, Snafu};
use std::io::{Read, Write};

const DICM_MAGIC_CODE: [u8; 4] = [b'D', b'I', b'C', b'M'];

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The file meta group parser could not read
    /// the magic code `DICM` from its source.
    #[snafu(display("Could not start reading DICOM data"))]
    ReadMagicCode {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The file meta group parser could not fetch
    /// the value of a data element from its source.
    #[snafu(display("Could not read data value"))]
    ReadValueData {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The file meta group parser could not decode
    /// the text in one of its data elements.
    #[snafu(display("Could not decode text in file meta group"))]
    DecodeText {
        #[snafu(backtrace)]
        source: dcmgate_encoding::text::DecodeTextError,
    },

    /// Invalid DICOM data, detected by checking the `DICM` code.
    #[snafu(display("Invalid DICOM file (magic code check failed)"))]
    NotDicom { backtrace: Backtrace },

    /// An issue occurred while decoding the next data element
    /// in the file meta data set.
    #[snafu(display("Could not decode data element"))]
    DecodeElement {
        #[snafu(backtrace)]
        source: dcmgate_encoding::decode::Error,
    },

    /// An issue occurred while encoding a file meta group element.
    #[snafu(display("Could not encode data element"))]
    EncodeElement {
        #[snafu(backtrace)]
        source: dcmgate_encoding::encode::Error,
    },

    /// The file meta group could not be written to the sink.
    #[snafu(display("Could not write file meta group"))]
    WriteGroup {
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// A data element with an unexpected tag was retrieved:
    /// the parser was expecting another tag first,
    /// or at least one that is part of the file meta group.
    #[snafu(display("Unexpected data element tagged {}", tag))]
    UnexpectedTag { tag: Tag, backtrace: Backtrace },

    /// A required file meta data element is missing.
    #[snafu(display("Missing data element `{}`", alias))]
    MissingElement {
        alias: &'static str,
        backtrace: Backtrace,
    },

    /// The value length of a data element in the file meta group
    /// was unexpected.
    #[snafu(display("Unexpected length {} for data element tagged {}", length, tag))]
    UnexpectedDataValueLength {
        tag: Tag,
        length: Length,
        backtrace: Backtrace,
    },

    /// The value length of a data element is undefined,
    /// but knowing the length is required in its context.
    #[snafu(display("Undefined value length for data element tagged {}", tag))]
    UndefinedValueLength { tag: Tag, backtrace: Backtrace },
}

type Result<T> = std::result::Result<T, Error>;

/// DICOM File Meta Information Table.
///
/// This data type contains the relevant parts of the file meta information
/// table: the always-present attributes as fields, and the optional ones
/// as `Option`s. The group is always encoded in Explicit VR Little Endian,
/// regardless of the transfer syntax of the data set that follows.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetaTable {
    /// File Meta Information Group Length
    pub information_group_length: u32,
    /// File Meta Information Version
    pub information_version: [u8; 2],
    /// Media Storage SOP Class UID
    pub media_storage_sop_class_uid: String,
    /// Media Storage SOP Instance UID
    pub media_storage_sop_instance_uid: String,
    /// Transfer Syntax UID
    pub transfer_syntax: String,
    /// Implementation Class UID
    pub implementation_class_uid: String,
    /// Implementation Version Name
    pub implementation_version_name: Option<String>,
    /// Source Application Entity Title
    pub source_application_entity_title: Option<String>,
    /// Private Information Creator UID
    pub private_information_creator_uid: Option<String>,
    /// Private Information
    pub private_information: Option<Vec<u8>>,
}

/// Utility function for reading the body of a DICOM element as a string.
fn read_str_body<S, T>(source: &mut S, text: &T, len: u32) -> Result<String>
where
    S: ?Sized + Read,
    T: TextCodec,
{
    let mut v = vec![0; len as usize];
    source.read_exact(&mut v).context(ReadValueDataSnafu)?;
    text.decode(&v).context(DecodeTextSnafu)
}

/// The even-padded encoded length of a string value.
fn dicom_len(value: &str) -> u32 {
    (value.len() as u32 + 1) & !1
}

impl FileMetaTable {
    /// Construct a file meta group table by parsing it from a reader.
    /// The source must be positioned at the `DICM` magic code,
    /// past the 128-byte preamble.
    pub fn from_reader<R: Read>(file: R) -> Result<Self> {
        FileMetaTable::read_from(file)
    }

    /// Getter for the transfer syntax UID,
    /// with trailing characters already excluded.
    pub fn transfer_syntax(&self) -> &str {
        trim_uid(&self.transfer_syntax)
    }

    /// Getter for the media storage SOP class UID,
    /// with trailing characters already excluded.
    pub fn media_storage_sop_class_uid(&self) -> &str {
        trim_uid(&self.media_storage_sop_class_uid)
    }

    /// Getter for the media storage SOP instance UID,
    /// with trailing characters already excluded.
    pub fn media_storage_sop_instance_uid(&self) -> &str {
        trim_uid(&self.media_storage_sop_instance_uid)
    }

    /// Replace the table's transfer syntax UID.
    /// The information group length field is recalculated.
    pub fn set_transfer_syntax(&mut self, uid: &str) {
        self.transfer_syntax = trim_uid(uid).to_string();
        self.update_information_group_length();
    }

    /// Calculate the expected file meta group length
    /// according to the attributes currently set,
    /// and assign it to the field `information_group_length`.
    pub fn update_information_group_length(&mut self) {
        self.information_group_length = self.calculate_information_group_length();
    }

    /// Calculate the expected file meta group length,
    /// ignoring `information_group_length` itself.
    fn calculate_information_group_length(&self) -> u32 {
        // (0002,0001) has a 12-byte header and a 2-byte value
        14 + 8
            + dicom_len(&self.media_storage_sop_class_uid)
            + 8
            + dicom_len(&self.media_storage_sop_instance_uid)
            + 8
            + dicom_len(&self.transfer_syntax)
            + 8
            + dicom_len(&self.implementation_class_uid)
            + self
                .implementation_version_name
                .as_ref()
                .map(|s| 8 + dicom_len(s))
                .unwrap_or(0)
            + self
                .source_application_entity_title
                .as_ref()
                .map(|s| 8 + dicom_len(s))
                .unwrap_or(0)
            + self
                .private_information_creator_uid
                .as_ref()
                .map(|s| 8 + dicom_len(s))
                .unwrap_or(0)
            + self
                .private_information
                .as_ref()
                .map(|x| 12 + ((x.len() as u32 + 1) & !1))
                .unwrap_or(0)
    }

    fn read_from<S: Read>(mut file: S) -> Result<Self> {
        let mut buff: [u8; 4] = [0; 4];
        {
            // check magic code
            file.read_exact(&mut buff).context(ReadMagicCodeSnafu)?;
            ensure!(buff == DICM_MAGIC_CODE, NotDicomSnafu);
        }

        let decoder = decode::file_header_decoder();
        let text = DefaultCharacterSetCodec;

        let group_length: u32 = {
            let (elem, _bytes_read) = decoder
                .decode_header(&mut file)
                .context(DecodeElementSnafu)?;
            if elem.tag() != Tag(0x0002, 0x0000) {
                return UnexpectedTagSnafu { tag: elem.tag() }.fail();
            }
            if elem.len() != Length(4) {
                return UnexpectedDataValueLengthSnafu {
                    tag: elem.tag(),
                    length: elem.len(),
                }
                .fail();
            }
            let mut buff: [u8; 4] = [0; 4];
            file.read_exact(&mut buff).context(ReadValueDataSnafu)?;
            LittleEndian::read_u32(&buff)
        };

        let mut information_version = None;
        let mut media_storage_sop_class_uid = None;
        let mut media_storage_sop_instance_uid = None;
        let mut transfer_syntax = None;
        let mut implementation_class_uid = None;
        let mut implementation_version_name = None;
        let mut source_application_entity_title = None;
        let mut private_information_creator_uid = None;
        let mut private_information = None;

        let mut total_bytes_read = 0;

        while total_bytes_read < group_length {
            let (elem, header_bytes_read) = decoder
                .decode_header(&mut file)
                .context(DecodeElementSnafu)?;
            let elem_len = match elem.len().get() {
                None => {
                    return UndefinedValueLengthSnafu { tag: elem.tag() }.fail();
                }
                Some(len) => len,
            };
            match elem.tag() {
                Tag(0x0002, 0x0001) => {
                    // Implementation Version
                    if elem.len() != Length(2) {
                        return UnexpectedDataValueLengthSnafu {
                            tag: elem.tag(),
                            length: elem.len(),
                        }
                        .fail();
                    }
                    let mut hbuf = [0u8; 2];
                    file.read_exact(&mut hbuf[..]).context(ReadValueDataSnafu)?;
                    information_version = Some(hbuf);
                }
                Tag(0x0002, 0x0002) => {
                    media_storage_sop_class_uid =
                        Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0003) => {
                    media_storage_sop_instance_uid =
                        Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0010) => {
                    transfer_syntax = Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0012) => {
                    implementation_class_uid = Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0013) => {
                    implementation_version_name =
                        Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0016) => {
                    source_application_entity_title =
                        Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0100) => {
                    private_information_creator_uid =
                        Some(read_str_body(&mut file, &text, elem_len)?);
                }
                Tag(0x0002, 0x0102) => {
                    let mut v = vec![0; elem_len as usize];
                    file.read_exact(&mut v).context(ReadValueDataSnafu)?;
                    private_information = Some(v);
                }
                tag @ Tag(0x0002, _) => {
                    // unknown or unsupported attribute of the meta group,
                    // consume the value without saving it
                    tracing::info!("Unknown file meta attribute {}", tag);
                    let bytes_read = std::io::copy(
                        &mut (&mut file).take(u64::from(elem_len)),
                        &mut std::io::sink(),
                    )
                    .context(ReadValueDataSnafu)?;
                    if bytes_read != u64::from(elem_len) {
                        return UnexpectedDataValueLengthSnafu {
                            tag,
                            length: elem_len,
                        }
                        .fail();
                    }
                }
                tag => {
                    // an off-group tag inside the declared group length
                    // means the group length is not reliable
                    return UnexpectedTagSnafu { tag }.fail();
                }
            };
            total_bytes_read = total_bytes_read
                .saturating_add(header_bytes_read as u32)
                .saturating_add(elem_len);
        }

        let table = FileMetaTable {
            information_group_length: group_length,
            information_version: information_version.unwrap_or([0, 1]),
            media_storage_sop_class_uid: media_storage_sop_class_uid.unwrap_or_default(),
            media_storage_sop_instance_uid: media_storage_sop_instance_uid.unwrap_or_default(),
            transfer_syntax: transfer_syntax.context(MissingElementSnafu {
                alias: "TransferSyntaxUID",
            })?,
            implementation_class_uid: implementation_class_uid.unwrap_or_default(),
            implementation_version_name,
            source_application_entity_title,
            private_information_creator_uid,
            private_information,
        };

        Ok(table)
    }

    /// Write the file meta group to the given sink,
    /// starting with the `DICM` magic code.
    /// The group length field is written as currently set;
    /// call [`update_information_group_length`][1] first if the table
    /// was modified.
    ///
    /// [1]: FileMetaTable::update_information_group_length
    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        let enc = ExplicitVRLittleEndianEncoder::default();

        writer.write_all(&DICM_MAGIC_CODE).context(WriteGroupSnafu)?;

        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, self.information_group_length);
        write_element(&enc, &mut writer, Tag(0x0002, 0x0000), VR::UL, &buf)?;
        write_element(
            &enc,
            &mut writer,
            Tag(0x0002, 0x0001),
            VR::OB,
            &self.information_version,
        )?;
        write_str_element(
            &enc,
            &mut writer,
            Tag(0x0002, 0x0002),
            VR::UI,
            &self.media_storage_sop_class_uid,
        )?;
        write_str_element(
            &enc,
            &mut writer,
            Tag(0x0002, 0x0003),
            VR::UI,
            &self.media_storage_sop_instance_uid,
        )?;
        write_str_element(
            &enc,
            &mut writer,
            Tag(0x0002, 0x0010),
            VR::UI,
            &self.transfer_syntax,
        )?;
        write_str_element(
            &enc,
            &mut writer,
            Tag(0x0002, 0x0012),
            VR::UI,
            &self.implementation_class_uid,
        )?;
        if let Some(v) = &self.implementation_version_name {
            write_str_element(&enc, &mut writer, Tag(0x0002, 0x0013), VR::SH, v)?;
        }
        if let Some(v) = &self.source_application_entity_title {
            write_str_element(&enc, &mut writer, Tag(0x0002, 0x0016), VR::AE, v)?;
        }
        if let Some(v) = &self.private_information_creator_uid {
            write_str_element(&enc, &mut writer, Tag(0x0002, 0x0100), VR::UI, v)?;
        }
        if let Some(v) = &self.private_information {
            let mut padded = v.clone();
            if padded.len() % 2 != 0 {
                padded.push(0);
            }
            write_element(&enc, &mut writer, Tag(0x0002, 0x0102), VR::OB, &padded)?;
        }
        Ok(())
    }
}

fn write_element<W: Write>(
    enc: &ExplicitVRLittleEndianEncoder,
    writer: &mut W,
    tag: Tag,
    vr: VR,
    data: &[u8],
) -> Result<()> {
    enc.encode_element_header(
        &mut *writer,
        DataElementHeader::new(tag, vr, Length(data.len() as u32)),
    )
    .context(EncodeElementSnafu)?;
    writer.write_all(data).context(WriteGroupSnafu)?;
    Ok(())
}

fn write_str_element<W: Write>(
    enc: &ExplicitVRLittleEndianEncoder,
    writer: &mut W,
    tag: Tag,
    vr: VR,
    value: &str,
) -> Result<()> {
    let mut data = value.as_bytes().to_vec();
    if data.len() % 2 != 0 {
        data.push(vr.padding());
    }
    write_element(enc, writer, tag, vr, &data)
}

fn trim_uid(uid: &str) -> &str {
    uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    // a valid DICOM file meta group, explicit VR little endian
    const RAW: &'static [u8] = &[
        b'D', b'I', b'C', b'M', //
        // (0002,0000) UL 4: group length = 116
        0x02, 0x00, 0x00, 0x00, b'U', b'L', 0x04, 0x00, 0x74, 0x00, 0x00, 0x00, //
        // (0002,0001) OB 2: [0, 1]
        0x02, 0x00, 0x01, 0x00, b'O', b'B', 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x01, //
        // (0002,0002) UI 26: "1.2.840.10008.5.1.4.1.1.7\0"
        0x02, 0x00, 0x02, 0x00, b'U', b'I', 0x1a, 0x00, b'1', b'.', b'2', b'.', b'8', b'4', b'0',
        b'.', b'1', b'0', b'0', b'0', b'8', b'.', b'5', b'.', b'1', b'.', b'4', b'.', b'1', b'.',
        b'1', b'.', b'7', 0x00, //
        // (0002,0003) UI 10: "1.2.3.4.5\0"
        0x02, 0x00, 0x03, 0x00, b'U', b'I', 0x0a, 0x00, b'1', b'.', b'2', b'.', b'3', b'.', b'4',
        b'.', b'5', 0x00, //
        // (0002,0010) UI 20: "1.2.840.10008.1.2.1\0"
        0x02, 0x00, 0x10, 0x00, b'U', b'I', 0x14, 0x00, b'1', b'.', b'2', b'.', b'8', b'4', b'0',
        b'.', b'1', b'0', b'0', b'0', b'8', b'.', b'1', b'.', b'2', b'.', b'1', 0x00, //
        // (0002,0012) UI 14: "1.2.345.6.7890"
        0x02, 0x00, 0x12, 0x00, b'U', b'I', 0x0e, 0x00, b'1', b'.', b'2', b'.', b'3', b'4', b'5',
        b'.', b'6', b'.', b'7', b'8', b'9', b'0',
    ];

    #[test]
    fn read_meta_table() {
        let mut cursor = Cursor::new(RAW);
        let table = FileMetaTable::from_reader(&mut cursor).expect("valid meta group");
        assert_eq!(table.information_group_length, 116);
        assert_eq!(table.information_version, [0u8, 1u8]);
        assert_eq!(table.media_storage_sop_class_uid(), "1.2.840.10008.5.1.4.1.1.7");
        assert_eq!(table.media_storage_sop_instance_uid(), "1.2.3.4.5");
        assert_eq!(table.transfer_syntax(), "1.2.840.10008.1.2.1");
        assert_eq!(table.implementation_class_uid, "1.2.345.6.7890");
        // cursor sits at the start of the data set
        assert_eq!(cursor.position() as usize, RAW.len());
    }

    #[test]
    fn missing_magic_code() {
        let mut cursor = Cursor::new(&b"NOPEnope"[..]);
        assert!(matches!(
            FileMetaTable::from_reader(&mut cursor),
            Err(Error::NotDicom { .. })
        ));
    }

    #[test]
    fn write_round_trip() {
        let table = FileMetaTable::from_reader(Cursor::new(RAW)).unwrap();
        let mut out = Vec::new();
        table.write(&mut out).unwrap();
        assert_eq!(out, RAW);
    }

    #[test]
    fn group_length_recalculation() {
        let mut table = FileMetaTable::from_reader(Cursor::new(RAW)).unwrap();
        assert_eq!(table.calculate_information_group_length(), 116);
        table.set_transfer_syntax("1.2.840.10008.1.2");
        // "1.2.840.10008.1.2" has 17 chars, padded to 18
        assert_eq!(table.information_group_length, 114);
        assert_eq!(table.transfer_syntax(), "1.2.840.10008.1.2");
    }
}
