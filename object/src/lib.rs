#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]
//! This crate provides an abstraction for reading, querying and
//! re-serializing DICOM objects from files or arbitrary seekable sources.
//!
//! A [`DicomFile`] is created by parsing a source up to (but not including)
//! the pixel data value. Element values can then be queried by element
//! address (attribute keyword, hexadecimal tag, or a `::`-separated path
//! descending into sequences), and the whole object can be saved back in
//! its original transfer syntax or forced into Implicit VR Little Endian.
//!
//! # Example
//!
//! ```no_run
//! use dcmgate_object::DicomFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut obj = DicomFile::open("image.dcm")?;
//! let patient_id = obj.element_string("PatientID", "");
//! if obj.is_image() {
//!     obj.save("out.dcm", &Default::default())?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod mem;
pub mod meta;
pub mod read;
pub mod write;

use dcmgate_core::dictionary::{uids, DataDictionary};
use dcmgate_core::{tags, Length, StandardDataDictionary, Tag, VR};
use dcmgate_encoding::decode::{BasicDecode, BasicDecoder};
use dcmgate_encoding::text::TextCodec;
use dcmgate_encoding::transfer_syntax::TransferSyntax;
use snafu::{Backtrace, OptionExt, ResultExt, Snafu};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};

pub use crate::mem::{DataSet, Element, Value};
pub use crate::meta::FileMetaTable;
pub use crate::read::ReadCursor;
pub use crate::write::SaveOptions;

/// The UID identifying this implementation in written file meta groups.
pub const IMPLEMENTATION_CLASS_UID: &str = "2.25.316094925093271934867737404122243711461";

/// The implementation version name carried next to the class UID.
pub const IMPLEMENTATION_VERSION_NAME: &str = "DCMGATE 0.1";

/// Concept-name code values marking teaching-file manifests.
const MANIFEST_CODE_VALUES: &[&str] = &["TCE001", "TCE002", "TCE007"];

/// Concept-name code value marking additional teaching-file information.
const ADDITIONAL_TF_INFO_CODE_VALUE: &str = "TCE006";

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The file could not be opened for reading.
    #[snafu(display("Could not open file {}", path.display()))]
    OpenFile {
        path: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The object could not be parsed from the source.
    #[snafu(display("Could not read DICOM object"))]
    ReadObject {
        #[snafu(backtrace)]
        source: read::Error,
    },

    /// The output file could not be created.
    #[snafu(display("Could not create file {}", path.display()))]
    CreateFile {
        path: PathBuf,
        backtrace: Backtrace,
        source: std::io::Error,
    },

    /// The object could not be written to the sink.
    /// Partial output files are removed.
    #[snafu(display("Could not write DICOM object"))]
    WriteObject {
        #[snafu(backtrace)]
        source: write::Error,
    },

    /// The source stream was closed by an earlier failed save.
    #[snafu(display("The source stream is closed"))]
    SourceClosed { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Flags describing the kind of object, computed once during parsing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ObjectFlags {
    is_image: bool,
    is_encapsulated: bool,
    is_dicomdir: bool,
    is_sr: bool,
    is_kin: bool,
    is_manifest: bool,
    is_additional_tf_info: bool,
}

/// A parsed DICOM object bound to its source stream.
///
/// The object owns the source until it is dropped, closed, or a save
/// fails; the parsed data set does not include the pixel data value,
/// which is streamed from the source on demand during a save.
///
/// This type is not thread safe and assumes a single owner.
#[derive(Debug)]
pub struct DicomFile<S = BufReader<File>> {
    /// the source stream, released on close or failed save
    source: Option<S>,
    /// the path the object came from, if opened from a file
    path: Option<PathBuf>,
    /// the file meta group, when the source had one
    meta: Option<FileMetaTable>,
    /// the main data set, up to but not including pixel data
    dataset: DataSet,
    /// the transfer syntax of the main data set
    ts: &'static TransferSyntax,
    /// the read cursor, present when the parse stopped at pixel data
    cursor: Option<ReadCursor>,
    flags: ObjectFlags,
}

impl DicomFile<BufReader<File>> {
    /// Open and parse a DICOM object from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).context(OpenFileSnafu { path })?;
        let mut obj = DicomFile::from_reader(BufReader::new(file))?;
        obj.path = Some(path.to_path_buf());
        Ok(obj)
    }
}

impl<S> DicomFile<S>
where
    S: Read + Seek,
{
    /// Parse a DICOM object from an arbitrary seekable source.
    pub fn from_reader(mut source: S) -> Result<Self> {
        let outcome = read::read_object(&mut source).context(ReadObjectSnafu)?;
        let mut obj = DicomFile {
            source: Some(source),
            path: None,
            meta: outcome.meta,
            dataset: outcome.dataset,
            ts: outcome.ts,
            cursor: outcome.cursor,
            flags: ObjectFlags::default(),
        };
        obj.flags = obj.compute_flags();
        Ok(obj)
    }

    fn compute_flags(&self) -> ObjectFlags {
        let is_image = self.cursor.is_some();
        let sop_class = self.sop_class_uid();
        let is_sr = [
            uids::BASIC_TEXT_SR_STORAGE,
            uids::ENHANCED_SR_STORAGE,
            uids::COMPREHENSIVE_SR_STORAGE,
        ]
        .contains(&sop_class.as_str());
        let is_kin = sop_class == uids::KEY_OBJECT_SELECTION_DOCUMENT_STORAGE;
        let concept_code = self.element_string("ConceptNameCodeSeq::CodeValue", "");
        ObjectFlags {
            is_image,
            is_encapsulated: is_image && self.ts.encapsulated,
            is_dicomdir: sop_class == uids::MEDIA_STORAGE_DIRECTORY_STORAGE,
            is_sr,
            is_kin,
            is_manifest: is_kin && MANIFEST_CODE_VALUES.contains(&concept_code.as_str()),
            is_additional_tf_info: is_sr && concept_code == ADDITIONAL_TF_INFO_CODE_VALUE,
        }
    }

    /// The file meta group, when the source had one.
    pub fn meta(&self) -> Option<&FileMetaTable> {
        self.meta.as_ref()
    }

    /// The parsed main data set.
    pub fn dataset(&self) -> &DataSet {
        &self.dataset
    }

    /// The transfer syntax of the main data set.
    pub fn transfer_syntax(&self) -> &'static TransferSyntax {
        self.ts
    }

    /// The read cursor, present when the parse stopped at pixel data.
    pub fn cursor(&self) -> Option<&ReadCursor> {
        self.cursor.as_ref()
    }

    /// The path the object was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the parse stopped at a pixel data element.
    pub fn is_image(&self) -> bool {
        self.flags.is_image
    }

    /// Whether the pixel data is encapsulated in item fragments.
    pub fn is_encapsulated(&self) -> bool {
        self.flags.is_encapsulated
    }

    /// Whether this object is a media storage directory (DICOMDIR).
    pub fn is_dicomdir(&self) -> bool {
        self.flags.is_dicomdir
    }

    /// Whether this object is a structured report.
    pub fn is_sr(&self) -> bool {
        self.flags.is_sr
    }

    /// Whether this object is a key object selection document.
    pub fn is_kin(&self) -> bool {
        self.flags.is_kin
    }

    /// Whether this object is a teaching-file manifest.
    pub fn is_manifest(&self) -> bool {
        self.flags.is_manifest
    }

    /// Whether this object carries additional teaching-file information.
    pub fn is_additional_tf_info(&self) -> bool {
        self.flags.is_additional_tf_info
    }

    /// Release the source stream and consume the object.
    pub fn close(self) {}

    // --- element access ---

    /// Fetch an element's value as a single string, with the individual
    /// values joined by `\`. The address may descend into sequences with
    /// `::`; descent always takes the first item at each level.
    ///
    /// Missing elements (or unresolvable addresses) yield the given
    /// default. Elements in private blocks owned by `"CTP"` are returned
    /// by reinterpreting the raw value bytes one byte per character,
    /// without VR-based decoding.
    pub fn element_string(&self, spec: &str, default: &str) -> String {
        self.string_at(&address::parse_address(spec), '\\')
            .unwrap_or_else(|| default.to_string())
    }

    /// Fetch an element's value as a string with the individual values
    /// joined by `|`, or an empty string when absent.
    pub fn element_strings(&self, spec: &str) -> String {
        self.string_at(&address::parse_address(spec), '|')
            .unwrap_or_default()
    }

    /// Fetch an element's raw value bytes, re-encoding decoded text
    /// through the character set of its scope. Yields `None` when the
    /// element is absent or is a sequence.
    pub fn element_bytes(&self, spec: &str) -> Option<Vec<u8>> {
        let path = address::parse_address(spec);
        let (leaf, leading) = path.split_last()?;
        let leaf_tag = Tag::from(*leaf);

        if leading.is_empty() && is_meta_range(*leaf) {
            if let Some(m) = &self.meta {
                if let Some(v) = meta_string(m, leaf_tag) {
                    return Some(v.into_bytes());
                }
            }
        }

        let ds = self.dataset_at(leading)?;
        let elem = ds.get(leaf_tag)?;
        match elem.value() {
            Value::Primitive(bytes) => Some(bytes.clone()),
            Value::Strings(strings) => ds.charset().encode(&strings.join("\\")).ok(),
            Value::Sequence(_) => None,
        }
    }

    /// Fetch an element's first value as an integer,
    /// or the given default when absent or malformed.
    pub fn element_int(&self, spec: &str, default: i64) -> i64 {
        self.int_at(&address::parse_address(spec)).unwrap_or(default)
    }

    /// Fetch an element's first value as a float,
    /// or the given default when absent or malformed.
    pub fn element_float(&self, spec: &str, default: f64) -> f64 {
        self.float_at(&address::parse_address(spec)).unwrap_or(default)
    }

    /// Write a string value into an element. Private tags are forced to
    /// VR UT; other tags take their dictionary VR, falling back to UT.
    /// An empty person name is written as a single space.
    ///
    /// The address may descend into existing sequences; missing
    /// intermediate levels are not created.
    pub fn set_element_string(&mut self, spec: &str, value: &str) {
        let path = address::parse_address(spec);
        let (leaf, leading) = match path.split_last() {
            Some(parts) => parts,
            None => return,
        };
        let leaf_tag = Tag::from(*leaf);
        if *leaf == 0 {
            tracing::warn!("Cannot set element: unresolvable address `{}`", spec);
            return;
        }

        let vr = if leaf_tag.is_private() {
            VR::UT
        } else {
            match StandardDataDictionary.by_tag(leaf_tag) {
                Some(e) => e.vr,
                None => VR::UT,
            }
        };

        let value = if vr == VR::PN && value.is_empty() {
            " "
        } else {
            value
        };
        let strings: mem::Strings = if value.is_empty() {
            mem::Strings::new()
        } else {
            value.split('\\').map(|s| s.to_string()).collect()
        };

        let ds = match self.dataset_at_mut(leading) {
            Some(ds) => ds,
            None => {
                tracing::warn!("Cannot set element: no sequence item at `{}`", spec);
                return;
            }
        };
        ds.put(Element::new(
            leaf_tag,
            vr,
            Length(value.len() as u32),
            Value::Strings(strings),
        ));
    }

    // --- routed convenience getters ---

    /// The patient name, routed through the first directory record
    /// for DICOMDIR objects.
    pub fn patient_name(&self) -> String {
        self.routed_string(tags::PATIENT_NAME)
    }

    /// The patient ID, routed through the first directory record
    /// for DICOMDIR objects.
    pub fn patient_id(&self) -> String {
        self.routed_string(tags::PATIENT_ID)
    }

    /// The study instance UID, routed through the first directory record
    /// for DICOMDIR objects.
    pub fn study_instance_uid(&self) -> String {
        self.routed_string(tags::STUDY_INSTANCE_UID)
    }

    /// The series instance UID, routed through the first directory record
    /// for DICOMDIR objects.
    pub fn series_instance_uid(&self) -> String {
        self.routed_string(tags::SERIES_INSTANCE_UID)
    }

    /// The modality.
    pub fn modality(&self) -> String {
        self.routed_string(tags::MODALITY)
    }

    /// The accession number.
    pub fn accession_number(&self) -> String {
        self.routed_string(tags::ACCESSION_NUMBER)
    }

    /// The SOP instance UID of the object.
    pub fn sop_instance_uid(&self) -> String {
        let v = self.string_at(&[u32::from(tags::SOP_INSTANCE_UID)], '\\');
        match v {
            Some(v) => v,
            None => self
                .meta
                .as_ref()
                .map(|m| m.media_storage_sop_instance_uid().to_string())
                .unwrap_or_default(),
        }
    }

    /// The SOP class UID of the object, preferring the file meta group's
    /// media storage SOP class.
    pub fn sop_class_uid(&self) -> String {
        if let Some(m) = &self.meta {
            let uid = m.media_storage_sop_class_uid();
            if !uid.is_empty() {
                return uid.to_string();
            }
        }
        self.string_at(&[u32::from(tags::SOP_CLASS_UID)], '\\')
            .map(|s| trim_uid(&s).to_string())
            .unwrap_or_default()
    }

    fn routed_string(&self, tag: Tag) -> String {
        if self.flags.is_dicomdir {
            let path = [u32::from(tags::DIRECTORY_RECORD_SEQUENCE), u32::from(tag)];
            if let Some(v) = self.string_at(&path, '\\') {
                return v;
            }
        }
        self.string_at(&[u32::from(tag)], '\\').unwrap_or_default()
    }

    // --- path walking ---

    /// Walk the leading path steps, descending into the first item
    /// of each sequence.
    fn dataset_at(&self, leading: &[u32]) -> Option<&DataSet> {
        let mut ds = &self.dataset;
        for &step in leading {
            ds = ds.get(Tag::from(step))?.value().items()?.first()?;
        }
        Some(ds)
    }

    fn dataset_at_mut(&mut self, leading: &[u32]) -> Option<&mut DataSet> {
        let mut ds = &mut self.dataset;
        for &step in leading {
            // no mutable element access is exposed, so walk by index
            let tag = Tag::from(step);
            ds = ds.get_mut(tag)?.value_mut().items_mut()?.first_mut()?;
        }
        Some(ds)
    }

    fn string_at(&self, path: &[u32], separator: char) -> Option<String> {
        let (leaf, leading) = path.split_last()?;
        if *leaf == 0 {
            return None;
        }
        let leaf_tag = Tag::from(*leaf);

        // elements in the file meta range fall through to the meta group
        if leading.is_empty() && is_meta_range(*leaf) {
            if let Some(m) = &self.meta {
                if let Some(v) = meta_string(m, leaf_tag) {
                    return Some(v);
                }
            }
        }

        let ds = self.dataset_at(leading)?;
        let elem = ds.get(leaf_tag)?;

        if leaf_tag.is_private() {
            if let Some(owner) = ds.get(leaf_tag.creator_tag()) {
                let owner_name = owner
                    .joined_strings('\\')
                    .unwrap_or_else(|| latin1_string(owner.value().bytes().unwrap_or(&[])));
                if owner_name.trim() == "CTP" {
                    return Some(self.raw_string(elem, ds));
                }
            }
        }

        match elem.value() {
            Value::Strings(strings) => Some(strings.join(&separator.to_string())),
            Value::Primitive(bytes) => Some(self.numeric_strings(elem.vr(), bytes, separator)),
            Value::Sequence(_) => None,
        }
    }

    /// Reinterpret an element's value bytes one byte per character.
    fn raw_string(&self, elem: &Element, ds: &DataSet) -> String {
        match elem.value() {
            Value::Primitive(bytes) => latin1_string(bytes),
            Value::Strings(strings) => {
                let joined = strings.join("\\");
                match ds.charset().encode(&joined) {
                    Ok(bytes) => latin1_string(&bytes),
                    Err(_) => joined,
                }
            }
            Value::Sequence(_) => String::new(),
        }
    }

    /// Render a binary value as text: numeric VRs decode each unit
    /// in the source byte order, anything else maps bytes to characters.
    fn numeric_strings(&self, vr: VR, bytes: &[u8], separator: char) -> String {
        let basic = BasicDecoder::from(self.ts.endianness);
        let mut parts: Vec<String> = Vec::new();
        match vr {
            VR::US => {
                for c in bytes.chunks_exact(2) {
                    if let Ok(v) = basic.decode_us(c) {
                        parts.push(v.to_string());
                    }
                }
            }
            VR::SS => {
                for c in bytes.chunks_exact(2) {
                    if let Ok(v) = basic.decode_ss(c) {
                        parts.push(v.to_string());
                    }
                }
            }
            VR::UL => {
                for c in bytes.chunks_exact(4) {
                    if let Ok(v) = basic.decode_ul(c) {
                        parts.push(v.to_string());
                    }
                }
            }
            VR::SL => {
                for c in bytes.chunks_exact(4) {
                    if let Ok(v) = basic.decode_sl(c) {
                        parts.push(v.to_string());
                    }
                }
            }
            VR::FL => {
                for c in bytes.chunks_exact(4) {
                    if let Ok(v) = basic.decode_fl(c) {
                        parts.push(v.to_string());
                    }
                }
            }
            VR::FD => {
                for c in bytes.chunks_exact(8) {
                    if let Ok(v) = basic.decode_fd(c) {
                        parts.push(v.to_string());
                    }
                }
            }
            VR::AT => {
                for c in bytes.chunks_exact(4) {
                    if let (Ok(g), Ok(e)) = (basic.decode_us(&c[..2]), basic.decode_us(&c[2..])) {
                        parts.push(format!("{}", Tag(g, e)));
                    }
                }
            }
            _ => return latin1_string(bytes),
        }
        parts.join(&separator.to_string())
    }

    fn int_at(&self, path: &[u32]) -> Option<i64> {
        let (leaf, leading) = path.split_last()?;
        if *leaf == 0 {
            return None;
        }
        let ds = self.dataset_at(leading)?;
        let elem = ds.get(Tag::from(*leaf))?;
        let basic = BasicDecoder::from(self.ts.endianness);
        match elem.value() {
            Value::Strings(strings) => {
                let s = strings.first()?.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            Value::Primitive(bytes) => match elem.vr() {
                VR::US => basic.decode_us(&bytes[..]).ok().map(i64::from),
                VR::SS => basic.decode_ss(&bytes[..]).ok().map(i64::from),
                VR::UL => basic.decode_ul(&bytes[..]).ok().map(i64::from),
                VR::SL => basic.decode_sl(&bytes[..]).ok().map(i64::from),
                VR::FL => basic.decode_fl(&bytes[..]).ok().map(|f| f as i64),
                VR::FD => basic.decode_fd(&bytes[..]).ok().map(|f| f as i64),
                _ => None,
            },
            Value::Sequence(_) => None,
        }
    }

    fn float_at(&self, path: &[u32]) -> Option<f64> {
        let (leaf, leading) = path.split_last()?;
        if *leaf == 0 {
            return None;
        }
        let ds = self.dataset_at(leading)?;
        let elem = ds.get(Tag::from(*leaf))?;
        let basic = BasicDecoder::from(self.ts.endianness);
        match elem.value() {
            Value::Strings(strings) => strings.first()?.trim().parse::<f64>().ok(),
            Value::Primitive(bytes) => match elem.vr() {
                VR::FL => basic.decode_fl(&bytes[..]).ok().map(f64::from),
                VR::FD => basic.decode_fd(&bytes[..]).ok(),
                VR::US => basic.decode_us(&bytes[..]).ok().map(f64::from),
                VR::SS => basic.decode_ss(&bytes[..]).ok().map(f64::from),
                VR::UL => basic.decode_ul(&bytes[..]).ok().map(f64::from),
                VR::SL => basic.decode_sl(&bytes[..]).ok().map(f64::from),
                _ => None,
            },
            Value::Sequence(_) => None,
        }
    }

    // --- save ---

    /// Serialize the object to a writer. On failure the source stream
    /// is closed and further saves will fail with [`Error::SourceClosed`].
    pub fn save_to<W: Write>(&mut self, out: &mut W, options: &SaveOptions) -> Result<()> {
        let meta_table = self.meta_for_save();
        let source = self.source.as_mut().context(SourceClosedSnafu)?;
        let outcome = write::save_object(
            out,
            &meta_table,
            &self.dataset,
            self.ts,
            self.cursor.as_ref(),
            source,
            options,
        );
        match outcome {
            Ok(()) => Ok(()),
            Err(e) => {
                self.source = None;
                Err(e).context(WriteObjectSnafu)
            }
        }
    }

    /// Serialize the object to a file. On failure the partial output is
    /// removed and the source stream is closed.
    pub fn save<P: AsRef<Path>>(&mut self, path: P, options: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).context(CreateFileSnafu { path })?;
        let mut out = BufWriter::new(file);
        match self.save_to(&mut out, options) {
            Ok(()) => Ok(()),
            Err(e) => {
                drop(out);
                if let Err(remove_err) = std::fs::remove_file(path) {
                    tracing::warn!(
                        "Could not remove partial output {}: {}",
                        path.display(),
                        remove_err
                    );
                }
                Err(e)
            }
        }
    }

    /// The file meta table to be written on save: the parsed one,
    /// or a new table synthesized from the data set.
    fn meta_for_save(&self) -> FileMetaTable {
        match &self.meta {
            Some(m) => m.clone(),
            None => {
                let mut table = FileMetaTable {
                    information_group_length: 0,
                    information_version: [0, 1],
                    media_storage_sop_class_uid: self
                        .string_at(&[u32::from(tags::SOP_CLASS_UID)], '\\')
                        .unwrap_or_default(),
                    media_storage_sop_instance_uid: self
                        .string_at(&[u32::from(tags::SOP_INSTANCE_UID)], '\\')
                        .unwrap_or_default(),
                    transfer_syntax: self.ts.uid.to_string(),
                    implementation_class_uid: IMPLEMENTATION_CLASS_UID.to_string(),
                    implementation_version_name: Some(IMPLEMENTATION_VERSION_NAME.to_string()),
                    source_application_entity_title: None,
                    private_information_creator_uid: None,
                    private_information: None,
                };
                table.update_information_group_length();
                table
            }
        }
    }
}

fn is_meta_range(tag: u32) -> bool {
    (tag & 0x7FFF_FFFF) < 0x0008_0000
}

fn trim_uid(uid: &str) -> &str {
    uid.trim_end_matches(|c: char| c.is_whitespace() || c == '\0')
}

/// One byte, one character: the reinterpretation used for
/// CTP-owned private blocks.
fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Resolve a file meta attribute to its string form.
fn meta_string(meta: &FileMetaTable, tag: Tag) -> Option<String> {
    match tag {
        tags::MEDIA_STORAGE_SOP_CLASS_UID => {
            Some(meta.media_storage_sop_class_uid().to_string())
        }
        tags::MEDIA_STORAGE_SOP_INSTANCE_UID => {
            Some(meta.media_storage_sop_instance_uid().to_string())
        }
        tags::TRANSFER_SYNTAX_UID => Some(meta.transfer_syntax().to_string()),
        tags::IMPLEMENTATION_CLASS_UID => Some(meta.implementation_class_uid.clone()),
        tags::IMPLEMENTATION_VERSION_NAME => meta.implementation_version_name.clone(),
        tags::SOURCE_APPLICATION_ENTITY_TITLE => meta.source_application_entity_title.clone(),
        _ => None,
    }
}
