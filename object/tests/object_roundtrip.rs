//! End-to-end tests over whole in-memory files: parsing, element access,
//! preserving and transcoding saves, encapsulated pixel data, and
//! directory (DICOMDIR) routing.

use dcmgate_object::{DicomFile, SaveOptions};
use std::io::Cursor;

// --- test file builders ---

/// Append an explicit VR little endian element with a short-form header.
fn put_short(out: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], value: &[u8]) {
    assert!(value.len() % 2 == 0, "test values must be even-length");
    out.extend_from_slice(&group.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(vr);
    out.extend_from_slice(&(value.len() as u16).to_le_bytes());
    out.extend_from_slice(value);
}

/// Append an explicit VR little endian element with a long-form header.
fn put_long(out: &mut Vec<u8>, group: u16, element: u16, vr: &[u8; 2], len: u32) {
    out.extend_from_slice(&group.to_le_bytes());
    out.extend_from_slice(&element.to_le_bytes());
    out.extend_from_slice(vr);
    out.extend_from_slice(&[0, 0]);
    out.extend_from_slice(&len.to_le_bytes());
}

/// Build preamble, magic code and file meta group for the given UIDs.
fn file_head(sop_class_uid: &str, sop_instance_uid: &str, ts_uid: &str) -> Vec<u8> {
    let mut meta = Vec::new();
    put_short(&mut meta, 0x0002, 0x0001, b"OB", &[0x00, 0x01]);
    put_short(&mut meta, 0x0002, 0x0002, b"UI", &pad_uid(sop_class_uid));
    put_short(&mut meta, 0x0002, 0x0003, b"UI", &pad_uid(sop_instance_uid));
    put_short(&mut meta, 0x0002, 0x0010, b"UI", &pad_uid(ts_uid));
    put_short(&mut meta, 0x0002, 0x0012, b"UI", &pad_uid("1.2.345.6.7890"));

    let mut out = vec![0u8; 128];
    out.extend_from_slice(b"DICM");
    // (0002,0001) has a long-form header: 4 extra bytes over put_short
    put_short(&mut out, 0x0002, 0x0000, b"UL", &(meta.len() as u32 + 4).to_le_bytes());
    // rewrite (0002,0001) in its proper long form
    let mut meta_fixed = Vec::new();
    put_long(&mut meta_fixed, 0x0002, 0x0001, b"OB", 2);
    meta_fixed.extend_from_slice(&[0x00, 0x01]);
    meta_fixed.extend_from_slice(&meta[10..]);
    out.extend_from_slice(&meta_fixed);
    out
}

fn pad_uid(uid: &str) -> Vec<u8> {
    let mut v = uid.as_bytes().to_vec();
    if v.len() % 2 != 0 {
        v.push(0);
    }
    v
}

/// The scenario-1 file: explicit VR LE, a few identification elements,
/// no pixel data.
fn simple_file() -> Vec<u8> {
    let mut data = file_head("1.2.840.10008.5.1.4.1.1.7", "1.2.3.4.5", "1.2.840.10008.1.2.1");
    put_short(&mut data, 0x0008, 0x0018, b"UI", &pad_uid("1.2.3.4.5"));
    put_short(&mut data, 0x0010, 0x0020, b"LO", b"JOHN^DOE");
    data
}

// --- scenarios ---

#[test]
fn parse_simple_file() {
    let mut obj = DicomFile::from_reader(Cursor::new(simple_file())).expect("should parse");
    assert_eq!(obj.element_string("PatientID", ""), "JOHN^DOE");
    assert!(!obj.is_image());
    assert!(!obj.is_dicomdir());
    assert_eq!(obj.transfer_syntax().uid, "1.2.840.10008.1.2.1");
    assert_eq!(obj.sop_instance_uid(), "1.2.3.4.5");

    // file-meta fallthrough: group 0002 is resolved from the meta table
    assert_eq!(obj.element_string("TransferSyntaxUID", ""), "1.2.840.10008.1.2.1");

    let mut out = Vec::new();
    obj.save_to(&mut out, &SaveOptions::default())
        .expect("save should succeed");
}

#[test]
fn preserving_save_is_byte_identical() {
    let input = simple_file();
    let mut obj = DicomFile::from_reader(Cursor::new(input.clone())).expect("should parse");

    let mut out = Vec::new();
    obj.save_to(&mut out, &SaveOptions::default()).expect("save");
    assert_eq!(out, input);

    // the object can be saved repeatedly with the same outcome
    let mut out2 = Vec::new();
    obj.save_to(&mut out2, &SaveOptions::default()).expect("second save");
    assert_eq!(out2, input);
}

#[test]
fn reparsed_save_preserves_elements() {
    let mut obj = DicomFile::from_reader(Cursor::new(simple_file())).expect("should parse");
    let mut out = Vec::new();
    obj.save_to(&mut out, &SaveOptions::default()).expect("save");

    let reparsed = DicomFile::from_reader(Cursor::new(out)).expect("should re-parse");
    assert_eq!(reparsed.element_string("PatientID", ""), "JOHN^DOE");
    assert_eq!(
        reparsed.meta().expect("should have meta").transfer_syntax(),
        "1.2.840.10008.1.2.1"
    );
    assert_eq!(reparsed.dataset(), obj.dataset());
}

#[test]
fn force_implicit_le() {
    let mut obj = DicomFile::from_reader(Cursor::new(simple_file())).expect("should parse");
    let mut out = Vec::new();
    obj.save_to(
        &mut out,
        &SaveOptions {
            force_implicit_le: true,
        },
    )
    .expect("save");

    let reparsed = DicomFile::from_reader(Cursor::new(out)).expect("should re-parse");
    assert_eq!(
        reparsed.meta().expect("should have meta").transfer_syntax(),
        "1.2.840.10008.1.2"
    );
    assert_eq!(reparsed.element_string("PatientID", ""), "JOHN^DOE");
}

#[test]
fn big_endian_values_are_swapped_on_transcode() {
    // explicit VR big endian file with (0028,0010) Rows = 512
    let mut data = file_head("1.2.840.10008.5.1.4.1.1.7", "1.2.3.4.5", "1.2.840.10008.1.2.2");
    data.extend_from_slice(&[0x00, 0x28, 0x00, 0x10]); // tag, BE
    data.extend_from_slice(b"US");
    data.extend_from_slice(&[0x00, 0x02]); // length 2, BE
    data.extend_from_slice(&[0x02, 0x00]); // 512, BE

    let mut obj = DicomFile::from_reader(Cursor::new(data)).expect("should parse");
    assert_eq!(obj.element_int("Rows", 0), 512);

    let mut out = Vec::new();
    obj.save_to(
        &mut out,
        &SaveOptions {
            force_implicit_le: true,
        },
    )
    .expect("save");

    let reparsed = DicomFile::from_reader(Cursor::new(out)).expect("should re-parse");
    assert_eq!(reparsed.transfer_syntax().uid, "1.2.840.10008.1.2");
    assert_eq!(reparsed.element_int("Rows", 0), 512);
}

#[test]
fn encapsulated_fragments_are_preserved() {
    let mut data = file_head(
        "1.2.840.10008.5.1.4.1.1.7",
        "1.2.3.4.5",
        "1.2.840.10008.1.2.4.50",
    );
    put_short(&mut data, 0x0010, 0x0020, b"LO", b"JOHN^DOE");
    // PixelData, OB, undefined length
    put_long(&mut data, 0x7FE0, 0x0010, b"OB", 0xFFFF_FFFF);
    let pixel_section_start = data.len();
    // offset-table-free: two fragments and the sequence delimiter
    data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0x04, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0x02, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0xCA, 0xFE]);
    data.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    let pixel_section = data[pixel_section_start..].to_vec();

    let mut obj = DicomFile::from_reader(Cursor::new(data.clone())).expect("should parse");
    assert!(obj.is_image());
    assert!(obj.is_encapsulated());

    let mut out = Vec::new();
    obj.save_to(&mut out, &SaveOptions::default()).expect("save");
    // the whole file round-trips, including both fragments and the delimiter
    assert_eq!(out, data);
    assert!(out.ends_with(&pixel_section));

    // forcing implicit VR is not possible on encapsulated data
    let mut out2 = Vec::new();
    obj.save_to(
        &mut out2,
        &SaveOptions {
            force_implicit_le: true,
        },
    )
    .expect("save");
    assert_eq!(out2, data);
}

#[test]
fn elements_after_pixel_data_are_streamed() {
    let mut data = file_head("1.2.840.10008.5.1.4.1.1.7", "1.2.3.4.5", "1.2.840.10008.1.2.1");
    put_short(&mut data, 0x0010, 0x0020, b"LO", b"JOHN^DOE");
    put_long(&mut data, 0x7FE0, 0x0010, b"OW", 4);
    data.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
    // a private element following the pixel data
    put_short(&mut data, 0x0009, 0x0001, b"LO", b"TRAILER 1 ");

    let mut obj = DicomFile::from_reader(Cursor::new(data.clone())).expect("should parse");
    assert!(obj.is_image());
    assert!(!obj.is_encapsulated());
    // the trailing element is not part of the parsed data set
    assert_eq!(obj.element_string("0009,0001", ""), "");

    let mut out = Vec::new();
    obj.save_to(&mut out, &SaveOptions::default()).expect("save");
    assert_eq!(out, data);
}

#[test]
fn dicomdir_routes_to_first_record() {
    let mut data = file_head("1.2.840.10008.1.3.10", "1.2.3.4.5", "1.2.840.10008.1.2.1");
    // DirectoryRecordSeq with two records: PatientID "A." / "B."
    put_long(&mut data, 0x0004, 0x1220, b"SQ", 0xFFFF_FFFF);
    for id in [b"A ", b"B "] {
        data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
        put_short(&mut data, 0x0010, 0x0020, b"LO", id);
        data.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    }
    data.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);

    let obj = DicomFile::from_reader(Cursor::new(data)).expect("should parse");
    assert!(obj.is_dicomdir());
    // sequence descent takes the first item only
    assert_eq!(obj.element_string("DirectoryRecordSeq::PatientID", ""), "A");
    // patient-level getters route into the directory records
    assert_eq!(obj.patient_id(), "A");
}

#[test]
fn manifest_flags() {
    let mut data = file_head(
        "1.2.840.10008.5.1.4.1.1.88.59",
        "1.2.3.4.5",
        "1.2.840.10008.1.2.1",
    );
    // ConceptNameCodeSeq with one item: CodeValue "TCE002"
    put_long(&mut data, 0x0040, 0xA043, b"SQ", 0xFFFF_FFFF);
    data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
    put_short(&mut data, 0x0008, 0x0100, b"SH", b"TCE002");
    data.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);

    let obj = DicomFile::from_reader(Cursor::new(data)).expect("should parse");
    assert!(obj.is_kin());
    assert!(obj.is_manifest());
    assert!(!obj.is_sr());
    assert!(!obj.is_additional_tf_info());
}

#[test]
fn additional_teaching_file_flags() {
    let mut data = file_head(
        "1.2.840.10008.5.1.4.1.1.88.22",
        "1.2.3.4.5",
        "1.2.840.10008.1.2.1",
    );
    put_long(&mut data, 0x0040, 0xA043, b"SQ", 0xFFFF_FFFF);
    data.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xFF, 0xFF, 0xFF, 0xFF]);
    put_short(&mut data, 0x0008, 0x0100, b"SH", b"TCE006");
    data.extend_from_slice(&[0xFE, 0xFF, 0x0D, 0xE0, 0x00, 0x00, 0x00, 0x00]);
    data.extend_from_slice(&[0xFE, 0xFF, 0xDD, 0xE0, 0x00, 0x00, 0x00, 0x00]);

    let obj = DicomFile::from_reader(Cursor::new(data)).expect("should parse");
    assert!(obj.is_sr());
    assert!(obj.is_additional_tf_info());
    assert!(!obj.is_manifest());
}

#[test]
fn save_to_files_on_disk() {
    let dir = tempfile::tempdir().expect("should create temp dir");
    let in_path = dir.path().join("in.dcm");
    std::fs::write(&in_path, simple_file()).expect("should write input");

    let mut obj = DicomFile::open(&in_path).expect("should open");
    assert_eq!(obj.element_string("PatientID", ""), "JOHN^DOE");

    let out_path = dir.path().join("out.dcm");
    obj.save(&out_path, &SaveOptions::default()).expect("save");

    let reparsed = DicomFile::open(&out_path).expect("should re-open");
    assert_eq!(reparsed.element_string("PatientID", ""), "JOHN^DOE");
}
