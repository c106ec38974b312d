//! Filter scripts applied to real parsed objects.

use dcmgate_filter::Filter;
use dcmgate_object::DicomFile;
use std::io::Cursor;

/// An implicit VR little endian data set:
/// (0008,0060) CS "CT", (0010,0010) PN "JANE^X", (0010,0020) LO "JOHN^DOE"
fn object() -> DicomFile<Cursor<Vec<u8>>> {
    let data: Vec<u8> = vec![
        0x08, 0x00, 0x60, 0x00, 0x02, 0x00, 0x00, 0x00, b'C', b'T', //
        0x10, 0x00, 0x10, 0x00, 0x06, 0x00, 0x00, 0x00, b'J', b'A', b'N', b'E', b'^', b'X', //
        0x10, 0x00, 0x20, 0x00, 0x08, 0x00, 0x00, 0x00, b'J', b'O', b'H', b'N', b'^', b'D', b'O',
        b'E',
    ];
    DicomFile::from_reader(Cursor::new(data)).expect("should parse")
}

#[test]
fn match_on_element_values() {
    let obj = object();
    assert!(Filter::new(r#"Modality.equals("CT")"#).matches(&obj));
    assert!(Filter::new(r#"PatientID.startsWith("JOHN")"#).matches(&obj));
    assert!(!Filter::new(r#"PatientID.equals("JANE")"#).matches(&obj));
}

#[test]
fn absent_element_compares_unequal() {
    let obj = object();
    // StudyDate is absent and reads as "", so the negation holds
    let filter = Filter::new(r#"PatientID.equals("JOHN^DOE") * !StudyDate.equals("CT")"#);
    assert!(filter.matches(&obj));
}

#[test]
fn pattern_alternation() {
    let obj = object();
    let filter = Filter::new(r#"PatientName.matches("JOHN.*") + PatientName.matches("JANE.*")"#);
    assert!(filter.matches(&obj));
}

#[test]
fn hex_addresses_in_scripts() {
    let obj = object();
    assert!(Filter::new(r#"[0008,0060].equals("CT")"#).matches(&obj));
    assert!(Filter::new(r#"00100020.equals("JOHN^DOE")"#).matches(&obj));
}
