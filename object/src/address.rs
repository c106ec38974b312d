//! This module parses element addresses: attribute keywords, hexadecimal
//! tag forms, and `::`-separated paths descending into sequences.
//!
//! Accepted forms for a single tag, with or without `[...]` or `(...)`
//! wrapping: a dictionary keyword (`PatientID`), a hexadecimal run
//! (`00100020`, `100020`), or hexadecimal group and element separated by
//! a comma (`0010,0020`, `10,20`). Unknown keywords resolve to the empty
//! address 0.

use dcmgate_core::dictionary::DataDictionary;
use dcmgate_core::{StandardDataDictionary, Tag};

/// Parse an element address specification into a list of packed tags,
/// one per `::`-separated path step. Steps that cannot be resolved
/// become 0.
pub fn parse_address(spec: &str) -> Vec<u32> {
    spec.split("::").map(parse_tag_spec).collect()
}

/// Parse a single tag specification into a packed tag,
/// or 0 when it cannot be resolved.
pub fn parse_tag_spec(spec: &str) -> u32 {
    let spec = spec.trim();
    let spec = strip_wrapping(spec);

    if spec.is_empty() {
        return 0;
    }

    // keywords take precedence over the (rare) all-hex-letter names
    if let Some(e) = StandardDataDictionary.by_name(spec) {
        return u32::from(e.tag);
    }

    if is_hex_form(spec) {
        return parse_hex_form(spec).unwrap_or(0);
    }

    0
}

fn strip_wrapping(spec: &str) -> &str {
    let spec = spec.trim();
    if (spec.starts_with('[') && spec.ends_with(']'))
        || (spec.starts_with('(') && spec.ends_with(')'))
    {
        spec[1..spec.len() - 1].trim()
    } else {
        spec
    }
}

fn is_hex_form(spec: &str) -> bool {
    !spec.is_empty()
        && spec
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == ',')
        && spec.chars().any(|c| c.is_ascii_hexdigit())
}

fn parse_hex_form(spec: &str) -> Option<u32> {
    match spec.find(',') {
        Some(i) => {
            let (group, element) = (&spec[..i], &spec[i + 1..]);
            if group.len() > 4 || element.len() > 4 || element.contains(',') {
                return None;
            }
            let group = u16::from_str_radix(group, 16).ok()?;
            let element = u16::from_str_radix(element, 16).ok()?;
            Some(u32::from(Tag(group, element)))
        }
        None => {
            if spec.len() > 8 {
                return None;
            }
            u32::from_str_radix(spec, 16).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_forms() {
        let expected = vec![0x0010_0020];
        assert_eq!(parse_address("PatientID"), expected);
        assert_eq!(parse_address("00100020"), expected);
        assert_eq!(parse_address("100020"), expected);
        assert_eq!(parse_address("0010,0020"), expected);
        assert_eq!(parse_address("10,20"), expected);
        assert_eq!(parse_address("(0010,0020)"), expected);
        assert_eq!(parse_address("[0010,0020]"), expected);
        assert_eq!(parse_address("[PatientID]"), expected);
    }

    #[test]
    fn unknown_names_resolve_to_zero() {
        assert_eq!(parse_address("NoSuchElement"), vec![0]);
        assert_eq!(parse_address(""), vec![0]);
        assert_eq!(parse_address("12345,1"), vec![0]);
        assert_eq!(parse_address("123456789"), vec![0]);
    }

    #[test]
    fn sequence_descent() {
        assert_eq!(
            parse_address("DirectoryRecordSeq::PatientID"),
            vec![0x0004_1220, 0x0010_0020]
        );
        assert_eq!(
            parse_address("ConceptNameCodeSeq::CodeValue"),
            vec![0x0040_A043, 0x0008_0100]
        );
        assert_eq!(
            parse_address("0008,1140::SOPInstanceUID"),
            vec![0x0008_1140, 0x0008_0018]
        );
    }
}
