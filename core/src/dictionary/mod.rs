//! Data element dictionary types and the standard attribute registry.
//!
//! The dictionary maps attribute aliases (such as `PatientID`) and tags
//! (such as `(0010,0020)`) to dictionary entries, which carry the
//! attribute's canonical value representation.

mod entries;
pub mod uids;

use crate::header::{Tag, VR};
use entries::ENTRIES;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// A dictionary entry for a single known attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DictionaryEntry {
    /// the attribute tag
    pub tag: Tag,
    /// the attribute keyword (alias), with no spaces
    pub alias: &'static str,
    /// the attribute's canonical value representation
    pub vr: VR,
}

/// A data element dictionary: resolves attribute aliases and tags
/// to dictionary entries.
pub trait DataDictionary {
    /// Fetch an entry by its usual keyword (e.g. `PatientName`).
    /// Aliases are case sensitive and not padded.
    fn by_name(&self, name: &str) -> Option<&DictionaryEntry>;

    /// Fetch an entry by its tag.
    fn by_tag(&self, tag: Tag) -> Option<&DictionaryEntry>;

    /// Fetch the canonical VR for a tag,
    /// defaulting to UN for tags not in the dictionary.
    fn vr_of(&self, tag: Tag) -> VR {
        self.by_tag(tag).map(|e| e.vr).unwrap_or(VR::UN)
    }
}

static DICT: Lazy<StandardDictionaryRegistry> = Lazy::new(init_dictionary);

/// Retrieve a singleton instance of the standard dictionary registry.
#[inline]
pub fn registry() -> &'static StandardDictionaryRegistry {
    &DICT
}

/// The data struct actually containing the standard dictionary index.
///
/// This structure is made opaque via the unit type
/// [`StandardDataDictionary`], which provides a lazily loaded singleton.
#[derive(Debug)]
pub struct StandardDictionaryRegistry {
    /// mapping: keyword → entry
    by_name: HashMap<&'static str, &'static DictionaryEntry>,
    /// mapping: tag → entry
    by_tag: HashMap<Tag, &'static DictionaryEntry>,
}

impl StandardDictionaryRegistry {
    fn new() -> StandardDictionaryRegistry {
        StandardDictionaryRegistry {
            by_name: HashMap::with_capacity(ENTRIES.len()),
            by_tag: HashMap::with_capacity(ENTRIES.len()),
        }
    }

    fn index(&mut self, entry: &'static DictionaryEntry) -> &mut Self {
        self.by_name.insert(entry.alias, entry);
        // first entry for a tag wins, so short aliases for the same tag
        // do not displace the canonical keyword
        self.by_tag.entry(entry.tag).or_insert(entry);
        self
    }
}

/// Generic group length dictionary entry.
static GROUP_LENGTH_ENTRY: DictionaryEntry = DictionaryEntry {
    tag: Tag(0x0000, 0x0000),
    alias: "GenericGroupLength",
    vr: VR::UL,
};

/// Generic private creator dictionary entry.
static PRIVATE_CREATOR_ENTRY: DictionaryEntry = DictionaryEntry {
    tag: Tag(0x0001, 0x0010),
    alias: "PrivateCreator",
    vr: VR::LO,
};

/// A data element dictionary which consults
/// the library's global DICOM attribute registry.
///
/// The dictionary index is automatically initialized upon the first use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StandardDataDictionary;

impl StandardDataDictionary {
    fn indexed_tag(tag: Tag) -> Option<&'static DictionaryEntry> {
        let r = registry();

        r.by_tag.get(&tag).cloned().or_else(|| {
            // private creator slot within a private group
            if tag.is_private() && (0x0010..=0x00FF).contains(&tag.element()) {
                return Some(&PRIVATE_CREATOR_ENTRY);
            }
            // group length element
            if tag.element() == 0x0000 {
                return Some(&GROUP_LENGTH_ENTRY);
            }
            None
        })
    }
}

impl DataDictionary for StandardDataDictionary {
    fn by_name(&self, name: &str) -> Option<&DictionaryEntry> {
        registry().by_name.get(name).cloned()
    }

    fn by_tag(&self, tag: Tag) -> Option<&DictionaryEntry> {
        StandardDataDictionary::indexed_tag(tag)
    }
}

impl fmt::Display for StandardDataDictionary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Standard attribute dictionary")
    }
}

fn init_dictionary() -> StandardDictionaryRegistry {
    let mut d = StandardDictionaryRegistry::new();
    for entry in ENTRIES {
        d.index(entry);
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags;

    #[test]
    fn name_and_tag_lookup_agree() {
        let dict = StandardDataDictionary;
        let by_name = dict.by_name("PatientID").expect("should exist");
        assert_eq!(by_name.tag, tags::PATIENT_ID);
        assert_eq!(by_name.vr, VR::LO);
        let by_tag = dict.by_tag(Tag(0x0010, 0x0020)).expect("should exist");
        assert_eq!(by_tag.alias, "PatientID");
    }

    #[test]
    fn unknown_tags_have_no_entry() {
        let dict = StandardDataDictionary;
        assert_eq!(dict.by_name("NoSuchAttribute"), None);
        assert_eq!(dict.by_tag(Tag(0x0009, 0x0001)), None);
        assert_eq!(dict.vr_of(Tag(0x0009, 0x0001)), VR::UN);
    }

    #[test]
    fn synthetic_entries() {
        let dict = StandardDataDictionary;
        // group lengths
        assert_eq!(dict.vr_of(Tag(0x0008, 0x0000)), VR::UL);
        // private creators
        assert_eq!(dict.vr_of(Tag(0x0013, 0x0010)), VR::LO);
    }
}
