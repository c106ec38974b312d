//! This module contains the in-memory representation of a parsed data set:
//! the element value model and the order-preserving data set container.

use dcmgate_core::header::{DataElementHeader, Header, Length, Tag, VR};
use dcmgate_encoding::text::SpecificCharacterSet;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

/// The type used for lists of decoded string values.
/// Most data elements have a value multiplicity of 1.
pub type Strings = SmallVec<[String; 2]>;

/// The value of a data element.
///
/// String-class values are decoded through the active character set at
/// parse time and split at the `\` value delimiter. All other non-sequence
/// values keep their raw bytes in the byte order of the source stream,
/// so that a preserving save can reproduce them exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Raw value bytes, in source byte order.
    Primitive(Vec<u8>),
    /// Decoded and split text values.
    Strings(Strings),
    /// Nested data sets (sequence items).
    Sequence(Vec<DataSet>),
}

impl Value {
    /// Whether this value holds no data at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Primitive(data) => data.is_empty(),
            Value::Strings(strings) => strings.is_empty(),
            Value::Sequence(items) => items.is_empty(),
        }
    }

    /// Fetch the nested data sets, if this is a sequence value.
    pub fn items(&self) -> Option<&[DataSet]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Fetch the nested data sets for modification,
    /// if this is a sequence value.
    pub fn items_mut(&mut self) -> Option<&mut [DataSet]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Fetch the raw bytes, if this is a primitive value.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Primitive(data) => Some(data),
            _ => None,
        }
    }

    /// Fetch the decoded strings, if this is a string value.
    pub fn strings(&self) -> Option<&[String]> {
        match self {
            Value::Strings(strings) => Some(strings),
            _ => None,
        }
    }
}

/// A single data element: a header and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    header: DataElementHeader,
    value: Value,
}

impl Element {
    /// Create an element from the given parts. No validation is performed
    /// on whether the VR is compatible with the value variant.
    pub fn new(tag: Tag, vr: VR, len: Length, value: Value) -> Self {
        Element {
            header: DataElementHeader::new(tag, vr, len),
            value,
        }
    }

    /// Retrieve the element header.
    pub fn header(&self) -> &DataElementHeader {
        &self.header
    }

    /// Retrieve the element's value representation.
    pub fn vr(&self) -> VR {
        self.header.vr()
    }

    /// Retrieve the data value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Retrieve the data value for modification.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Join the element's string values with the given separator.
    /// Non-string values yield `None`.
    pub fn joined_strings(&self, separator: char) -> Option<String> {
        self.value.strings().map(|s| s.join(&separator.to_string()))
    }
}

impl Header for Element {
    fn tag(&self) -> Tag {
        self.header.tag()
    }

    fn len(&self) -> Length {
        self.header.len()
    }
}

/// An in-memory DICOM data set: an ordered collection of data elements,
/// keeping the order in which they were found in (or added to) the
/// encoded stream.
///
/// The data set carries the specific character set in force for its scope.
/// Item data sets nested in a sequence inherit the character set of the
/// enclosing data set unless they contain their own
/// _SpecificCharacterSet_ (0008,0005) element.
#[derive(Clone, Default)]
pub struct DataSet {
    /// the elements, in encoded-file order
    elements: Vec<Element>,
    /// mapping: tag → index into `elements`
    index: HashMap<Tag, usize>,
    /// the character set in force for this scope
    charset: SpecificCharacterSet,
}

impl DataSet {
    /// Create an empty data set with the default character set.
    pub fn new() -> Self {
        DataSet::default()
    }

    /// Create an empty data set with the given character set.
    pub fn with_charset(charset: SpecificCharacterSet) -> Self {
        DataSet {
            elements: Vec::new(),
            index: HashMap::new(),
            charset,
        }
    }

    /// The character set in force for this data set's scope.
    pub fn charset(&self) -> &SpecificCharacterSet {
        &self.charset
    }

    /// Replace the character set in force for this data set's scope.
    pub fn set_charset(&mut self, charset: SpecificCharacterSet) {
        self.charset = charset;
    }

    /// Insert a data element into the set, replacing any element
    /// of the same tag while keeping its original position.
    pub fn put(&mut self, elem: Element) {
        match self.index.get(&elem.tag()) {
            Some(&i) => {
                self.elements[i] = elem;
            }
            None => {
                self.index.insert(elem.tag(), self.elements.len());
                self.elements.push(elem);
            }
        }
    }

    /// Fetch the element with the given tag, if present.
    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.index.get(&tag).map(|&i| &self.elements[i])
    }

    /// Fetch the element with the given tag for modification, if present.
    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut Element> {
        let i = *self.index.get(&tag)?;
        Some(&mut self.elements[i])
    }

    /// Whether an element with the given tag is present.
    pub fn contains(&self, tag: Tag) -> bool {
        self.index.contains_key(&tag)
    }

    /// The number of elements in the data set.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the data set holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Iterate over the elements in encoded-file order.
    pub fn iter(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter()
    }
}

impl PartialEq for DataSet {
    // character sets do not take part in data set equality
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl fmt::Debug for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DataSet")
            .field("elements", &self.elements)
            .finish()
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn string_element(tag: Tag, vr: VR, value: &str) -> Element {
        Element::new(
            tag,
            vr,
            Length(value.len() as u32),
            Value::Strings(smallvec![value.to_string()]),
        )
    }

    #[test]
    fn insertion_order_is_kept() {
        let mut ds = DataSet::new();
        ds.put(string_element(Tag(0x0010, 0x0020), VR::LO, "ABC123"));
        ds.put(string_element(Tag(0x0008, 0x0060), VR::CS, "CT"));
        ds.put(string_element(Tag(0x0010, 0x0010), VR::PN, "DOE^JOHN"));

        let tags: Vec<Tag> = ds.iter().map(|e| e.tag()).collect();
        assert_eq!(
            tags,
            vec![Tag(0x0010, 0x0020), Tag(0x0008, 0x0060), Tag(0x0010, 0x0010)]
        );
    }

    #[test]
    fn replacement_keeps_position() {
        let mut ds = DataSet::new();
        ds.put(string_element(Tag(0x0008, 0x0060), VR::CS, "CT"));
        ds.put(string_element(Tag(0x0010, 0x0020), VR::LO, "ABC123"));
        ds.put(string_element(Tag(0x0008, 0x0060), VR::CS, "MR"));

        assert_eq!(ds.len(), 2);
        let first = ds.iter().next().unwrap();
        assert_eq!(first.tag(), Tag(0x0008, 0x0060));
        assert_eq!(first.joined_strings('\\').unwrap(), "MR");
    }

    #[test]
    fn sequence_values() {
        let mut item = DataSet::new();
        item.put(string_element(Tag(0x0010, 0x0020), VR::LO, "A"));
        let seq = Element::new(
            Tag(0x0004, 0x1220),
            VR::SQ,
            Length::UNDEFINED,
            Value::Sequence(vec![item]),
        );
        assert_eq!(seq.value().items().unwrap().len(), 1);
        assert!(seq.value().bytes().is_none());
    }
}
