//! This module contains the transfer syntax descriptor table and registry.
//!
//! A transfer syntax tells the reader and writer the dataset's byte order,
//! whether value representations are explicit in the stream,
//! and whether the pixel data is encapsulated in item fragments.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

use dcmgate_core::dictionary::uids;

/// The byte order of a transfer syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Little endian byte order
    Little,
    /// Big endian byte order
    Big,
}

/// A transfer syntax specifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSyntax {
    /// The unique identifier of the transfer syntax.
    pub uid: &'static str,
    /// The name of the transfer syntax.
    pub name: &'static str,
    /// The byte order of the dataset.
    pub endianness: Endianness,
    /// Whether the value representation is explicit in element headers.
    pub explicit_vr: bool,
    /// Whether pixel data is encapsulated in item fragments.
    pub encapsulated: bool,
}

impl TransferSyntax {
    const fn new(
        uid: &'static str,
        name: &'static str,
        endianness: Endianness,
        explicit_vr: bool,
        encapsulated: bool,
    ) -> Self {
        TransferSyntax {
            uid,
            name,
            endianness,
            explicit_vr,
            encapsulated,
        }
    }

    /// Whether datasets in this transfer syntax can be decoded
    /// by the base codecs (the encapsulated family still qualifies:
    /// only its pixel data needs an external codec).
    pub fn is_decodable(&self) -> bool {
        self.uid != uids::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN
    }
}

impl fmt::Display for TransferSyntax {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.uid)
    }
}

/// Implicit VR Little Endian: the default transfer syntax.
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    uids::IMPLICIT_VR_LITTLE_ENDIAN,
    "Implicit VR Little Endian",
    Endianness::Little,
    false,
    false,
);

/// Explicit VR Little Endian.
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    uids::EXPLICIT_VR_LITTLE_ENDIAN,
    "Explicit VR Little Endian",
    Endianness::Little,
    true,
    false,
);

/// Explicit VR Big Endian (retired, still found in archives).
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax::new(
    uids::EXPLICIT_VR_BIG_ENDIAN,
    "Explicit VR Big Endian",
    Endianness::Big,
    true,
    false,
);

/// Deflated Explicit VR Little Endian (known, not decodable here).
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    uids::DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    "Deflated Explicit VR Little Endian",
    Endianness::Little,
    true,
    false,
);

/// JPEG Baseline (Process 1).
pub const JPEG_BASELINE: TransferSyntax = encapsulated(
    uids::JPEG_BASELINE,
    "JPEG Baseline (Process 1)",
);

/// JPEG Extended (Process 2 & 4).
pub const JPEG_EXTENDED: TransferSyntax = encapsulated(
    uids::JPEG_EXTENDED,
    "JPEG Extended (Process 2 & 4)",
);

/// JPEG Lossless, Non-Hierarchical (Process 14).
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: TransferSyntax = encapsulated(
    uids::JPEG_LOSSLESS_NON_HIERARCHICAL,
    "JPEG Lossless, Non-Hierarchical (Process 14)",
);

/// JPEG Lossless, Non-Hierarchical, First-Order Prediction.
pub const JPEG_LOSSLESS_SV1: TransferSyntax = encapsulated(
    uids::JPEG_LOSSLESS_SV1,
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
);

/// JPEG-LS Lossless Image Compression.
pub const JPEG_LS_LOSSLESS: TransferSyntax = encapsulated(
    uids::JPEG_LS_LOSSLESS,
    "JPEG-LS Lossless Image Compression",
);

/// JPEG-LS Lossy (Near-Lossless) Image Compression.
pub const JPEG_LS_LOSSY: TransferSyntax = encapsulated(
    uids::JPEG_LS_LOSSY,
    "JPEG-LS Lossy (Near-Lossless) Image Compression",
);

/// JPEG 2000 Image Compression (Lossless Only).
pub const JPEG_2000_LOSSLESS_ONLY: TransferSyntax = encapsulated(
    uids::JPEG_2000_LOSSLESS_ONLY,
    "JPEG 2000 Image Compression (Lossless Only)",
);

/// JPEG 2000 Image Compression.
pub const JPEG_2000: TransferSyntax = encapsulated(
    uids::JPEG_2000,
    "JPEG 2000 Image Compression",
);

/// RLE Lossless.
pub const RLE_LOSSLESS: TransferSyntax = encapsulated(
    uids::RLE_LOSSLESS,
    "RLE Lossless",
);

/// All transfer syntaxes with encapsulated pixel data are
/// explicit VR little endian at the dataset level.
const fn encapsulated(uid: &'static str, name: &'static str) -> TransferSyntax {
    TransferSyntax::new(uid, name, Endianness::Little, true, true)
}

const ENTRIES: &[TransferSyntax] = &[
    IMPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_LITTLE_ENDIAN,
    EXPLICIT_VR_BIG_ENDIAN,
    DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN,
    JPEG_BASELINE,
    JPEG_EXTENDED,
    JPEG_LOSSLESS_NON_HIERARCHICAL,
    JPEG_LOSSLESS_SV1,
    JPEG_LS_LOSSLESS,
    JPEG_LS_LOSSY,
    JPEG_2000_LOSSLESS_ONLY,
    JPEG_2000,
    RLE_LOSSLESS,
];

static REGISTRY: Lazy<HashMap<&'static str, &'static TransferSyntax>> = Lazy::new(|| {
    ENTRIES.iter().map(|ts| (ts.uid, ts)).collect()
});

/// The global registry of supported transfer syntaxes,
/// initialized on first use and immutable thereafter.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransferSyntaxRegistry;

impl TransferSyntaxRegistry {
    /// Obtain the transfer syntax identified by its respective UID.
    /// Trailing NUL and space characters in the UID are ignored.
    pub fn get(uid: &str) -> Option<&'static TransferSyntax> {
        let uid = uid.trim_end_matches(|c: char| c == '\0' || c.is_whitespace());
        REGISTRY.get(uid).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup() {
        let ts = TransferSyntaxRegistry::get("1.2.840.10008.1.2.1").expect("should be known");
        assert_eq!(ts.endianness, Endianness::Little);
        assert!(ts.explicit_vr);
        assert!(!ts.encapsulated);

        let ts = TransferSyntaxRegistry::get("1.2.840.10008.1.2.4.50\0").expect("should be known");
        assert!(ts.encapsulated);

        assert!(TransferSyntaxRegistry::get("1.2.3.4").is_none());
    }

    #[test]
    fn base_syntaxes_decodable() {
        assert!(TransferSyntaxRegistry::get("1.2.840.10008.1.2")
            .unwrap()
            .is_decodable());
        assert!(!TransferSyntaxRegistry::get("1.2.840.10008.1.2.1.99")
            .unwrap()
            .is_decodable());
    }
}
