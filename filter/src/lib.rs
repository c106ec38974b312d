#![deny(trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, unused_qualifications, unused_import_braces)]
//! A small boolean predicate language over DICOM element values,
//! used to filter and route objects.
//!
//! Scripts call match methods on named element values and combine the
//! outcomes with `!` (not), `*` (and) and `+` (or), `*` binding tighter
//! than `+`. Whitespace is insignificant and `//` starts a line comment.
//!
//! ```text
//! PatientID.equals("JOHN^DOE") * !Modality.equals("CT")
//! + StudyDescription.containsIgnoreCase("chest")   // fallback
//! ```
//!
//! Element addresses take any form accepted by the object layer:
//! attribute keywords, hexadecimal tags, and `::`-separated sequence
//! paths. A missing element reads as an empty string, which compares
//! unequal to any non-empty literal.
//!
//! # Example
//!
//! ```no_run
//! use dcmgate_filter::Filter;
//! use dcmgate_object::DicomFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let obj = DicomFile::open("image.dcm")?;
//! let filter = Filter::new(r#"Modality.equals("CT") * PatientID.startsWith("A")"#);
//! if filter.matches(&obj) {
//!     // route the object
//! }
//! # Ok(())
//! # }
//! ```

mod eval;
mod lexer;
mod token;

use snafu::{Backtrace, Snafu};

pub use crate::token::Token;

/// An error raised when a filter script cannot be parsed or evaluated.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ScriptError {
    /// A character that does not start any token.
    #[snafu(display("Unexpected character at offset {}", position))]
    UnexpectedCharacter { position: usize, backtrace: Backtrace },

    /// A quoted literal with no closing quote.
    #[snafu(display("Unterminated string literal at offset {}", position))]
    UnterminatedLiteral { position: usize, backtrace: Backtrace },

    /// Parentheses that do not pair up.
    #[snafu(display("Unbalanced group parentheses"))]
    UnbalancedGroup { backtrace: Backtrace },

    /// Operators and operands that do not form an expression.
    #[snafu(display("Malformed expression"))]
    MalformedExpression { backtrace: Backtrace },
}

/// Any source of element values a filter can be applied to.
pub trait ElementSource {
    /// Fetch the value of the element with the given address,
    /// or an empty string when it is absent.
    fn element_text(&self, spec: &str) -> String;
}

impl<S> ElementSource for dcmgate_object::DicomFile<S>
where
    S: std::io::Read + std::io::Seek,
{
    fn element_text(&self, spec: &str) -> String {
        self.element_string(spec, "")
    }
}

/// A compiled-by-name filter script.
///
/// The script text is kept as-is; operand evaluation happens against
/// the queried object on every [`matches`](Filter::matches) call.
#[derive(Debug, Clone)]
pub struct Filter {
    script: String,
}

impl Filter {
    /// Create a filter from its script text.
    pub fn new(script: impl Into<String>) -> Self {
        Filter {
            script: script.into(),
        }
    }

    /// The script text.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// Evaluate the script against the given object.
    pub fn evaluate<T>(&self, obj: &T) -> Result<bool, ScriptError>
    where
        T: ElementSource + ?Sized,
    {
        let tokens = lexer::tokenize(&self.script, obj)?;
        eval::evaluate(&tokens)
    }

    /// Whether the given object matches the script.
    /// Script errors are logged and count as no match.
    pub fn matches<T>(&self, obj: &T) -> bool
    where
        T: ElementSource + ?Sized,
    {
        match self.evaluate(obj) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Filter script failed, treating as no match: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ElementSource;
    use std::collections::HashMap;

    /// An element source backed by a plain map, for tests.
    pub struct MapSource(HashMap<&'static str, &'static str>);

    impl MapSource {
        pub fn empty() -> Self {
            MapSource(HashMap::new())
        }

        pub fn of(entries: &[(&'static str, &'static str)]) -> Self {
            MapSource(entries.iter().copied().collect())
        }
    }

    impl ElementSource for MapSource {
        fn element_text(&self, spec: &str) -> String {
            self.0.get(spec).copied().unwrap_or_default().to_string()
        }
    }
}
