use std::fmt;
use std::sync::Arc;

use crate::types::ErrorLocationProvider;

/// A byte range within the markup string an element was scanned from.
///
/// The input string is shared by reference count so that every token and
/// error produced from one scan points at the same buffer. Locations are
/// immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    /// Reference-counted input string that was scanned.
    pub input: Arc<str>,
    /// Zero-based inclusive start offset in bytes.
    pub start: usize,
    /// Zero-based exclusive end offset in bytes.
    pub end: usize,
}

impl SourceLocation {
    /// Creates a new `SourceLocation` covering `[start, end)` of `input`.
    #[must_use]
    pub const fn new(input: Arc<str>, start: usize, end: usize) -> Self {
        Self { input, start, end }
    }

    /// Convenience constructor from a plain string slice.
    #[must_use]
    pub fn from_str(input: &str, start: usize, end: usize) -> Self {
        Self::new(Arc::from(input), start, end)
    }

    /// The inclusive start offset.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// The exclusive end offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// The input string this location points into.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Merges two locations into one spanning from the start of the first to
    /// the end of the second. Both must point into the same input buffer;
    /// if either side is `None` the other is returned unchanged.
    #[must_use]
    pub fn range(first: Option<Self>, second: Option<Self>) -> Option<Self> {
        match (first, second) {
            (Some(fp), None) => Some(fp),
            (None, Some(sp)) => Some(sp),
            (Some(fp), Some(sp)) => {
                if !Arc::ptr_eq(&fp.input, &sp.input) {
                    return None;
                }
                Some(Self {
                    input: Arc::clone(&fp.input),
                    start: fp.start,
                    end: sp.end,
                })
            }
            _ => None,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl ErrorLocationProvider for SourceLocation {
    fn loc(&self) -> Option<&SourceLocation> {
        Some(self)
    }
}
