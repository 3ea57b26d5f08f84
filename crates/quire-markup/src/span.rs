/// A byte range `[start, end)` into the source markup.
///
/// Every element records the span of its full source text and the span of
/// its inner content, so callers can lift the exact original slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the length in bytes. Uses saturating subtraction for safety.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the span is empty (start >= end).
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// The source slice covered by this span.
    ///
    /// Out-of-range spans yield an empty string rather than panicking.
    pub fn slice(self, source: &str) -> &str {
        source.get(self.start..self.end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_len_and_slice() {
        let span = Span::new(3, 5);
        assert_eq!(span.len(), 2);
        assert!(!span.is_empty());
        assert_eq!(span.slice("<p>hi</p>"), "hi");
    }

    #[test]
    fn inverted_span_is_empty() {
        let span = Span::new(5, 3);
        assert_eq!(span.len(), 0);
        assert!(span.is_empty());
        assert_eq!(span.slice("abcdef"), "");
    }
}
