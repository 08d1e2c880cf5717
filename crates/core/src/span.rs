use smol_str::SmolStr;

/// A half-open region of a source file, given as 1-based line/column pairs
/// at both endpoints. Column counts are in Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: SmolStr,
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
}

impl Span {
    pub fn new(
        file: impl Into<SmolStr>,
        start_line: usize,
        start_col: usize,
        end_line: usize,
        end_col: usize,
    ) -> Self {
        Self {
            file: file.into(),
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// A zero-width span at a single point, used for synthetic tokens (e.g. EOF).
    pub fn point(file: impl Into<SmolStr>, line: usize, col: usize) -> Self {
        let file = file.into();
        Self::new(file, line, col, line, col)
    }

    /// Whether the span satisfies the invariant `end >= start` (lexicographic
    /// on `(line, col)`). Every span this crate produces must uphold this.
    pub fn is_well_formed(&self) -> bool {
        (self.end_line, self.end_col) >= (self.start_line, self.start_col)
    }

    /// The smallest span covering both `self` and `other`.
    pub fn between(&self, other: &Span) -> Span {
        let (start_line, start_col) = (self.start_line, self.start_col).min((
            other.start_line,
            other.start_col,
        ));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        Span::new(self.file.clone(), start_line, start_col, end_line, end_col)
    }

    /// Widen `self` so it also covers `other`, in place.
    pub fn extend(&mut self, other: &Span) {
        *self = self.between(other);
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start_line, self.start_col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_covers_both() {
        let a = Span::new("f.sql", 1, 1, 1, 5);
        let b = Span::new("f.sql", 2, 1, 2, 3);
        let merged = a.between(&b);
        assert_eq!((merged.start_line, merged.start_col), (1, 1));
        assert_eq!((merged.end_line, merged.end_col), (2, 3));
        assert!(merged.is_well_formed());
    }

    #[test]
    fn extend_widens_in_place() {
        let mut a = Span::new("f.sql", 1, 1, 1, 2);
        let b = Span::new("f.sql", 1, 5, 1, 8);
        a.extend(&b);
        assert_eq!((a.start_col, a.end_col), (1, 8));
    }
}
