use thiserror::Error;

/// A single `(start, end, replacement)` change to apply to source bytes.
/// Half-open byte range `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[error("edit range {start}..{end} is out of bounds for a {len}-byte source")]
    OutOfRange { start: usize, end: usize, len: usize },
    #[error("edit at {start}..{end} overlaps a previous edit ending at {prev_end}")]
    Overlap { start: usize, end: usize, prev_end: usize },
}

/// Stable-sorts `edits` by start position, then applies them left-to-right
/// to a fresh buffer. Overlapping or out-of-range edits abort with an
/// error; the whole set is discarded on failure.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, RewriteError> {
    edits.sort_by_key(|e| e.start);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in &edits {
        if edit.start > source.len() || edit.end > source.len() || edit.start > edit.end {
            return Err(RewriteError::OutOfRange {
                start: edit.start,
                end: edit.end,
                len: source.len(),
            });
        }
        if edit.start < cursor {
            return Err(RewriteError::Overlap {
                start: edit.start,
                end: edit.end,
                prev_end: cursor,
            });
        }
        out.push_str(&source[cursor..edit.start]);
        out.push_str(&edit.text);
        cursor = edit.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_edits_is_identity() {
        assert_eq!(apply_edits("SELECT 1", Vec::new()).unwrap(), "SELECT 1");
    }

    #[test]
    fn insert_edit_applied_at_position() {
        let edits = vec![Edit::insert(6, " AS x")];
        assert_eq!(apply_edits("SELECT a FROM t", edits).unwrap(), "SELECT AS x a FROM t");
    }

    #[test]
    fn replace_edit_applied() {
        let edits = vec![Edit::replace(7, 8, "id, email")];
        assert_eq!(apply_edits("SELECT * FROM t", edits).unwrap(), "SELECT id, email FROM t");
    }

    #[test]
    fn edits_applied_in_start_order_regardless_of_input_order() {
        let edits = vec![Edit::insert(2, "B"), Edit::insert(0, "A")];
        assert_eq!(apply_edits("XY", edits).unwrap(), "AXYB");
    }

    #[test]
    fn overlapping_edits_error() {
        let edits = vec![Edit::replace(0, 5, "a"), Edit::replace(2, 6, "b")];
        assert!(matches!(apply_edits("SELECT 1", edits), Err(RewriteError::Overlap { .. })));
    }

    #[test]
    fn out_of_range_edit_errors() {
        let edits = vec![Edit::replace(0, 100, "a")];
        assert!(matches!(apply_edits("short", edits), Err(RewriteError::OutOfRange { .. })));
    }
}
