/// Converts a 1-based (line, column) position (rune-counted columns, as
/// produced by the tokenizer) into a byte offset within `text`.
pub fn byte_offset(text: &str, line: usize, col: usize) -> usize {
    let mut cur_line = 1;
    let mut cur_col = 1;
    for (idx, ch) in text.char_indices() {
        if cur_line == line && cur_col == col {
            return idx;
        }
        if ch == '\n' {
            cur_line += 1;
            cur_col = 1;
        } else {
            cur_col += 1;
        }
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_offset_on_first_line() {
        assert_eq!(byte_offset("SELECT a, b", 1, 8), 7);
    }

    #[test]
    fn finds_offset_on_second_line() {
        assert_eq!(byte_offset("SELECT a\nFROM t", 2, 1), 9);
    }

    #[test]
    fn past_end_returns_text_len() {
        assert_eq!(byte_offset("abc", 5, 1), 3);
    }
}
