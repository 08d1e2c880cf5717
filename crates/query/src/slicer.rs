use regex::Regex;
use smol_str::SmolStr;
use std::sync::OnceLock;

use crate::verb::BlockVerb;

/// A `-- name: X :verb` delimited region of a query file, addressed by byte
/// offset for rewriting. `start_offset` is the byte offset of the first SQL
/// character after the header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub path: SmolStr,
    pub name: SmolStr,
    pub verb: BlockVerb,
    pub line: usize,
    pub column: usize,
    pub start_offset: usize,
    pub sql: String,
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^-- name:[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t]+:([A-Za-z]+)[ \t]*$").unwrap()
    })
}

/// Splits a query file into blocks. A file with no header produces zero
/// blocks. Unrecognized verbs are skipped (not treated as a header at all)
/// rather than erroring, since a `--` comment that merely resembles a
/// header is plausible source text.
pub fn slice_blocks(path: &str, text: &str) -> Vec<Block> {
    let re = header_re();
    let matches: Vec<_> = re
        .captures_iter(text)
        .filter_map(|caps| {
            let verb = BlockVerb::parse(&caps[2])?;
            let whole = caps.get(0).unwrap();
            Some((whole.start(), whole.end(), caps[1].to_string(), verb))
        })
        .collect();

    let mut blocks = Vec::with_capacity(matches.len());
    for (i, (start, header_end, name, verb)) in matches.iter().enumerate() {
        let sql_start = skip_newline(text, *header_end);
        let sql_end = matches.get(i + 1).map(|(next_start, ..)| *next_start).unwrap_or(text.len());
        let sql = text[sql_start..sql_end].to_string();
        let (line, column) = line_col(text, *start);
        blocks.push(Block {
            path: path.into(),
            name: name.as_str().into(),
            verb: *verb,
            line,
            column,
            start_offset: sql_start,
            sql,
        });
    }
    log::debug!("{path}: sliced {} query block(s)", blocks.len());
    blocks
}

fn skip_newline(text: &str, offset: usize) -> usize {
    let bytes = text.as_bytes();
    if offset < bytes.len() && bytes[offset] == b'\r' {
        return (offset + 2).min(text.len());
    }
    if offset < bytes.len() && bytes[offset] == b'\n' {
        return offset + 1;
    }
    offset
}

fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for ch in text[..offset].chars() {
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
