/// Canonicalize an identifier for use as a catalog map key: strip any of the
/// three quoting forms (`"…"`, `` `…` ``, `[…]`), undo the doubled-quote
/// escape for the two forms that use it, then lowercase and trim.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = if let Some(inner) = strip_quotes(trimmed, '"', '"') {
        inner.replace("\"\"", "\"")
    } else if let Some(inner) = strip_quotes(trimmed, '`', '`') {
        inner.replace("``", "`")
    } else if let Some(inner) = strip_quotes(trimmed, '[', ']') {
        inner.to_string()
    } else {
        trimmed.to_string()
    };
    unquoted.trim().to_lowercase()
}

fn strip_quotes(s: &str, open: char, close: char) -> Option<&str> {
    let mut chars = s.chars();
    if chars.next() != Some(open) {
        return None;
    }
    let rest = &s[open.len_utf8()..];
    if !rest.ends_with(close) || rest.len() < close.len_utf8() {
        return None;
    }
    Some(&rest[..rest.len() - close.len_utf8()])
}

/// Split a possibly schema-qualified name (`schema.name`) into the
/// qualifier (if any) and the bare name, leaving both pieces as-written for
/// later normalization.
pub fn split_qualified(raw: &str) -> (Option<&str>, &str) {
    match raw.rsplit_once('.') {
        Some((qualifier, name)) => (Some(qualifier), name),
        None => (None, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_double_quotes_and_unescapes() {
        assert_eq!(normalize_identifier("\"My\"\"Table\""), "my\"table");
    }

    #[test]
    fn strips_backticks() {
        assert_eq!(normalize_identifier("`Users`"), "users");
    }

    #[test]
    fn strips_brackets() {
        assert_eq!(normalize_identifier("[Users]"), "users");
    }

    #[test]
    fn bare_identifier_lowercased() {
        assert_eq!(normalize_identifier("  Users  "), "users");
    }

    #[test]
    fn splits_qualifier() {
        assert_eq!(split_qualified("public.users"), (Some("public"), "users"));
        assert_eq!(split_qualified("users"), (None, "users"));
    }
}
