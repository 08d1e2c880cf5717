use itertools::Itertools;
use sqlfix_helpers::IndexSet;

/// Hands out unique, deterministic aliases for result columns that lack
/// one. All aliases already present in the query are reserved first; new
/// names are disambiguated with `_2`, `_3`, … on collision.
pub struct AliasGenerator {
    reserved: IndexSet<String>,
}

impl AliasGenerator {
    pub fn new(existing_aliases: impl IntoIterator<Item = String>) -> Self {
        Self {
            reserved: existing_aliases.into_iter().collect(),
        }
    }

    /// Reserves `base` if free, else `base_2`, `base_3`, … Always succeeds
    /// and always returns a name not previously handed out.
    pub fn generate(&mut self, base: &str) -> String {
        let base = if base.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
            format!("col_{base}")
        } else {
            base.to_string()
        };
        if self.reserved.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.reserved.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Derives the base alias identifier for a result-column expression lacking
/// one, per the derivation rules: aggregate calls, boolean literals,
/// single-quoted/numeric literals, and a generic identifier-boundary split
/// otherwise.
pub fn derive_base_alias(expr: &str) -> String {
    let trimmed = expr.trim();

    if trimmed.eq_ignore_ascii_case("TRUE") {
        return "flag_true".to_string();
    }
    if trimmed.eq_ignore_ascii_case("FALSE") {
        return "flag_false".to_string();
    }

    if let Some(call) = parse_call(trimmed) {
        let (_func, arg) = call;
        let arg = arg.trim();
        let suffix = if arg == "*" || arg == "1" {
            "all".to_string()
        } else {
            trailing_identifier(arg).unwrap_or_else(|| "expr".to_string())
        };
        return format!("{}_{suffix}", function_name(trimmed).to_lowercase());
    }

    if trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 {
        let body = &trimmed[1..trimmed.len() - 1];
        return format!("const_{}", sanitize(body));
    }

    if trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') && trimmed.chars().any(|c| c.is_ascii_digit()) {
        return format!("const_{}", trimmed.replace('.', "_"));
    }

    let parts = split_identifier_boundaries(trimmed);
    if parts.is_empty() {
        return "expr".to_string();
    }
    parts.into_iter().take(3).join("_")
}

fn function_name(expr: &str) -> String {
    expr.split('(').next().unwrap_or(expr).trim().to_string()
}

fn parse_call(expr: &str) -> Option<(&str, &str)> {
    let open = expr.find('(')?;
    if !expr.ends_with(')') {
        return None;
    }
    let name = &expr[..open];
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    Some((name, &expr[open + 1..expr.len() - 1]))
}

fn trailing_identifier(expr: &str) -> Option<String> {
    let tail = expr.rsplit(|c: char| !(c.is_alphanumeric() || c == '_')).find(|s| !s.is_empty())?;
    Some(tail.to_lowercase())
}

fn sanitize(body: &str) -> String {
    let s: String = body
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if s.is_empty() {
        "empty".to_string()
    } else {
        s
    }
}

/// Splits an expression on identifier boundaries and operator characters,
/// lowercasing identifier parts and spelling out operators as words.
fn split_identifier_boundaries(expr: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = expr.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_alphanumeric() || c == '_' {
            current.push(c);
            i += 1;
            continue;
        }
        if !current.is_empty() {
            parts.push(current.to_lowercase());
            current.clear();
        }
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        let word = match c {
            '+' => Some("plus"),
            '-' => Some("minus"),
            '*' => Some("mul"),
            '/' => Some("div"),
            '%' => Some("mod"),
            _ => None,
        };
        if let Some(w) = word {
            parts.push(w.to_string());
        }
        i += 1;
    }
    if !current.is_empty() {
        parts.push(current.to_lowercase());
    }
    parts
}
