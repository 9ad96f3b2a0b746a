// src/extractors/value.rs
//! Cell-level helpers: text cleanup, value tokenization and numeric parsing
//! for figures as they are typeset in filing tables.

/// Collapses runs of whitespace (including non-breaking spaces) into single spaces and trims.
pub fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turns the value cells of a row into figure tokens.
///
/// Filings typeset `$ (1,234 )` across separate cells: lone `$` cells are dropped and a
/// cell starting with `)` or `%` is glued onto the token before it.
pub fn value_tokens<S: AsRef<str>>(cells: &[S]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for cell in cells {
        let cell = cell.as_ref().trim();
        if cell.is_empty() || cell == "$" {
            continue;
        }
        if cell.starts_with(')') || cell.starts_with('%') {
            if let Some(last) = tokens.last_mut() {
                last.push_str(cell);
                continue;
            }
        }
        tokens.push(cell.to_string());
    }
    tokens
}

fn is_dash(c: char) -> bool {
    matches!(c, '-' | '\u{2010}'..='\u{2015}' | '\u{2212}')
}

/// Parses a figure such as `1,234`, `$ 6.08` or `(1,234)`.
///
/// Parentheses mean negative. Dash placeholders and anything non-numeric are `None`.
pub fn parse_value(raw: &str) -> Option<f64> {
    let text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
        .collect();
    if text.is_empty() || text.chars().all(is_dash) {
        return None;
    }

    let (negated, body) = match text.strip_prefix('(') {
        Some(inner) => (true, inner.strip_suffix(')')?),
        None => (false, text.as_str()),
    };
    let body = body.replace('\u{2212}', "-");

    let (sign, digits) = match body.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, body.as_str()),
    };
    if !digits.chars().any(|c| c.is_ascii_digit())
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return None;
    }

    let magnitude: f64 = digits.parse().ok()?;
    let value = if negated { -sign * magnitude } else { sign * magnitude };
    // -0.0 would be written as "-0"
    Some(if value == 0.0 { 0.0 } else { value })
}
