//!
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// A class name is an identifier beginning with an uppercase letter.
pub fn is_class_name(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

/// Coroutine member names carry a leading underscore; method names do not.
pub fn is_coroutine_name(s: &str) -> bool {
    s.starts_with('_')
}

/// Unescape a quoted literal body (without the surrounding quotes).
pub fn unescape(s: &str) -> Result<String, char> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('0') => out.push('\0'),
            Some(other) => return Err(other),
            None => return Err('\\'),
        }
    }
    Ok(out)
}
