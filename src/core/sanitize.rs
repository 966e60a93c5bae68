// src/core/sanitize.rs

/// Minimal HTML entity decoding for the entities the ranking site emits.
pub fn normalize_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Collapse runs of whitespace into a single space and trim.
pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Cell value cleanup: collapsed whitespace, `", "` thousands separators removed.
pub fn cell_value(s: &str) -> String {
    normalize_ws(s).replace(", ", "")
}

/// Header cell cleanup: collapsed whitespace, label colons removed.
pub fn cell_header(s: &str) -> String {
    normalize_ws(s).replace(':', "")
}

/// Keep printable ASCII only (0x20..=0x7E).
pub fn printable_ascii(s: &str) -> String {
    s.chars().filter(|c| (' '..='~').contains(c)).collect()
}
