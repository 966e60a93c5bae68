// src/core/html.rs
// Tolerant tag-block scanning over raw page text.
// ASCII lowercasing keeps byte offsets, so the lowercase copy is computed once
// per scanned fragment and offsets are shared with the original.

use super::sanitize::{normalize_entities, normalize_ws};

pub struct Scan<'a> {
    src: &'a str,
    lc: String,
}

impl<'a> Scan<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, lc: src.to_ascii_lowercase() }
    }

    pub fn as_str(&self) -> &'a str { self.src }

    /// Next complete `<tag ...>...</tag>` block at or after `from`.
    /// The tag name must be followed by whitespace, `/` or `>`, so `th` never matches `<thead>`.
    pub fn next_tag_block_ci(&self, tag: &str, from: usize) -> Option<(usize, usize)> {
        let tag = tag.to_ascii_lowercase();
        let open = join!("<", &tag);
        let close = join!("</", &tag, ">");

        let mut pos = from;
        let start = loop {
            let at = self.lc.get(pos..)?.find(&open)? + pos;
            let after = at + open.len();
            match self.lc.as_bytes().get(after) {
                Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/' => break at,
                Some(_) => pos = after,
                None => return None,
            }
        };
        let open_end = self.src[start..].find('>')? + start + 1;
        let end_rel = self.lc[open_end..].find(&close)?;
        Some((start, open_end + end_rel + close.len()))
    }

    /// All top-level `tag` blocks in order.
    pub fn blocks(&self, tag: &str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut pos = 0usize;
        while let Some((s, e)) = self.next_tag_block_ci(tag, pos) {
            out.push(&self.src[s..e]);
            pos = e;
        }
        out
    }

    /// First `tag` block whose opening tag carries `class` among its classes.
    pub fn first_with_class(&self, tag: &str, class: &str) -> Option<&'a str> {
        self.blocks(tag)
            .into_iter()
            .find(|block| has_class(opening_tag(block), class))
    }

    /// Visible text of the first `tag` block.
    pub fn first_text(&self, tag: &str) -> Option<String> {
        let (s, e) = self.next_tag_block_ci(tag, 0)?;
        Some(strip_tags(inner_after_open_tag(&self.src[s..e])))
    }
}

/// The `<...>` opener of a complete block.
pub fn opening_tag(block: &str) -> &str {
    match block.find('>') {
        Some(i) => &block[..=i],
        None => block,
    }
}

/// True if the opener's `class` attribute lists `class` (whitespace-separated, case-insensitive).
pub fn has_class(opener: &str, class: &str) -> bool {
    let lc = opener.to_ascii_lowercase();
    let Some(at) = lc.find("class=") else { return false };
    let val = &lc[at + "class=".len()..];
    let (quote, body) = match val.as_bytes().first() {
        Some(b'"') => (Some('"'), &val[1..]),
        Some(b'\'') => (Some('\''), &val[1..]),
        _ => (None, val),
    };
    let end = match quote {
        Some(q) => body.find(q),
        None => body.find(|c: char| c.is_ascii_whitespace() || c == '>'),
    }
    .unwrap_or(body.len());
    let wanted = class.to_ascii_lowercase();
    body[..end].split_ascii_whitespace().any(|c| c == wanted)
}

/// Given a complete tag block like `<td ...>INNER</td>`,
/// return INNER without the wrapping tags (may still contain nested tags).
pub fn inner_after_open_tag(block: &str) -> &str {
    if let Some(open_end) = block.find('>') {
        if let Some(close_start) = block.rfind('<') {
            if close_start > open_end {
                return &block[open_end + 1..close_start];
            }
        }
    }
    ""
}

/// Remove all tags, decode entities, collapse whitespace.
pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => { in_tag = false; out.push(' '); }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    normalize_ws(&normalize_entities(&out))
}

/// Visible text of every `cell_tag` block inside a `<tr>` block.
pub fn row_cells(tr: &str, cell_tag: &str) -> Vec<String> {
    Scan::new(tr)
        .blocks(cell_tag)
        .into_iter()
        .map(|cell| strip_tags(inner_after_open_tag(cell)))
        .collect()
}
