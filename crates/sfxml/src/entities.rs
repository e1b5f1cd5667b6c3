//! Escaping of the five XML-significant characters
//!
//! Numeric character references are not recognized; the dialect never
//! produces them and they pass through [`decode`] untouched.

use std::borrow::Cow;

const ENTITIES: [(&str, char); 5] = [
    ("&gt;", '>'),
    ("&lt;", '<'),
    ("&quot;", '"'),
    ("&apos;", '\''),
    ("&amp;", '&'),
];

/// Replace the five named references with the characters they stand for
///
/// Decoding is a single left-to-right pass, so `&amp;lt;` yields `&lt;` and
/// never `<`. Unknown references are kept as written.
pub fn decode(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find('&') {
        let (head, tail) = rest.split_at(idx);
        out.push_str(head);
        match ENTITIES
            .iter()
            .find(|(entity, _)| tail.starts_with(entity))
        {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = tail.get(entity.len()..).unwrap_or_default();
            }
            None => {
                out.push('&');
                rest = tail.get(1..).unwrap_or_default();
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Escape text for use as element content or an attribute value
pub fn encode(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}
