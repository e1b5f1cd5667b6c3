//! Round-trip checking of parsed documents
//!
//! [`verify`] re-serializes a parsed element and compares the result with
//! the text it was parsed from. The comparison tolerates the differences the
//! serializer introduces on purpose:
//!
//! - whitespace following a `>` in the original
//! - `<x/>` in the original where the output has `<x></x>`, and the reverse
//!   for nil elements written as an empty pair
//! - comments in the original, including those after the root element
//! - a missing declaration in the original
//!
//! The checker is only reachable through [`parse_observed`], which takes the
//! observer explicitly; [`crate::parse`] never runs it.

use thiserror::Error;
use tracing::debug;

use crate::error::Error;
use crate::parser::Parser;
use crate::ser::DECLARATION;
use crate::value::Element;

/// Width of the text windows reported around a divergence
pub const WINDOW_LEN: usize = 50;

/// Divergence between an original document and its re-serialized form
#[derive(Error, Clone, Debug, PartialEq, Eq)]
#[error("round trip mismatch at {original_offset} (output {output_offset})\nin:\n*{original}*\nout:\n*{output}*")]
pub struct Mismatch {
    /// Byte offset in the original text
    pub original_offset: usize,
    /// Byte offset in the re-serialized text
    pub output_offset: usize,
    /// Original text starting at the divergence
    pub original: String,
    /// Re-serialized text starting at the divergence
    pub output: String,
}

/// Failure of [`parse_observed`]
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ObservedError {
    #[error(transparent)]
    Parse(#[from] Error),
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
}

/// Strategy run on every document parsed by [`parse_observed`]
pub trait ParseObserver {
    fn observe(&mut self, text: &str, parsed: &Element) -> Result<(), Mismatch>;
}

impl<F> ParseObserver for F
where
    F: FnMut(&str, &Element) -> Result<(), Mismatch>,
{
    fn observe(&mut self, text: &str, parsed: &Element) -> Result<(), Mismatch> {
        self(text, parsed)
    }
}

/// Observer that runs [`verify`] on each parsed document
#[derive(Clone, Copy, Debug, Default)]
pub struct RoundTrip;

impl ParseObserver for RoundTrip {
    fn observe(&mut self, text: &str, parsed: &Element) -> Result<(), Mismatch> {
        verify(text, parsed)
    }
}

/// Parse `text` and hand the result to `observer` before returning it
pub fn parse_observed<O>(text: &str, observer: &mut O) -> Result<Element, ObservedError>
where
    O: ParseObserver + ?Sized,
{
    let parsed = Parser::new(text).parse()?;
    observer.observe(text, &parsed)?;
    Ok(parsed)
}

/// Check that serializing `parsed` reproduces `original`
pub fn verify(original: &str, parsed: &Element) -> Result<(), Mismatch> {
    let rendered = crate::stringify(parsed);
    let input = original.as_bytes();
    let mut output = rendered.as_bytes();
    if !original.trim_start().starts_with("<?") {
        output = output.get(DECLARATION.len()..).unwrap_or_default();
    }

    let mut xp = 0;
    let mut op = 0;
    let mut space_allowed = true;

    while xp < input.len() || op < output.len() {
        let x = input.get(xp).copied();
        let o = output.get(op).copied();

        if x.is_some() && x == o {
            xp += 1;
            op += 1;
            if let Some(next) = input.get(xp).copied().filter(|b| !is_space(*b)) {
                space_allowed = next == b'>';
            }
        } else if space_allowed && x.is_some_and(is_space) {
            xp += 1;
        } else if let Some(skip) = self_closing_in_input(input, xp, output, op) {
            xp += skip.0;
            op += skip.1;
            space_allowed = true;
        } else if let Some(skip) = empty_pair_in_input(input, xp, output, op) {
            xp += skip;
            op += "/>".len();
            space_allowed = true;
        } else if o.is_none() && input.get(xp..).is_some_and(|rest| rest.starts_with(b"<!--")) {
            let Some(end) = find(input, xp + "<!--".len(), b"-->") else {
                return Err(mismatch(input, xp, output, op));
            };
            xp = end + "-->".len();
            space_allowed = true;
        } else if xp > 0 && input.get(xp - 1..).is_some_and(|rest| rest.starts_with(b"<!--")) {
            let Some(end) = find(input, xp + "!--".len(), b"-->") else {
                return Err(mismatch(input, xp, output, op));
            };
            // The comment's `<` was matched against the next tag's `<`.
            xp = end + "-->".len();
            op = op.saturating_sub(1);
            space_allowed = true;
        } else {
            return Err(mismatch(input, xp, output, op));
        }
    }

    debug!(bytes = input.len(), "round trip verified");
    Ok(())
}

/// `<x/>` (optionally `<x />`) in the input against `<x></x>` in the output
fn self_closing_in_input(
    input: &[u8],
    xp: usize,
    output: &[u8],
    op: usize,
) -> Option<(usize, usize)> {
    let rest = input.get(xp..)?;
    let spaces = rest.iter().take_while(|b| is_space(**b)).count();
    if !rest.get(spaces..)?.starts_with(b"/>") || !output.get(op..)?.starts_with(b"></") {
        return None;
    }
    let close = find(output, op + "></".len(), b">")?;
    Some((spaces + "/>".len(), close + 1 - op))
}

/// `<x xsi:nil="true"></x>` in the input against `<x xsi:nil="true"/>`
fn empty_pair_in_input(input: &[u8], xp: usize, output: &[u8], op: usize) -> Option<usize> {
    if !input.get(xp..)?.starts_with(b"></") || !output.get(op..)?.starts_with(b"/>") {
        return None;
    }
    let close = find(input, xp + "></".len(), b">")?;
    Some(close + 1 - xp)
}

fn find(haystack: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|idx| from + idx)
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn mismatch(input: &[u8], xp: usize, output: &[u8], op: usize) -> Mismatch {
    Mismatch {
        original_offset: xp,
        output_offset: op,
        original: window(input, xp),
        output: window(output, op),
    }
}

fn window(text: &[u8], at: usize) -> String {
    let rest = text.get(at..).unwrap_or_default();
    let end = rest.len().min(WINDOW_LEN);
    String::from_utf8_lossy(rest.get(..end).unwrap_or_default()).into_owned()
}
