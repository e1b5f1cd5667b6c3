//! Recursive-descent parser for the Salesforce XML dialect
//!
//! The parser reads the subset of XML produced by the SOAP and Metadata
//! APIs: one optional leading declaration, elements, text, comments and the
//! `xsi:nil` / `xsi:type` attributes. Anything else surfaces as an [`Error`].

use tracing::trace;

use crate::cursor::Cursor;
use crate::entities::decode;
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::value::{Complex, Element, Value};

/// Attribute marking an element as nil
pub const NIL_ATTRIBUTE: &str = " xsi:nil=\"true\"";
/// Opening of the attribute carrying the declared type
pub const TYPE_ATTRIBUTE: &str = " xsi:type=\"";

/// Configuration for the XML parser
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth (0 means unlimited)
    pub max_depth: u16,
    /// Maximum input size in bytes (0 means unlimited)
    pub max_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_size: 64 * 1024 * 1024, // 64 MB default
        }
    }
}

impl Config {
    /// Create a new config with unlimited depth and size
    pub const fn unlimited() -> Self {
        Self {
            max_depth: 0,
            max_size: 0,
        }
    }

    /// Create a new config with specific limits
    pub const fn new(max_depth: u16, max_size: usize) -> Self {
        Self {
            max_depth,
            max_size,
        }
    }
}

/// XML parser
///
/// One parser owns one cursor and parses one document; it holds no state
/// that outlives [`Parser::parse`].
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a parser with default configuration
    pub fn new(input: &'a str) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a parser with custom configuration
    pub fn with_config(input: &'a str, config: Config) -> Self {
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse the document's root element
    ///
    /// Only whitespace and comments may follow the root element's end tag.
    pub fn parse(&mut self) -> Result<Element> {
        let size = self.cursor.remaining().len();
        if self.config.max_size > 0 && size > self.config.max_size {
            return Err(self.error_here(ErrorKind::MaxSizeExceeded {
                max: self.config.max_size,
            }));
        }

        if self.cursor.remaining().trim_start().starts_with("<?") {
            let end = self
                .cursor
                .find("?>")
                .ok_or_else(|| self.error_here(ErrorKind::UnexpectedEof))?;
            self.cursor.advance_to(end + "?>".len());
        }
        self.skip_to_markup()?;
        while self.cursor.starts_with("<!--") {
            self.skip_comment()?;
            self.skip_to_markup()?;
        }

        let root = self.parse_element(true)?;
        self.skip_epilogue()?;
        Ok(root)
    }

    fn parse_element(&mut self, root: bool) -> Result<Element> {
        if self.config.max_depth > 0 && self.depth >= self.config.max_depth {
            return Err(self.error_here(ErrorKind::MaxDepthExceeded {
                max: self.config.max_depth,
            }));
        }
        self.depth = self.depth.saturating_add(1);
        let element = self.parse_element_inner(root);
        self.depth = self.depth.saturating_sub(1);
        element
    }

    fn parse_element_inner(&mut self, root: bool) -> Result<Element> {
        let start = self.cursor.position();
        let (raw, self_closing) = self.read_start_tag()?;

        let (name, attributes) = match raw.find(' ') {
            Some(idx) => raw.split_at(idx),
            None => (raw, ""),
        };
        if name.is_empty() || name.starts_with(['!', '?']) || name.contains('/') {
            return Err(self.error_at(
                start,
                ErrorKind::Expected {
                    expected: "start tag".to_string(),
                    found: format!("<{raw}>"),
                },
            ));
        }
        let name = name.to_string();
        let mut attributes = attributes.to_string();
        trace!(element = %name, depth = self.depth, "start tag");

        let nil = match attributes.find(NIL_ATTRIBUTE) {
            Some(idx) => {
                attributes.replace_range(idx..idx + NIL_ATTRIBUTE.len(), "");
                true
            }
            None => false,
        };

        if nil {
            // Other markers on a nil element are not inspected.
            let attributes = if root { attributes } else { String::new() };
            if !self_closing {
                // Nil elements have no content; whatever is there is skipped.
                self.skip_to_markup()?;
                let mut discarded = Value::default();
                self.parse_content(&name, &mut discarded)?;
            }
            return Ok(Element {
                name,
                attributes,
                value: Value::Nil,
            });
        }

        let mut typed = None;
        if let Some(idx) = attributes.find(TYPE_ATTRIBUTE) {
            let value_start = idx + TYPE_ATTRIBUTE.len();
            let value_end = attributes
                .get(value_start..)
                .and_then(|rest| rest.find('"'))
                .map(|len| value_start + len)
                .ok_or_else(|| {
                    self.error_at(
                        start,
                        ErrorKind::Expected {
                            expected: "closing quote of xsi:type".to_string(),
                            found: format!("<{raw}>"),
                        },
                    )
                })?;
            let type_name = decode(attributes.get(value_start..value_end).unwrap_or_default());
            typed = Some(Complex::with_type(type_name));
            attributes.replace_range(idx..=value_end, "");
        }
        let attributes = self.check_attributes(root, &name, attributes, start)?;

        if self_closing {
            let value = typed.map_or_else(Value::default, Value::Complex);
            return Ok(Element {
                name,
                attributes,
                value,
            });
        }

        let text_end = self
            .cursor
            .find("<")
            .ok_or_else(|| self.error_here(ErrorKind::UnexpectedEof))?;
        let text = decode(self.cursor.slice(self.cursor.pos(), text_end));
        self.cursor.advance_to(text_end);

        let mut value = match typed {
            Some(mut complex) => {
                if !text.trim().is_empty() {
                    complex.text = Some(text.into_owned());
                }
                Value::Complex(complex)
            }
            None => Value::Text(text.into_owned()),
        };

        self.parse_content(&name, &mut value)?;

        Ok(Element {
            name,
            attributes,
            value,
        })
    }

    /// Consume children, comments and whitespace up to and including the
    /// end tag of `name`, merging children into `value`.
    fn parse_content(&mut self, name: &str, value: &mut Value) -> Result<()> {
        loop {
            if self.cursor.starts_with("</") {
                return self.parse_end_tag(name);
            }

            if self.cursor.starts_with("<!--") {
                self.skip_comment()?;
            } else {
                if !value.is_complex() {
                    *value = Value::Complex(Complex::new());
                }
                let child = self.parse_element(false)?;
                if let Value::Complex(complex) = value {
                    complex.push(child.name, child.value);
                }
            }

            self.skip_whitespace_gap()?;
        }
    }

    /// Read `<...>` and return its inside, without a self-closing slash
    fn read_start_tag(&mut self) -> Result<(&'a str, bool)> {
        if self.cursor.current() != Some(b'<') {
            return Err(self.error_here(ErrorKind::Expected {
                expected: "'<'".to_string(),
                found: self.cursor.context(),
            }));
        }
        self.cursor.advance_by(1);

        let end = self
            .cursor
            .find(">")
            .ok_or_else(|| self.error_here(ErrorKind::UnexpectedEof))?;
        let raw = self.cursor.slice(self.cursor.pos(), end);
        self.cursor.advance_to(end + 1);

        Ok(match raw.strip_suffix('/') {
            Some(raw) => (raw, true),
            None => (raw, false),
        })
    }

    fn parse_end_tag(&mut self, name: &str) -> Result<()> {
        let end = self
            .cursor
            .find(">")
            .ok_or_else(|| self.error_here(ErrorKind::UnexpectedEof))?;
        let tag = self.cursor.slice(self.cursor.pos(), end + 1);

        let matches = tag
            .strip_prefix("</")
            .and_then(|rest| rest.strip_suffix('>'))
            .is_some_and(|found| found == name);
        if !matches {
            return Err(self.error_here(ErrorKind::MismatchedEndTag {
                expected: name.to_string(),
                found: tag.to_string(),
            }));
        }

        self.cursor.advance_to(end + 1);
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start = self.cursor.position();
        self.cursor.advance_by("<!--".len());
        let end = self
            .cursor
            .find("-->")
            .ok_or_else(|| self.error_at(start, ErrorKind::UnterminatedComment))?;
        self.cursor.advance_to(end + "-->".len());
        Ok(())
    }

    /// Move to the next `<`, accepting only whitespace on the way
    fn skip_whitespace_gap(&mut self) -> Result<()> {
        let next = self
            .cursor
            .find("<")
            .ok_or_else(|| self.error_here(ErrorKind::UnexpectedEof))?;
        if !self.cursor.slice(self.cursor.pos(), next).trim().is_empty() {
            return Err(self.error_here(ErrorKind::TextBetweenElements));
        }
        self.cursor.advance_to(next);
        Ok(())
    }

    /// Consume whitespace and comments after the root element up to the end
    fn skip_epilogue(&mut self) -> Result<()> {
        loop {
            let rest = self.cursor.remaining();
            self.cursor.advance_by(rest.len() - rest.trim_start().len());
            if self.cursor.remaining().is_empty() {
                return Ok(());
            }
            if !self.cursor.starts_with("<!--") {
                return Err(self.error_here(ErrorKind::Expected {
                    expected: "end of document".to_string(),
                    found: self.cursor.context(),
                }));
            }
            self.skip_comment()?;
        }
    }

    /// Move to the next `<` without looking at what is skipped
    fn skip_to_markup(&mut self) -> Result<()> {
        let next = self
            .cursor
            .find("<")
            .ok_or_else(|| self.error_here(ErrorKind::UnexpectedEof))?;
        self.cursor.advance_to(next);
        Ok(())
    }

    /// Root elements keep their attribute residue; nested elements must not
    /// have any beyond the markers.
    fn check_attributes(
        &self,
        root: bool,
        name: &str,
        attributes: String,
        start: Pos,
    ) -> Result<String> {
        if root {
            return Ok(attributes);
        }
        if attributes.trim().is_empty() {
            return Ok(String::new());
        }
        Err(self.error_at(
            start,
            ErrorKind::UnexpectedAttributes {
                element: name.to_string(),
                attributes,
            },
        ))
    }

    fn error_here(&self, kind: ErrorKind) -> Error {
        self.error_at(self.cursor.position(), kind)
    }

    fn error_at(&self, pos: Pos, kind: ErrorKind) -> Error {
        Error::new(kind, Span::new(pos, self.cursor.position()))
            .with_context(self.cursor.context_at(pos.offset))
    }
}
