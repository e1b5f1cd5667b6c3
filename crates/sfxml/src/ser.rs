//! XML serializer, the inverse of the parser
//!
//! Tag names and attribute residue are written verbatim; text content and
//! declared types go through [`encode`]. Names are assumed to be safe XML
//! names, as the dialect only uses identifiers.

use crate::entities::encode;
use crate::parser::{NIL_ATTRIBUTE, TYPE_ATTRIBUTE};
use crate::value::{Element, Value};

/// Declaration written at the start of every document
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Writes elements into a borrowed output buffer
#[derive(Debug)]
pub struct Serializer<'o> {
    output: &'o mut String,
}

impl<'o> Serializer<'o> {
    pub fn new(output: &'o mut String) -> Self {
        Self { output }
    }

    /// Write the declaration followed by the root element
    pub fn document(&mut self, root: &Element) {
        self.output.push_str(DECLARATION);
        self.element(&root.name, &root.attributes, &root.value);
    }

    /// Write one element; arrays repeat the tag once per item
    pub fn element(&mut self, name: &str, attributes: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.element(name, attributes, item);
                }
            }
            Value::Nil => {
                self.output.push('<');
                self.output.push_str(name);
                self.output.push_str(attributes);
                self.output.push_str(NIL_ATTRIBUTE);
                self.output.push_str("/>");
            }
            Value::Text(text) => {
                self.open_tag(name, attributes, None);
                self.output.push_str(&encode(text));
                self.close_tag(name);
            }
            Value::Complex(complex) => {
                self.open_tag(name, attributes, complex.type_name.as_deref());
                if let Some(text) = &complex.text {
                    self.output.push_str(&encode(text));
                }
                for (key, child) in complex {
                    self.element(key, "", child);
                }
                self.close_tag(name);
            }
        }
    }

    fn open_tag(&mut self, name: &str, attributes: &str, type_name: Option<&str>) {
        self.output.push('<');
        self.output.push_str(name);
        self.output.push_str(attributes);
        if let Some(type_name) = type_name {
            self.output.push_str(TYPE_ATTRIBUTE);
            self.output.push_str(&encode(type_name));
            self.output.push('"');
        }
        self.output.push('>');
    }

    fn close_tag(&mut self, name: &str) {
        self.output.push_str("</");
        self.output.push_str(name);
        self.output.push('>');
    }
}
