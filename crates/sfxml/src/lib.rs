//! sfxml - XML for the Salesforce SOAP and Metadata APIs
//!
//! Maps the narrow XML dialect spoken by Salesforce onto a plain value
//! tree and back. Repeated tags become arrays, `xsi:nil` becomes
//! [`Value::Nil`] and `xsi:type` is kept on [`Complex::type_name`].
//!
//! # Quick Start
//!
//! ```
//! use sfxml::{as_array, parse, stringify};
//! # fn main() -> Result<(), sfxml::Error> {
//! let doc = parse("<Package><types><name>ApexClass</name></types><version>59.0</version></Package>")?;
//! assert_eq!(doc.name, "Package");
//! assert_eq!(as_array(doc.value.get("types")).len(), 1);
//! assert_eq!(doc.value["version"].as_str(), Some("59.0"));
//!
//! let xml = stringify(&doc);
//! assert!(xml.ends_with("<version>59.0</version></Package>"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod cursor;

pub mod entities;
pub use entities::{decode, encode};

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod value;
pub use value::{as_array, Complex, Element, Value};

pub mod parser;
pub use parser::{Config, Parser};

pub mod ser;
pub use ser::Serializer;

pub mod soap;

pub mod verify;
pub use verify::{parse_observed, verify, Mismatch, ObservedError, ParseObserver, RoundTrip};

use tracing::debug;

/// Parse a document into its root element
pub fn parse(text: &str) -> Result<Element> {
    parse_with_config(text, Config::default())
}

/// Parse with custom limits
pub fn parse_with_config(text: &str, config: Config) -> Result<Element> {
    let root = Parser::with_config(text, config).parse()?;
    debug!(root = %root.name, bytes = text.len(), "parsed document");
    Ok(root)
}

/// Serialize an element as a complete document, declaration included
pub fn stringify(root: &Element) -> String {
    let mut output = String::new();
    stringify_into(root, &mut output);
    output
}

/// Append a serialized document to `output`
pub fn stringify_into(root: &Element, output: &mut String) {
    let start = output.len();
    Serializer::new(output).document(root);
    debug!(root = %root.name, bytes = output.len() - start, "serialized document");
}
