//! Value model shared by the parser and the serializer

use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::ops::Index;

#[cfg(feature = "serde")]
mod serde_impl;

static NIL: Value = Value::Nil;

/// One parsed tag and its descendants
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Element {
    /// Tag name, including any literal prefix such as `soapenv:`
    pub name: String,
    /// Unparsed attribute residue of the root element, leading space included
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: String,
    /// Content of the element
    pub value: Value,
}

impl Element {
    /// Creates an element without attributes
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            attributes: String::new(),
            value: value.into(),
        }
    }

    /// Sets the verbatim attribute residue emitted on the opening tag
    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = attributes.into();
        self
    }
}

/// Content of an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The element carried `xsi:nil="true"`
    Nil,
    /// Decoded character data of an element without children or type
    Text(String),
    /// Child elements keyed by tag name
    Complex(Complex),
    /// Repeated same-named siblings, in document order
    Array(Vec<Value>),
}

impl Value {
    /// Returns true if this value is nil
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value is text
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns true if this value is complex
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    /// Returns true if this value is an array
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns the text if this is a text value, None otherwise
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the complex value, None otherwise
    pub fn as_complex(&self) -> Option<&Complex> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    /// Returns a mutable reference to the complex value, None otherwise
    pub fn as_complex_mut(&mut self) -> Option<&mut Complex> {
        match self {
            Self::Complex(c) => Some(c),
            _ => None,
        }
    }

    /// Looks up a child entry if this is a complex value
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.as_complex().and_then(|c| c.get(key))
    }

    /// Normalizes the one-or-many ambiguity left by coalescing
    ///
    /// Nil and empty text give no items, an array gives its items, and any
    /// other value is a single item.
    pub fn items(&self) -> &[Self] {
        match self {
            Self::Nil => &[],
            Self::Text(s) if s.is_empty() => &[],
            Self::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Complex> for Value {
    fn from(value: Complex) -> Self {
        Self::Complex(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(values)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

impl Index<&str> for Value {
    type Output = Value;

    /// Missing entries and non-complex values index to `Nil`
    fn index(&self, key: &str) -> &Self::Output {
        self.get(key).unwrap_or(&NIL)
    }
}

/// Structured content: ordered child entries plus the out-of-band markers
#[derive(Debug, Clone, Default)]
pub struct Complex {
    /// Declared type, read from and written to `xsi:type`
    pub type_name: Option<String>,
    /// Non-whitespace text found next to a declared type
    pub text: Option<String>,
    entries: IndexMap<String, Value>,
}

impl Complex {
    /// Creates a new empty complex value
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty complex value carrying a declared type
    pub fn with_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Builder form of [`Complex::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the number of child entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no child entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns a reference to the entry for the key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns a mutable reference to the entry for the key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.entries.get_mut(key)
    }

    /// Inserts an entry, replacing any previous one in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Adds a child the way repeated siblings coalesce
    ///
    /// An absent key gets the value itself, a present scalar becomes a
    /// two-item array, and an existing array is appended to.
    pub fn push(&mut self, key: impl Into<String>, value: Value) {
        match self.entries.entry(key.into()) {
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value);
            }
            indexmap::map::Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let first = std::mem::replace(existing, Value::Nil);
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }

    /// Removes an entry, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Returns true if the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns an iterator over the keys
    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.entries.keys()
    }

    /// Returns an iterator over the entries' values
    pub fn values(&self) -> Values<'_, String, Value> {
        self.entries.values()
    }

    /// Returns an iterator over entries in document order
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.entries.iter()
    }
}

// Entry order is part of the document, so equality is order-sensitive.
impl PartialEq for Complex {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.text == other.text
            && self.entries.len() == other.entries.len()
            && self.entries.iter().eq(other.entries.iter())
    }
}

impl Eq for Complex {}

impl Index<&str> for Complex {
    type Output = Value;

    fn index(&self, key: &str) -> &Self::Output {
        self.get(key).unwrap_or(&NIL)
    }
}

impl<'a> IntoIterator for &'a Complex {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Complex {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Complex {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut complex = Self::new();
        for (key, value) in iter {
            complex.insert(key, value);
        }
        complex
    }
}

/// Normalizes an optional entry into a slice of items
///
/// Absent entries, nil and empty text give an empty slice; arrays are
/// returned as-is; anything else is wrapped as a single item.
pub fn as_array(value: Option<&Value>) -> &[Value] {
    match value {
        Some(value) => value.items(),
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_is_methods() {
        assert!(Value::Nil.is_nil());
        assert!(Value::from("x").is_text());
        assert!(Value::from(Complex::new()).is_complex());
        assert!(Value::from(vec![Value::Nil]).is_array());
        assert!(!Value::Nil.is_text());
    }

    #[test]
    fn test_value_from_option() {
        assert_eq!(Value::from(None::<&str>), Value::Nil);
        assert_eq!(Value::from(Some("a")), Value::Text("a".to_string()));
    }

    #[test]
    fn test_complex_push_coalesces() {
        let mut c = Complex::new();
        c.push("a", "1".into());
        assert_eq!(c["a"], Value::from("1"));
        c.push("a", "2".into());
        assert_eq!(
            c["a"],
            Value::Array(vec![Value::from("1"), Value::from("2")])
        );
        c.push("a", "3".into());
        assert_eq!(c["a"].items().len(), 3);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_complex_order_sensitive_equality() {
        let ab = Complex::new().with("a", "1").with("b", "2");
        let ba = Complex::new().with("b", "2").with("a", "1");
        assert_ne!(ab, ba);
        assert_eq!(ab.clone(), ab);
    }

    #[test]
    fn test_complex_remove_keeps_order() {
        let mut c = Complex::new().with("a", "1").with("b", "2").with("c", "3");
        assert_eq!(c.remove("a"), Some(Value::from("1")));
        let keys: Vec<_> = c.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_index_missing_is_nil() {
        let v = Value::from(Complex::new().with("a", "1"));
        assert_eq!(v["a"], Value::from("1"));
        assert!(v["missing"].is_nil());
        assert!(Value::from("text")["a"].is_nil());
    }

    #[test]
    fn test_as_array_totality() {
        assert!(as_array(None).is_empty());
        assert!(as_array(Some(&Value::Nil)).is_empty());
        assert!(as_array(Some(&Value::from(""))).is_empty());

        let three = Value::from("3");
        assert_eq!(as_array(Some(&three)), std::slice::from_ref(&three));

        let many = Value::Array(vec![Value::from("1"), Value::from("2")]);
        let items = as_array(Some(&many));
        assert_eq!(items.len(), 2);
        assert!(matches!(&many, Value::Array(v) if std::ptr::eq(v.as_slice(), items)));
    }

    #[test]
    fn test_complex_from_iter() {
        let c: Complex = vec![("x", Value::from("1")), ("y", Value::Nil)]
            .into_iter()
            .collect();
        assert_eq!(c.len(), 2);
        assert!(c["y"].is_nil());
    }
}
