//! XML content types for tree nodes.
//!
//! `XmlContent` represents the content of a node: an element (qualified name
//! plus attributes) or character data. Both variants cache a 64-bit content
//! hash used as a fast pre-check before full structural comparison.

use std::collections::HashMap;
use std::hash::Hasher;

use rustc_hash::FxHasher;

/// Represents the content of an XML node.
#[derive(Debug, Clone)]
pub enum XmlContent {
    /// An XML element with a qualified name and attributes.
    Element(XmlElement),
    /// XML character data.
    Text(XmlText),
}

impl XmlContent {
    /// Tests content equality; the cached hashes serve as a cheap pre-check.
    pub fn content_equals(&self, other: &XmlContent) -> bool {
        match (self, other) {
            (XmlContent::Element(a), XmlContent::Element(b)) => a.content_equals(b),
            (XmlContent::Text(a), XmlContent::Text(b)) => a.content_equals(b),
            _ => false,
        }
    }

    /// Returns a 64-bit hash code for this content.
    pub fn content_hash(&self) -> u64 {
        match self {
            XmlContent::Element(e) => e.content_hash(),
            XmlContent::Text(t) => t.content_hash(),
        }
    }

    /// Returns true if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self, XmlContent::Element(_))
    }

    /// Returns true if this is a text node.
    pub fn is_text(&self) -> bool {
        matches!(self, XmlContent::Text(_))
    }

    /// Returns a reference to the element, if this is an element node.
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlContent::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Returns a reference to the text, if this is a text node.
    pub fn as_text(&self) -> Option<&XmlText> {
        match self {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Returns the local part of a qualified name, i.e. `"upnp:class"` becomes
/// `"class"` while `"res"` is returned unchanged.
pub fn local_name(qname: &str) -> &str {
    match qname.split_once(':') {
        Some((_, local)) => local,
        None => qname,
    }
}

fn hash_str(hasher: &mut FxHasher, s: &str) {
    hasher.write(s.as_bytes());
    hasher.write_u8(0xff);
}

/// An XML element with a qualified name and attributes.
#[derive(Debug, Clone)]
pub struct XmlElement {
    /// The qualified name of the element (e.g. "res", "upnp:class").
    name: String,
    /// Attributes as key-value pairs. The key is the qualified attribute name.
    attributes: HashMap<String, String>,
    /// Cached hash over name and attributes.
    content_hash: u64,
}

impl XmlElement {
    /// Creates a new XML element with the given name and attributes.
    pub fn new(name: String, attributes: HashMap<String, String>) -> Self {
        let mut element = XmlElement {
            name,
            attributes,
            content_hash: 0,
        };
        element.rehash();
        element
    }

    /// Recalculates the cached hash. Attribute names are sorted first so the
    /// hash is independent of map iteration order.
    fn rehash(&mut self) {
        let mut hasher = FxHasher::default();
        hash_str(&mut hasher, &self.name);

        let mut attr_names: Vec<&String> = self.attributes.keys().collect();
        attr_names.sort();
        for attr_name in attr_names {
            hash_str(&mut hasher, attr_name);
            hash_str(&mut hasher, &self.attributes[attr_name]);
        }

        self.content_hash = hasher.finish();
    }

    /// Returns the qualified name of the element.
    pub fn qname(&self) -> &str {
        &self.name
    }

    /// Returns the local part of the element name, without any namespace
    /// prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Returns the attributes.
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    /// Returns the value of the named attribute, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Tests name and attribute equality. The hash comparison rejects most
    /// mismatches without walking the attribute maps.
    pub fn content_equals(&self, other: &XmlElement) -> bool {
        self.content_hash == other.content_hash
            && self.name == other.name
            && self.attributes == other.attributes
    }

    /// Returns the cached 64-bit hash code for this element.
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }
}

impl std::fmt::Display for XmlElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {{", self.name)?;
        let mut attr_names: Vec<&String> = self.attributes.keys().collect();
        attr_names.sort();
        for name in attr_names {
            write!(f, " {}={}", name, self.attributes[name])?;
        }
        write!(f, " }}")
    }
}

/// XML character data.
#[derive(Debug, Clone)]
pub struct XmlText {
    text: String,
    content_hash: u64,
}

impl XmlText {
    /// Creates a new text node from a string.
    pub fn new(text: &str) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write(text.as_bytes());
        XmlText {
            text: text.to_string(),
            content_hash: hasher.finish(),
        }
    }

    /// Tests content equality; the cached hashes serve as a cheap pre-check.
    pub fn content_equals(&self, other: &XmlText) -> bool {
        self.content_hash == other.content_hash && self.text == other.text
    }

    /// Returns the text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the cached 64-bit hash code for this text node.
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }
}

impl std::fmt::Display for XmlText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}
