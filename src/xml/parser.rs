//! XML parser that builds node trees.
//!
//! This parser uses quick-xml's streaming API. Text is whitespace-normalized:
//! runs of whitespace collapse to a single space and whitespace-only text
//! between elements is dropped, so formatted and compact input parse to
//! deep-equal trees.

use std::collections::HashMap;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::SYNTHETIC_ROOT;
use crate::error::{Error, Result};
use crate::node::{new_element, new_node, NodeInner, NodeRef, XmlContent, XmlElement, XmlText};

/// XML parser that builds node trees.
pub struct XmlParser;

impl XmlParser {
    /// Creates a new parser.
    pub fn new() -> Self {
        XmlParser
    }

    /// Parses XML from a string. The returned node is a synthetic root whose
    /// children are the document's top-level nodes.
    pub fn parse_str(&self, xml: &str) -> Result<NodeRef> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;

        let root = new_element(SYNTHETIC_ROOT, HashMap::new());
        let mut node_stack: Vec<NodeRef> = vec![root.clone()];
        let mut current_text: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    Self::flush_text(&mut current_text, &node_stack);

                    let element = self.parse_element(e, &reader)?;
                    let node = new_node(XmlContent::Element(element));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child(parent, node.clone());
                    }
                    node_stack.push(node);
                }
                Ok(Event::End(_)) => {
                    Self::flush_text(&mut current_text, &node_stack);
                    if node_stack.len() <= 1 {
                        return Err(Error::Parse("unexpected closing tag".to_string()));
                    }
                    node_stack.pop();
                }
                Ok(Event::Empty(ref e)) => {
                    Self::flush_text(&mut current_text, &node_stack);

                    let element = self.parse_element(e, &reader)?;
                    let node = new_node(XmlContent::Element(element));
                    if let Some(parent) = node_stack.last() {
                        NodeInner::add_child(parent, node);
                    }
                }
                Ok(Event::Text(e)) => {
                    let raw =
                        std::str::from_utf8(e.as_ref()).map_err(|e| Error::Parse(e.to_string()))?;
                    let text = unescape(raw).map_err(|e| Error::Parse(e.to_string()))?;
                    Self::accumulate_text(&mut current_text, &text);
                }
                Ok(Event::CData(ref e)) => {
                    let text = String::from_utf8_lossy(e.as_ref());
                    Self::accumulate_text(&mut current_text, &text);
                }
                Ok(Event::Eof) => {
                    if node_stack.len() > 1 {
                        return Err(Error::Parse("unexpected end of document".to_string()));
                    }
                    break;
                }
                // Declarations, comments, PIs and DOCTYPE carry no DIDL-Lite
                // content.
                Ok(_) => {}
                Err(e) => return Err(Error::Xml(e)),
            }
        }

        Ok(root)
    }

    /// Parses an element's name and attributes.
    fn parse_element(&self, e: &BytesStart, reader: &Reader<&[u8]>) -> Result<XmlElement> {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let mut attributes = HashMap::new();
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("Attribute error: {}", e)))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            attributes.insert(key, value);
        }

        Ok(XmlElement::new(name, attributes))
    }

    /// Appends normalized text to the accumulator, collapsing whitespace runs.
    fn accumulate_text(current_text: &mut Option<String>, text: &str) {
        let last_is_ws = current_text.as_deref().is_none_or(|p| p.ends_with(' '));
        let mut last_was_ws = last_is_ws;
        let mut has_non_ws = false;
        let mut result = String::new();

        for c in text.chars() {
            if c.is_whitespace() {
                if !last_was_ws {
                    result.push(' ');
                    last_was_ws = true;
                }
            } else {
                result.push(c);
                last_was_ws = false;
                has_non_ws = true;
            }
        }

        if has_non_ws {
            match current_text {
                Some(existing) => existing.push_str(&result),
                None => *current_text = Some(result),
            }
        }
    }

    /// Emits the accumulated text as a child of the current element, dropping
    /// whitespace-only runs.
    fn flush_text(current_text: &mut Option<String>, node_stack: &[NodeRef]) {
        if let Some(text) = current_text.take() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                let text_node = new_node(XmlContent::Text(XmlText::new(trimmed)));
                if let Some(parent) = node_stack.last() {
                    NodeInner::add_child(parent, text_node);
                }
            }
        }
    }
}

impl Default for XmlParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses XML from a string.
pub fn parse_str(xml: &str) -> Result<NodeRef> {
    XmlParser::new().parse_str(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::XmlContent;

    #[test]
    fn test_parse_simple_xml() {
        let xml = r#"<root><child>text</child></root>"#;
        let root = parse_str(xml).unwrap();

        let root_borrowed = root.borrow();
        assert_eq!(root_borrowed.child_count(), 1);
        assert_eq!(root_borrowed.qname(), Some(SYNTHETIC_ROOT));

        let doc_elem = root_borrowed.children()[0].clone();
        assert_eq!(doc_elem.borrow().qname(), Some("root"));
    }

    #[test]
    fn test_parse_with_attributes() {
        let xml = r#"<item id="18" restricted="0">content</item>"#;
        let root = parse_str(xml).unwrap();

        let root_borrowed = root.borrow();
        let item = root_borrowed.children()[0].clone();
        let item_borrowed = item.borrow();
        let element = item_borrowed.element().unwrap();

        assert_eq!(element.qname(), "item");
        assert_eq!(element.attribute("id"), Some("18"));
        assert_eq!(element.attribute("restricted"), Some("0"));
    }

    #[test]
    fn test_whitespace_normalization() {
        let xml = "<root>  hello \n  world  </root>";
        let root = parse_str(xml).unwrap();

        let root_borrowed = root.borrow();
        let elem = root_borrowed.children()[0].clone();
        let elem_borrowed = elem.borrow();
        assert_eq!(elem_borrowed.child_count(), 1);

        let text = elem_borrowed.children()[0].clone();
        let text_borrowed = text.borrow();
        match text_borrowed.content() {
            XmlContent::Text(t) => assert_eq!(t.text(), "hello world"),
            _ => panic!("Expected text node"),
        }
    }

    #[test]
    fn test_interelement_whitespace_dropped() {
        let compact = r#"<item><dc:title>A</dc:title><res protocolInfo="x" /></item>"#;
        let formatted = "<item>\n  <dc:title>A</dc:title>\n  <res protocolInfo=\"x\" />\n</item>";
        let a = parse_str(compact).unwrap();
        let b = parse_str(formatted).unwrap();
        assert!(crate::node::deep_equal(&a, &b));
    }

    #[test]
    fn test_empty_element() {
        let xml = r#"<root><empty /></root>"#;
        let root = parse_str(xml).unwrap();

        let root_borrowed = root.borrow();
        let elem = root_borrowed.children()[0].clone();
        let elem_borrowed = elem.borrow();
        assert_eq!(elem_borrowed.child_count(), 1);

        let empty = elem_borrowed.children()[0].clone();
        assert_eq!(empty.borrow().qname(), Some("empty"));
        assert_eq!(empty.borrow().child_count(), 0);
    }

    #[test]
    fn test_entity_unescaping() {
        let xml = r#"<root attr="a &amp; b">x &lt; y</root>"#;
        let root = parse_str(xml).unwrap();

        let root_borrowed = root.borrow();
        let elem = root_borrowed.children()[0].clone();
        let elem_borrowed = elem.borrow();
        assert_eq!(elem_borrowed.element().unwrap().attribute("attr"), Some("a & b"));

        let text = elem_borrowed.children()[0].clone();
        let text_borrowed = text.borrow();
        match text_borrowed.content() {
            XmlContent::Text(t) => assert_eq!(t.text(), "x < y"),
            _ => panic!("Expected text node"),
        }
    }

    #[test]
    fn test_unterminated_xml_fails() {
        assert!(parse_str("<root><child>oops</root>").is_err());
        assert!(parse_str("<root>").is_err());
        assert!(parse_str("<root").is_err());
    }

    #[test]
    fn test_reader_error_surfaces_as_xml_variant() {
        match parse_str("<a></b>") {
            Err(Error::Xml(_)) => {}
            other => panic!("expected an XML error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_top_level_nodes() {
        let xml = r#"<a>1</a><b>2</b>"#;
        let root = parse_str(xml).unwrap();
        assert_eq!(root.borrow().child_count(), 2);
    }
}
