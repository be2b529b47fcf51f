//! XML printer that outputs node trees.
//!
//! Output is deterministic: attributes are sorted by name, special characters
//! become entities and childless elements self-close. Structurally equal
//! trees therefore serialize to identical bytes, which the engine's
//! atomicity contract relies on in tests.

use std::io::Write;

use super::SYNTHETIC_ROOT;
use crate::node::{NodeRef, XmlContent};

/// XML printer that outputs node trees.
pub struct XmlPrinter<W: Write> {
    writer: W,
}

impl<W: Write> XmlPrinter<W> {
    /// Creates a new XML printer.
    pub fn new(writer: W) -> Self {
        XmlPrinter { writer }
    }

    /// Prints a node tree with an XML declaration. A synthetic root is
    /// skipped; its children are printed in order.
    pub fn print(&mut self, root: &NodeRef) -> std::io::Result<()> {
        write!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        self.print_fragment(root)?;
        self.writer.flush()
    }

    /// Prints a node tree without an XML declaration.
    pub fn print_fragment(&mut self, node: &NodeRef) -> std::io::Result<()> {
        let borrowed = node.borrow();

        match borrowed.content() {
            XmlContent::Text(text) => {
                write!(self.writer, "{}", to_entities(text.text()))?;
            }
            XmlContent::Element(element) => {
                if element.qname() == SYNTHETIC_ROOT {
                    for child in borrowed.children() {
                        self.print_fragment(child)?;
                    }
                    return Ok(());
                }

                write!(self.writer, "<{}", element.qname())?;
                let mut attr_names: Vec<&String> = element.attributes().keys().collect();
                attr_names.sort();
                for name in attr_names {
                    write!(
                        self.writer,
                        " {}=\"{}\"",
                        name,
                        to_entities(&element.attributes()[name])
                    )?;
                }

                if borrowed.child_count() == 0 {
                    write!(self.writer, " />")?;
                } else {
                    write!(self.writer, ">")?;
                    for child in borrowed.children() {
                        self.print_fragment(child)?;
                    }
                    write!(self.writer, "</{}>", element.qname())?;
                }
            }
        }

        Ok(())
    }
}

/// Converts special characters to XML entities.
fn to_entities(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\'' => result.push_str("&apos;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Prints a node tree to a string, declaration included.
pub fn print_to_string(root: &NodeRef) -> std::io::Result<String> {
    let mut output = Vec::new();
    {
        let mut printer = XmlPrinter::new(&mut output);
        printer.print(root)?;
    }
    Ok(String::from_utf8_lossy(&output).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::deep_equal;
    use crate::xml::parse_str;

    #[test]
    fn test_print_simple() {
        let root = parse_str("<root>text</root>").unwrap();
        let output = print_to_string(&root).unwrap();

        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(output.contains("<root>text</root>"));
    }

    #[test]
    fn test_print_sorted_attributes() {
        let root = parse_str(r#"<item restricted="0" id="18" parentID="13" />"#).unwrap();
        let output = print_to_string(&root).unwrap();
        assert!(output.contains(r#"<item id="18" parentID="13" restricted="0" />"#));
    }

    #[test]
    fn test_print_empty_element() {
        let root = parse_str("<root><empty /></root>").unwrap();
        let output = print_to_string(&root).unwrap();
        assert!(output.contains("<empty />"));
    }

    #[test]
    fn test_entity_encoding() {
        let root = parse_str(r#"<root attr="&quot;x&quot;">a &amp; b</root>"#).unwrap();
        let output = print_to_string(&root).unwrap();
        assert!(output.contains("attr=\"&quot;x&quot;\""));
        assert!(output.contains("a &amp; b"));
    }

    #[test]
    fn test_round_trip() {
        let xml = r#"<item id="18"><dc:title>Try a little tenderness</dc:title><res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/x.mp3</res></item>"#;
        let tree1 = parse_str(xml).unwrap();
        let output1 = print_to_string(&tree1).unwrap();
        let tree2 = parse_str(&output1).unwrap();
        assert!(deep_equal(&tree1, &tree2));

        // A second round trip is byte-stable.
        let output2 = print_to_string(&tree2).unwrap();
        assert_eq!(output1, output2);
    }
}
