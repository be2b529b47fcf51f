//! Document and document/node pairing types.
//!
//! A [`Document`] owns a tree of nodes under a synthetic root. During a
//! fragment apply operation two documents exist side by side: the live
//! original (read-only) and a scratch deep copy that staged edits mutate. The
//! same logical node has a different [`NodeRef`] in each copy, so nodes are
//! re-located across documents by structural match, never by identity.

use std::rc::Rc;

use crate::error::Result;
use crate::node::{self, NodeInner, NodeRef};
use crate::xml;

/// An XML document owning a tree of nodes.
///
/// Cloning a `Document` is shallow (both handles see the same tree); use
/// [`Document::deep_copy`] for an independent scratch copy.
#[derive(Clone)]
pub struct Document {
    root: NodeRef,
}

impl Document {
    /// Parses a document from XML text.
    pub fn parse_str(text: &str) -> Result<Document> {
        Ok(Document {
            root: xml::parse_str(text)?,
        })
    }

    /// Wraps an already-built tree. The node becomes the document's synthetic
    /// root; its children are the document's top-level nodes.
    pub fn from_root(root: NodeRef) -> Document {
        Document { root }
    }

    /// Returns the synthetic root node.
    pub fn root(&self) -> &NodeRef {
        &self.root
    }

    /// Returns a fully independent deep copy of this document.
    pub fn deep_copy(&self) -> Document {
        Document {
            root: node::deep_copy(&self.root),
        }
    }

    /// Returns true if the node's parent chain ends at this document's root.
    pub fn contains(&self, node_ref: &NodeRef) -> bool {
        let mut current = node_ref.clone();
        loop {
            if Rc::ptr_eq(&current, &self.root) {
                return true;
            }
            let parent = current.borrow().parent().upgrade();
            match parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Structural search for the first node in this document deep-equal to
    /// `needle`.
    pub fn find_node(&self, needle: &NodeRef) -> Option<NodeRef> {
        node::find_node(&self.root, needle)
    }

    /// Finds the DIDL-Lite object (`item` or `container`) with the given
    /// `@id` attribute.
    pub fn object_by_id(&self, id: &str) -> Option<NodeRef> {
        fn walk(node_ref: &NodeRef, id: &str) -> Option<NodeRef> {
            {
                let node = node_ref.borrow();
                if let Some(element) = node.element() {
                    let local = element.local_name();
                    if (local == "item" || local == "container")
                        && element.attribute("id") == Some(id)
                    {
                        return Some(node_ref.clone());
                    }
                }
            }
            let children = node_ref.borrow().children().to_vec();
            children.iter().find_map(|child| walk(child, id))
        }
        walk(&self.root, id)
    }

    /// Serializes the document, declaration included.
    pub fn to_xml(&self) -> Result<String> {
        Ok(xml::print_to_string(&self.root)?)
    }
}

/// A node together with the document it lives in.
///
/// Invariant: `node` must resolve inside `doc`; when the node is unlinked and
/// re-linked elsewhere the pairing must be updated to the new location.
#[derive(Clone)]
pub struct DocNode {
    /// The owning document.
    pub doc: Document,
    /// The node inside `doc`.
    pub node: NodeRef,
}

impl DocNode {
    /// Pairs a node with its owning document. Returns None if the node does
    /// not live in the document.
    pub fn new(doc: Document, node: NodeRef) -> Option<DocNode> {
        if doc.contains(&node) {
            Some(DocNode { doc, node })
        } else {
            None
        }
    }

    /// Returns the node's last child, if any.
    pub fn last_child(&self) -> Option<NodeRef> {
        NodeInner::last_child(&self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::deep_equal;

    const DOC: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/"><item id="18" parentID="13" restricted="0"><dc:title>A title</dc:title><upnp:class>object.item</upnp:class></item></DIDL-Lite>"#;

    #[test]
    fn test_object_by_id() {
        let doc = Document::parse_str(DOC).unwrap();
        let item = doc.object_by_id("18").unwrap();
        assert_eq!(item.borrow().qname(), Some("item"));
        assert!(doc.object_by_id("19").is_none());
    }

    #[test]
    fn test_deep_copy_is_independent() {
        let doc = Document::parse_str(DOC).unwrap();
        let copy = doc.deep_copy();
        assert!(deep_equal(doc.root(), copy.root()));

        let item = copy.object_by_id("18").unwrap();
        let title = item.borrow().children()[0].clone();
        NodeInner::unlink(&title);
        assert!(!deep_equal(doc.root(), copy.root()));
        assert!(doc.object_by_id("18").is_some());
    }

    #[test]
    fn test_contains() {
        let doc = Document::parse_str(DOC).unwrap();
        let copy = doc.deep_copy();

        let item = doc.object_by_id("18").unwrap();
        assert!(doc.contains(&item));
        assert!(!copy.contains(&item));

        let copied_item = copy.object_by_id("18").unwrap();
        assert!(copy.contains(&copied_item));
    }

    #[test]
    fn test_doc_node_pairing() {
        let doc = Document::parse_str(DOC).unwrap();
        let other = doc.deep_copy();
        let item = doc.object_by_id("18").unwrap();

        assert!(DocNode::new(doc, item.clone()).is_some());
        assert!(DocNode::new(other, item).is_none());
    }

    #[test]
    fn test_find_node_across_copies() {
        let doc = Document::parse_str(DOC).unwrap();
        let copy = doc.deep_copy();
        let item = doc.object_by_id("18").unwrap();

        let located = copy.find_node(&item).unwrap();
        assert!(copy.contains(&located));
        assert!(deep_equal(&located, &item));
    }
}
