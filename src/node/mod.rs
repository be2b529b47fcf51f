//! Node structures for XML tree representation.
//!
//! An XML document is a tree of reference-counted nodes. Each node owns its
//! ordered children and keeps a weak pointer to its parent plus its position
//! among its siblings, so unlinking and inserting update all bookkeeping in
//! one place and no node is ever freed manually.

mod content;

pub use content::{local_name, XmlContent, XmlElement, XmlText};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// A reference-counted pointer to a node.
pub type NodeRef = Rc<RefCell<NodeInner>>;

/// The inner data of a node in the tree.
#[derive(Debug)]
pub struct NodeInner {
    /// Child nodes.
    children: Vec<NodeRef>,
    /// XML content of this node.
    content: XmlContent,
    /// Weak reference to parent node.
    parent: Weak<RefCell<NodeInner>>,
    /// Zero-based position among siblings (-1 for an unlinked or root node).
    child_pos: i32,
}

/// Creates a new unlinked node with the given content.
pub fn new_node(content: XmlContent) -> NodeRef {
    Rc::new(RefCell::new(NodeInner {
        children: Vec::new(),
        content,
        parent: Weak::new(),
        child_pos: -1,
    }))
}

/// Creates a new unlinked element node.
pub fn new_element(name: &str, attributes: HashMap<String, String>) -> NodeRef {
    new_node(XmlContent::Element(XmlElement::new(
        name.to_string(),
        attributes,
    )))
}

/// Creates a new unlinked text node.
pub fn new_text(text: &str) -> NodeRef {
    new_node(XmlContent::Text(XmlText::new(text)))
}

impl NodeInner {
    /// Returns the content of this node.
    pub fn content(&self) -> &XmlContent {
        &self.content
    }

    /// Returns the element content, if this is an element node.
    pub fn element(&self) -> Option<&XmlElement> {
        self.content.as_element()
    }

    /// Returns the qualified element name, if this is an element node.
    pub fn qname(&self) -> Option<&str> {
        self.content.as_element().map(XmlElement::qname)
    }

    /// Returns the number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Returns a reference to the child at the given index.
    pub fn child(&self, index: usize) -> Option<&NodeRef> {
        self.children.get(index)
    }

    /// Returns the children as a slice.
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns a weak reference to the parent.
    pub fn parent(&self) -> &Weak<RefCell<NodeInner>> {
        &self.parent
    }

    /// Returns the child position (0-based index among siblings, -1 when
    /// unlinked).
    pub fn child_pos(&self) -> i32 {
        self.child_pos
    }
}

/// Helper functions that work with NodeRef.
impl NodeInner {
    /// Appends a child node.
    pub fn add_child(parent_ref: &NodeRef, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = parent_ref.borrow().children.len() as i32;
        }
        parent_ref.borrow_mut().children.push(child_ref);
    }

    /// Inserts a child at the given index.
    pub fn insert_child_at(parent_ref: &NodeRef, index: usize, child_ref: NodeRef) {
        {
            let mut child = child_ref.borrow_mut();
            child.parent = Rc::downgrade(parent_ref);
            child.child_pos = index as i32;
        }
        {
            let mut parent = parent_ref.borrow_mut();
            parent.children.insert(index, child_ref);
            for i in (index + 1)..parent.children.len() {
                parent.children[i].borrow_mut().child_pos = i as i32;
            }
        }
    }

    /// Removes the child at the given index, leaving it unlinked.
    pub fn remove_child(parent_ref: &NodeRef, index: usize) {
        let removed = {
            let mut parent = parent_ref.borrow_mut();
            if index >= parent.children.len() {
                return;
            }
            let removed = parent.children.remove(index);
            for i in index..parent.children.len() {
                parent.children[i].borrow_mut().child_pos = i as i32;
            }
            removed
        };
        let mut removed = removed.borrow_mut();
        removed.parent = Weak::new();
        removed.child_pos = -1;
    }

    /// Detaches a node from its parent, if it has one. The node keeps its
    /// children and can be re-linked elsewhere.
    pub fn unlink(node_ref: &NodeRef) {
        let (parent, pos) = {
            let node = node_ref.borrow();
            (node.parent.upgrade(), node.child_pos)
        };
        if let Some(parent) = parent {
            if pos >= 0 {
                Self::remove_child(&parent, pos as usize);
            }
        }
    }

    /// Replaces `old_ref` with `new_ref` at the same position under the same
    /// parent. `old_ref` is left unlinked. Returns false if `old_ref` has no
    /// parent.
    pub fn replace_node(old_ref: &NodeRef, new_ref: NodeRef) -> bool {
        let (parent, pos) = {
            let old = old_ref.borrow();
            (old.parent.upgrade(), old.child_pos)
        };
        let Some(parent) = parent else {
            return false;
        };
        if pos < 0 {
            return false;
        }
        let pos = pos as usize;
        {
            let mut new = new_ref.borrow_mut();
            new.parent = Rc::downgrade(&parent);
            new.child_pos = pos as i32;
        }
        let displaced = {
            let mut parent = parent.borrow_mut();
            std::mem::replace(&mut parent.children[pos], new_ref)
        };
        let mut displaced = displaced.borrow_mut();
        displaced.parent = Weak::new();
        displaced.child_pos = -1;
        true
    }

    /// Inserts `node_ref` as the next sibling of `anchor_ref`. Returns false
    /// if the anchor has no parent.
    pub fn insert_after(anchor_ref: &NodeRef, node_ref: NodeRef) -> bool {
        let (parent, pos) = {
            let anchor = anchor_ref.borrow();
            (anchor.parent.upgrade(), anchor.child_pos)
        };
        let Some(parent) = parent else {
            return false;
        };
        if pos < 0 {
            return false;
        }
        Self::insert_child_at(&parent, pos as usize + 1, node_ref);
        true
    }

    /// Gets the right sibling of a node.
    pub fn right_sibling(node_ref: &NodeRef) -> Option<NodeRef> {
        let node = node_ref.borrow();
        if node.child_pos < 0 {
            return None;
        }
        let parent = node.parent.upgrade()?;
        let parent = parent.borrow();
        parent.children.get(node.child_pos as usize + 1).cloned()
    }

    /// Gets the last child of a node.
    pub fn last_child(node_ref: &NodeRef) -> Option<NodeRef> {
        node_ref.borrow().children.last().cloned()
    }
}

/// Recursive structural equality: content, child count and every child in
/// order.
pub fn deep_equal(a: &NodeRef, b: &NodeRef) -> bool {
    if Rc::ptr_eq(a, b) {
        return true;
    }
    let a = a.borrow();
    let b = b.borrow();
    if !a.content.content_equals(&b.content) {
        return false;
    }
    if a.children.len() != b.children.len() {
        return false;
    }
    a.children
        .iter()
        .zip(b.children.iter())
        .all(|(ca, cb)| deep_equal(ca, cb))
}

/// Deep clone of a subtree. The copy is unlinked and safe to insert anywhere,
/// including into another document.
pub fn deep_copy(node_ref: &NodeRef) -> NodeRef {
    let (content, children) = {
        let node = node_ref.borrow();
        (node.content.clone(), node.children.clone())
    };
    let copied = new_node(content);
    for child in children {
        NodeInner::add_child(&copied, deep_copy(&child));
    }
    copied
}

/// Searches `haystack`'s subtree (including `haystack` itself) in document
/// order for the first node deep-equal to `needle`.
pub fn find_node(haystack: &NodeRef, needle: &NodeRef) -> Option<NodeRef> {
    if deep_equal(haystack, needle) {
        return Some(haystack.clone());
    }
    let children = haystack.borrow().children.clone();
    children
        .iter()
        .find_map(|child| find_node(child, needle))
}

/// Returns a copy of the node's attribute map; empty for text nodes.
pub fn attributes_map(node_ref: &NodeRef) -> HashMap<String, String> {
    match node_ref.borrow().content.as_element() {
        Some(element) => element.attributes().clone(),
        None => HashMap::new(),
    }
}
