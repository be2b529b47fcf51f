//! Toplevel change detection.
//!
//! Compares the attributes of two nodes with the same tag, without recursing
//! into children. The resulting diffs gate the read-only check before a
//! modification is staged; callers only test membership, so diff order is
//! insignificant.

use crate::node::{attributes_map, NodeRef};

use super::properties::is_read_only;

/// One top-level attribute-level discrepancy between a current node and a
/// new node of matching tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDiff {
    /// Qualified name of the element the change is on.
    pub element: String,
    /// The changed, added or removed attribute, if the change is
    /// attribute-level.
    pub attribute: Option<String>,
}

/// Computes the set of attributes that differ between `current` and `new` at
/// the top level: changed values, additions on `new` and removals from
/// `current`.
pub fn get_toplevel_changes(current: &NodeRef, new: &NodeRef) -> Vec<NodeDiff> {
    let Some(element) = new.borrow().qname().map(str::to_string) else {
        return Vec::new();
    };

    let mut remaining = attributes_map(current);
    let mut diffs = Vec::new();

    for (name, value) in attributes_map(new) {
        match remaining.remove(&name) {
            Some(current_value) if current_value == value => {}
            // Changed value or added attribute.
            _ => diffs.push(NodeDiff {
                element: element.clone(),
                attribute: Some(name),
            }),
        }
    }

    // Whatever is left was removed by the new node.
    for (name, _) in remaining {
        diffs.push(NodeDiff {
            element: element.clone(),
            attribute: Some(name),
        });
    }

    diffs
}

/// Returns true if any top-level change between the two nodes touches a
/// read-only property.
pub fn is_any_change_read_only(current: &NodeRef, new: &NodeRef) -> bool {
    get_toplevel_changes(current, new)
        .iter()
        .any(|diff| is_read_only(Some(&diff.element), diff.attribute.as_deref()))
}
