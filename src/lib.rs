//! didl-fragment - DIDL-Lite XML fragment patching
//!
//! This library implements the UPnP ContentDirectory fragment update
//! protocol over DIDL-Lite metadata documents: a caller supplies parallel
//! lists of "current" and "new" XML fragment snippets describing how a live
//! object should change, and the engine verifies, diffs, validates and
//! applies them transactionally.
//!
//! # Overview
//!
//! Each current/new pair is parsed inside a namespace-declaring envelope,
//! checked against the object's real state (a forged "current" snippet is
//! rejected), classified position by position into modifications, removals
//! and additions, and screened against the read-only and required property
//! tables. Accepted edits are staged on a deep copy of the owning document
//! with the whole copy re-validated after every single edit. The live object
//! is swapped for the patched copy only if every pair was accepted, so
//! concurrent readers never observe a partially patched object.
//!
//! # Example
//!
//! ```
//! use didl_fragment::{apply_fragments, DocNode, Document};
//!
//! let xml = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"
//!     xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
//!     xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/">
//!   <item id="18" parentID="13" restricted="0">
//!     <dc:title>Old title</dc:title>
//!     <upnp:class>object.item.audioItem.musicTrack</upnp:class>
//!   </item>
//! </DIDL-Lite>"#;
//!
//! let doc = Document::parse_str(xml)?;
//! let node = doc.object_by_id("18").unwrap();
//! let mut object = DocNode::new(doc, node).unwrap();
//!
//! apply_fragments(
//!     &mut object,
//!     &["<dc:title>Old title</dc:title>"],
//!     &["<dc:title>New title</dc:title>"],
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod error;
pub mod fragment;
pub mod node;
pub mod validate;
pub mod xml;

// Re-export commonly used types
pub use document::{DocNode, Document};
pub use error::{Error, FragmentError, FragmentResult, Result};
pub use fragment::{
    apply_fragments, get_toplevel_changes, is_any_change_read_only, is_read_only, is_required,
    FragmentApplier, NodeDiff,
};
pub use node::{
    attributes_map, deep_copy, deep_equal, find_node, local_name, new_element, new_node, new_text,
    NodeInner, NodeRef, XmlContent, XmlElement, XmlText,
};
pub use validate::{DidlLiteValidator, DocumentValidator};
pub use xml::{parse_str, print_to_string, XmlParser, XmlPrinter};
