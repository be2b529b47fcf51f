//! The fragment patch engine.
//!
//! Applies caller-supplied pairs of "current" / "new" XML fragments to a
//! live DIDL-Lite object. Every pair is verified against the object's real
//! state, diffed, checked against the read-only and required property
//! tables, and staged on a scratch deep copy of the owning document with the
//! whole document re-validated after every single edit. Only if every pair
//! is accepted does the live object get swapped for the patched copy; any
//! failure discards the scratch copy and leaves the object untouched.

mod changes;
mod properties;

pub use changes::{get_toplevel_changes, is_any_change_read_only, NodeDiff};
pub use properties::{is_read_only, is_required};

use tracing::{debug, trace};

use crate::document::{DocNode, Document};
use crate::error::{FragmentError, FragmentResult};
use crate::node::{deep_copy, deep_equal, find_node, NodeInner, NodeRef};
use crate::validate::{DidlLiteValidator, DocumentValidator};

/// Envelope wrapped around each fragment before parsing. Declaring the four
/// DIDL-Lite namespaces makes multiple sibling elements syntactically valid
/// and their usual prefixes resolvable.
const FRAGMENT_ENVELOPE_OPEN: &str = concat!(
    "<DIDLLiteFragment",
    " xmlns:dc=\"http://purl.org/dc/elements/1.1/\"",
    " xmlns=\"urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/\"",
    " xmlns:upnp=\"urn:schemas-upnp-org:metadata-1-0/upnp/\"",
    " xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\"",
    ">"
);
const FRAGMENT_ENVELOPE_CLOSE: &str = "</DIDLLiteFragment>";

/// Applies fragment pairs to a live object, using the built-in DIDL-Lite
/// validator. See [`FragmentApplier::apply`].
pub fn apply_fragments<S, T>(
    object: &mut DocNode,
    current_fragments: &[S],
    new_fragments: &[T],
) -> FragmentResult
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    FragmentApplier::new().apply(object, current_fragments, new_fragments)
}

/// Fragment applier carrying the validator run after every staged edit.
pub struct FragmentApplier<V = DidlLiteValidator> {
    validator: V,
}

impl FragmentApplier<DidlLiteValidator> {
    /// Creates an applier with the built-in DIDL-Lite validator.
    pub fn new() -> Self {
        FragmentApplier {
            validator: DidlLiteValidator::new(),
        }
    }
}

impl Default for FragmentApplier<DidlLiteValidator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: DocumentValidator> FragmentApplier<V> {
    /// Creates an applier with a caller-supplied validator.
    pub fn with_validator(validator: V) -> Self {
        FragmentApplier { validator }
    }

    /// Applies parallel arrays of current/new fragment pairs to the live
    /// object, all or nothing.
    ///
    /// On success the object's node is replaced by the fully patched copy
    /// and the pairing in `object` is updated to point at it. On any failure
    /// the scratch copy is discarded, the live document is untouched and the
    /// first failure's code is returned.
    pub fn apply<S, T>(
        &self,
        object: &mut DocNode,
        current_fragments: &[S],
        new_fragments: &[T],
    ) -> FragmentResult
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        if current_fragments.len() != new_fragments.len() {
            return Err(FragmentError::Mismatch);
        }
        if current_fragments.is_empty() {
            return Err(FragmentError::CurrentInvalid);
        }

        debug!(fragments = current_fragments.len(), "applying fragment set");

        let original = DocNode {
            doc: object.doc.clone(),
            node: object.node.clone(),
        };

        let modified_doc = object.doc.deep_copy();
        let modified_node = modified_doc
            .find_node(&object.node)
            .ok_or(FragmentError::UnknownError)?;
        let mut modified = DocNode {
            doc: modified_doc,
            node: modified_node,
        };

        for (index, (current, new)) in current_fragments
            .iter()
            .zip(new_fragments.iter())
            .enumerate()
        {
            trace!(index, "checking fragment pair");
            self.apply_pair(&original, &mut modified, current.as_ref(), new.as_ref())?;
        }

        // Final swap: the live node leaves its document, the patched node
        // takes its place, and the caller's pairing follows it.
        let patched = modified.node;
        NodeInner::unlink(&patched);
        if !NodeInner::replace_node(&object.node, patched.clone()) {
            return Err(FragmentError::UnknownError);
        }
        object.node = patched;

        debug!("fragment set committed");
        Ok(())
    }

    /// Runs the full per-pair state machine: wrap and parse both fragments,
    /// guard the mandatory leaf properties, verify the current fragment
    /// against the original document, then reconcile and stage edits on the
    /// scratch copy.
    fn apply_pair(
        &self,
        original: &DocNode,
        modified: &mut DocNode,
        current_fragment: &str,
        new_fragment: &str,
    ) -> FragmentResult {
        let current_children =
            parse_fragment(current_fragment).map_err(|_| FragmentError::CurrentBadXml)?;
        let new_children = parse_fragment(new_fragment).map_err(|_| FragmentError::NewBadXml)?;

        check_mandatory_leaf(&current_children, &new_children)?;
        verify_current_fragment(original, &current_children)?;
        self.reconcile(modified, &current_children, &new_children)
    }

    /// Lock-step reconciliation of the two parsed fragment child lists,
    /// staging one edit at a time on the scratch copy.
    fn reconcile(
        &self,
        modified: &mut DocNode,
        current_children: &[NodeRef],
        new_children: &[NodeRef],
    ) -> FragmentResult {
        let mut last_sibling: Option<NodeRef> = None;
        let paired = current_children.len().min(new_children.len());

        for (current, new) in current_children[..paired]
            .iter()
            .zip(new_children[..paired].iter())
        {
            last_sibling = Some(new.clone());

            if deep_equal(current, new) {
                // Context node, not a change.
                continue;
            }

            let current_tag = current.borrow().qname().map(str::to_string);
            let new_tag = new.borrow().qname().map(str::to_string);
            if current_tag != new_tag {
                return Err(FragmentError::NewInvalid);
            }

            self.stage_modification(modified, current, new)?;
        }

        // Insertion anchor for additions; without one, fall back to the
        // object's last existing child. An object always carries at least
        // its mandatory title and class elements, so having none at all is a
        // structural inconsistency.
        let mut last_sibling = match last_sibling {
            Some(node) => node,
            None => modified.last_child().ok_or(FragmentError::UnknownError)?,
        };

        for current in &current_children[paired..] {
            self.stage_removal(modified, current)?;
        }

        for new in &new_children[paired..] {
            last_sibling = self.stage_addition(modified, new, &last_sibling)?;
        }

        Ok(())
    }

    /// Replaces the node matching `current` in the scratch copy with a copy
    /// of `new`, then re-validates the whole document.
    fn stage_modification(
        &self,
        modified: &mut DocNode,
        current: &NodeRef,
        new: &NodeRef,
    ) -> FragmentResult {
        if is_any_change_read_only(current, new) {
            return Err(FragmentError::ReadonlyTag);
        }

        // The match target is the untouched original position, resolved in
        // the modified copy.
        let target = find_node(&modified.node, current).ok_or(FragmentError::UnknownError)?;
        let replacement = deep_copy(new);

        trace!(element = ?new.borrow().qname(), "staging modification");
        let replacing_object = std::rc::Rc::ptr_eq(&target, &modified.node);
        if !NodeInner::replace_node(&target, replacement.clone()) {
            return Err(FragmentError::UnknownError);
        }
        if replacing_object {
            modified.node = replacement;
        }

        if !self.validator.validate(&modified.doc) {
            return Err(FragmentError::NewInvalid);
        }
        Ok(())
    }

    /// Unlinks the node matching `current` from the scratch copy, then
    /// re-validates.
    fn stage_removal(&self, modified: &mut DocNode, current: &NodeRef) -> FragmentResult {
        let tag = current.borrow().qname().map(str::to_string);
        if is_read_only(tag.as_deref(), None) {
            return Err(FragmentError::ReadonlyTag);
        }
        // Attribute-level requirement is conditional on the element being
        // present, so whole-element removal only checks the element itself.
        if is_required(tag.as_deref(), None) {
            return Err(FragmentError::RequiredTag);
        }

        let target = find_node(&modified.node, current).ok_or(FragmentError::UnknownError)?;
        trace!(element = ?tag, "staging removal");
        NodeInner::unlink(&target);

        // Removal-time validation failure reports RequiredTag, unlike
        // modification and addition which report NewInvalid. Carried over
        // from the original protocol implementation; intent unverified
        // there, preserved here for compatibility.
        if !self.validator.validate(&modified.doc) {
            return Err(FragmentError::RequiredTag);
        }
        Ok(())
    }

    /// Inserts a copy of `new` after the anchor in the scratch copy, then
    /// re-validates. Returns the inserted node as the next anchor.
    fn stage_addition(
        &self,
        modified: &mut DocNode,
        new: &NodeRef,
        last_sibling: &NodeRef,
    ) -> std::result::Result<NodeRef, FragmentError> {
        let tag = new.borrow().qname().map(str::to_string);
        if is_read_only(tag.as_deref(), None) {
            return Err(FragmentError::ReadonlyTag);
        }

        // The anchor may still live in the new-fragment's temporary
        // document; resolve it into the scratch copy first.
        let anchor = if modified.doc.contains(last_sibling) {
            last_sibling.clone()
        } else {
            find_node(&modified.node, last_sibling).ok_or(FragmentError::UnknownError)?
        };

        let copied = deep_copy(new);
        trace!(element = ?tag, "staging addition");
        if !NodeInner::insert_after(&anchor, copied.clone()) {
            return Err(FragmentError::UnknownError);
        }

        if !self.validator.validate(&modified.doc) {
            return Err(FragmentError::NewInvalid);
        }
        Ok(copied)
    }
}

/// Wraps a fragment in the namespace-declaring envelope and parses it,
/// returning the envelope's children. Fails if the text is not well-formed
/// or yields no envelope.
fn parse_fragment(fragment: &str) -> crate::error::Result<Vec<NodeRef>> {
    let wrapped = format!(
        "{}{}{}",
        FRAGMENT_ENVELOPE_OPEN, fragment, FRAGMENT_ENVELOPE_CLOSE
    );
    let doc = Document::parse_str(&wrapped)?;
    let root = doc.root().borrow();
    let envelope = root
        .children()
        .first()
        .ok_or_else(|| crate::error::Error::Parse("fragment yielded no content".to_string()))?;
    let children = envelope.borrow().children().to_vec();
    Ok(children)
}

/// Title/class emptiness guard: a fragment whose current state is one of the
/// two globally mandatory leaf properties may not leave the new state absent
/// or empty.
fn check_mandatory_leaf(
    current_children: &[NodeRef],
    new_children: &[NodeRef],
) -> FragmentResult {
    let Some(first) = current_children.first() else {
        return Ok(());
    };
    let guards = {
        let node = first.borrow();
        match node.qname() {
            Some(name) => name.contains("title") || name.contains("class"),
            None => false,
        }
    };
    if !guards {
        return Ok(());
    }

    let non_empty = new_children.first().is_some_and(|node| {
        let node = node.borrow();
        node.content().is_element() && node.child_count() > 0
    });
    if non_empty {
        Ok(())
    } else {
        Err(FragmentError::RequiredTag)
    }
}

/// Anti-tampering check: the current fragment must be an exact,
/// position-preserving match for a run of siblings inside the true original
/// document. A fragment with no content is a pure addition and trivially
/// passes.
fn verify_current_fragment(original: &DocNode, current_children: &[NodeRef]) -> FragmentResult {
    let Some(first) = current_children.first() else {
        return Ok(());
    };

    let mut matched =
        find_node(&original.node, first).ok_or(FragmentError::CurrentInvalid)?;

    for current in &current_children[1..] {
        let sibling =
            NodeInner::right_sibling(&matched).ok_or(FragmentError::CurrentInvalid)?;
        if !deep_equal(current, &sibling) {
            return Err(FragmentError::CurrentInvalid);
        }
        matched = sibling;
    }

    Ok(())
}
