//! Document validation.
//!
//! The fragment engine re-validates the whole scratch document after every
//! staged edit. Validation itself is a collaborator: hosts with a real XSD
//! engine implement [`DocumentValidator`]; [`DidlLiteValidator`] is the
//! built-in default enforcing the structural DIDL-Lite rules the patch
//! protocol depends on.

use std::sync::OnceLock;

use rustc_hash::FxHashSet;

use crate::document::Document;
use crate::node::NodeRef;

/// Whole-document validity check, invoked once per staged edit.
pub trait DocumentValidator {
    /// Returns true if the document is valid.
    fn validate(&self, doc: &Document) -> bool;
}

/// Metadata elements allowed as children of a DIDL-Lite object. Elements
/// with a vendor prefix outside the `dc`/`upnp` namespaces are not checked
/// against this list.
const OBJECT_CHILDREN: &[&str] = &[
    "title",
    "class",
    "res",
    "desc",
    "item",
    "container",
    "creator",
    "artist",
    "actor",
    "author",
    "director",
    "producer",
    "publisher",
    "contributor",
    "genre",
    "album",
    "albumArtURI",
    "artistDiscographyURI",
    "lyricsURI",
    "relation",
    "description",
    "longDescription",
    "icon",
    "region",
    "rights",
    "date",
    "language",
    "playlist",
    "rating",
    "radioCallSign",
    "radioStationID",
    "radioBand",
    "channelNr",
    "channelName",
    "scheduledStartTime",
    "scheduledEndTime",
    "originalTrackNumber",
    "toc",
    "userAnnotation",
    "writeStatus",
    "searchClass",
    "createClass",
    "storageTotal",
    "storageUsed",
    "storageFree",
    "storageMaxPartition",
    "storageMedium",
    "playbackCount",
    "lastPlaybackTime",
    "lastPlaybackPosition",
    "recordedStartDateTime",
    "recordedDuration",
    "recordedDayOfWeek",
    "srsRecordScheduleID",
    "srsRecordTaskID",
    "price",
    "payPerView",
    "dateTimeRange",
    "signalStrength",
    "signalLocked",
    "tuned",
    "DVDRegionCode",
    "channelID",
    "channelGroupName",
    "programID",
    "seriesID",
    "programCode",
    "episodeCount",
    "episodeNumber",
    "foreignMetadata",
    "containerUpdateID",
    "objectUpdateID",
    "totalDeletedChildCount",
];

fn object_children() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| OBJECT_CHILDREN.iter().copied().collect())
}

/// Rule-based validator for DIDL-Lite documents.
///
/// Enforces the object-level schema rules: every `item`/`container` carries
/// `id`, `parentID` and `restricted`, has non-empty `dc:title` and
/// `upnp:class` children, every `res` carries `protocolInfo`, object
/// children come from the DIDL-Lite vocabulary, and a `DIDL-Lite` element
/// holds at least one object.
#[derive(Debug, Default, Clone, Copy)]
pub struct DidlLiteValidator;

impl DidlLiteValidator {
    /// Creates a new validator.
    pub fn new() -> Self {
        DidlLiteValidator
    }

    fn validate_node(&self, node_ref: &NodeRef) -> bool {
        let is_object;
        {
            let node = node_ref.borrow();
            match node.element() {
                Some(element) => {
                    let local = element.local_name();
                    if local == "DIDL-Lite" && node.child_count() == 0 {
                        return false;
                    }
                    is_object = local == "item" || local == "container";
                }
                None => return true,
            }
        }

        if is_object && !self.validate_object(node_ref) {
            return false;
        }

        let children = node_ref.borrow().children().to_vec();
        children.iter().all(|child| self.validate_node(child))
    }

    fn validate_object(&self, node_ref: &NodeRef) -> bool {
        let node = node_ref.borrow();
        let element = match node.element() {
            Some(element) => element,
            None => return false,
        };

        if element.attribute("id").is_none()
            || element.attribute("parentID").is_none()
            || element.attribute("restricted").is_none()
        {
            return false;
        }

        let mut has_title = false;
        let mut has_class = false;

        for child_ref in node.children() {
            let child = child_ref.borrow();
            let Some(child_element) = child.element() else {
                // Objects hold elements, not bare character data.
                return false;
            };
            let local = child_element.local_name();

            match local {
                "title" => has_title = child.child_count() > 0,
                "class" => has_class = child.child_count() > 0,
                "res" => {
                    if child_element.attribute("protocolInfo").is_none() {
                        return false;
                    }
                }
                _ => {}
            }

            if in_didl_namespace(child_element.qname()) && !object_children().contains(local) {
                return false;
            }
        }

        has_title && has_class
    }
}

/// True for names in the `dc`/`upnp` prefixes or the default DIDL-Lite
/// namespace (no prefix). Vendor-prefixed extensions fall outside.
fn in_didl_namespace(qname: &str) -> bool {
    match qname.split_once(':') {
        Some((prefix, _)) => prefix == "dc" || prefix == "upnp",
        None => true,
    }
}

impl DocumentValidator for DidlLiteValidator {
    fn validate(&self, doc: &Document) -> bool {
        self.validate_node(doc.root())
    }
}
