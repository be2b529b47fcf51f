//! Read-only and required property tables.
//!
//! Two process-wide tables gate fragment edits before any schema validation
//! runs: a flat set of read-only keys and a nested map of required elements
//! and their dependent attributes. Both are immutable after construction and
//! initialized lazily on first use.
//!
//! Table keys are local names; lookups strip any namespace prefix from the
//! qualified names parsed out of fragments.

use std::sync::OnceLock;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::node::local_name;

/// Keys that a client edit must never modify or remove. `"element"` marks a
/// whole element, `"@attribute"` an attribute on any element and
/// `"element@attribute"` an attribute on one element.
const READ_ONLY_PROPS: &[&str] = &[
    "@id",
    "@parentID",
    "@refID",
    "@restricted",
    "@searchable",
    "@childCount",
    "searchClass",
    "searchClass@name",
    "searchClass@includeDerived",
    "createClass",
    "createClass@name",
    "createClass@includeDerived",
    "writeStatus",
    "res@importUri",
    "storageTotal",
    "storageUsed",
    "storageFree",
    "storageMaxPartition",
    "storageMedium",
    "playbackCount",
    "srsRecordScheduleID",
    "srsRecordTaskID",
    "price",
    "price@currency",
    "payPerView",
    "dateTimeRange",
    "dateTimeRange@daylightSaving",
    "signalStrength",
    "signalLocked",
    "tuned",
    "containerUpdateID",
    "objectUpdateID",
    "totalDeletedChildCount",
    "res@updateCount",
];

/// One entry in the required-property tree: the attributes an element
/// depends on and the child elements it requires.
struct RequiredEntry {
    attributes: &'static [&'static str],
    children: &'static [&'static str],
}

impl RequiredEntry {
    const fn new(
        attributes: &'static [&'static str],
        children: &'static [&'static str],
    ) -> RequiredEntry {
        RequiredEntry {
            attributes,
            children,
        }
    }
}

fn read_only_props() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| READ_ONLY_PROPS.iter().copied().collect())
}

fn required_props() -> &'static FxHashMap<&'static str, RequiredEntry> {
    static MAP: OnceLock<FxHashMap<&'static str, RequiredEntry>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = FxHashMap::default();
        // Synthetic top-level entry: attributes of the object element itself
        // and the two globally mandatory child elements.
        map.insert(
            "",
            RequiredEntry::new(&["id", "parentID", "restricted"], &["title", "class"]),
        );
        map.insert("res", RequiredEntry::new(&["protocolInfo"], &[]));
        map.insert("programID", RequiredEntry::new(&["type"], &[]));
        map.insert("seriesID", RequiredEntry::new(&["type"], &[]));
        map.insert("channelID", RequiredEntry::new(&["type"], &[]));
        map.insert("programCode", RequiredEntry::new(&["type"], &[]));
        map.insert("channelGroupName", RequiredEntry::new(&["id"], &[]));
        map.insert("price", RequiredEntry::new(&["currency"], &[]));
        map.insert("desc", RequiredEntry::new(&["nameSpace"], &[]));
        map.insert(
            "deviceUDN",
            RequiredEntry::new(&["serviceType", "serviceId"], &[]),
        );
        map.insert(
            "stateVariableCollection",
            RequiredEntry::new(&["serviceName", "rcsInstanceType"], &[]),
        );
        map.insert(
            "foreignMetadata",
            RequiredEntry::new(&["type"], &["fmId", "fmClass", "fmProvider", "fmBody"]),
        );
        map.insert("fmId", RequiredEntry::new(&[], &[]));
        map.insert("fmClass", RequiredEntry::new(&[], &[]));
        map.insert("fmProvider", RequiredEntry::new(&[], &[]));
        map.insert("fmBody", RequiredEntry::new(&["xmlFlag"], &[]));
        map
    })
}

/// Returns true if the given element/attribute pair is read-only for client
/// edits. Checks `element@attribute`, then `@attribute`, then the bare
/// element; the first match wins.
pub fn is_read_only(element: Option<&str>, attribute: Option<&str>) -> bool {
    let Some(element) = element else {
        return false;
    };
    let element = local_name(element);
    let set = read_only_props();

    if let Some(attribute) = attribute {
        let attribute = local_name(attribute);
        if set.contains(format!("{}@{}", element, attribute).as_str()) {
            return true;
        }
        if set.contains(format!("@{}", attribute).as_str()) {
            return true;
        }
    }
    set.contains(element)
}

/// Returns true if the given element/attribute pair is required.
///
/// With an attribute, the answer comes from the top-level entry's dependent
/// attributes or from the element's own entry. Without one, only the
/// top-level entry's required child elements are consulted; requirement is
/// a global flag here, not a check against the element's actual parent in
/// the tree. That is an intentional simplification carried over from the
/// original protocol implementation.
pub fn is_required(element: Option<&str>, attribute: Option<&str>) -> bool {
    let Some(element) = element else {
        return false;
    };
    let element = local_name(element);
    let map = required_props();
    let toplevel = &map[""];

    if let Some(attribute) = attribute {
        let attribute = local_name(attribute);
        if toplevel.attributes.contains(&attribute) {
            return true;
        }
        return map
            .get(element)
            .is_some_and(|entry| entry.attributes.contains(&attribute));
    }

    toplevel.children.contains(&element)
}
