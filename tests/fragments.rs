//! End-to-end tests for the fragment patch engine: the full apply protocol
//! against a live DIDL-Lite object, including its atomicity contract.

use didl_fragment::{apply_fragments, DocNode, Document, FragmentError};

const MUSIC_TRACK: &str = r#"<DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/" xmlns:upnp="urn:schemas-upnp-org:metadata-1-0/upnp/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><item id="18" parentID="13" restricted="0"><dc:title>Try a little tenderness</dc:title><upnp:class>object.item.audioItem.musicTrack</upnp:class><upnp:artist>Unknown</upnp:artist><res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/track.mp3</res></item></DIDL-Lite>"#;

fn music_track() -> DocNode {
    let doc = Document::parse_str(MUSIC_TRACK).unwrap();
    let node = doc.object_by_id("18").unwrap();
    DocNode::new(doc, node).unwrap()
}

/// Child element qnames of the object, in document order.
fn child_tags(object: &DocNode) -> Vec<String> {
    object
        .node
        .borrow()
        .children()
        .iter()
        .filter_map(|child| child.borrow().qname().map(str::to_string))
        .collect()
}

/// Text content of every child with the given qname.
fn child_texts(object: &DocNode, qname: &str) -> Vec<String> {
    object
        .node
        .borrow()
        .children()
        .iter()
        .filter(|child| child.borrow().qname() == Some(qname))
        .map(|child| {
            let child = child.borrow();
            let text = child.children()[0]
                .borrow()
                .content()
                .as_text()
                .map(|t| t.text().to_string())
                .unwrap_or_default();
            text
        })
        .collect()
}

#[test]
fn four_pair_update_scenario() {
    let mut object = music_track();

    let current = [
        // (a) class unchanged, a genre appended after it
        "<upnp:class>object.item.audioItem.musicTrack</upnp:class>",
        // (b) pure addition
        "",
        // (c) artist removed
        "<upnp:artist>Unknown</upnp:artist>",
        // (d) title modified
        "<dc:title>Try a little tenderness</dc:title>",
    ];
    let new = [
        "<upnp:class>object.item.audioItem.musicTrack</upnp:class><upnp:genre>Obscure</upnp:genre>",
        "<upnp:genre>Even more obscure</upnp:genre>",
        "",
        "<dc:title>Cthulhu fhtagn</dc:title>",
    ];

    assert_eq!(apply_fragments(&mut object, &current, &new), Ok(()));

    assert_eq!(
        child_texts(&object, "upnp:genre"),
        vec!["Obscure", "Even more obscure"]
    );
    assert!(child_texts(&object, "upnp:artist").is_empty());
    assert_eq!(child_texts(&object, "dc:title"), vec!["Cthulhu fhtagn"]);

    // The committed node lives in the caller's document.
    assert!(object.doc.contains(&object.node));
    let serialized = object.doc.to_xml().unwrap();
    assert!(serialized.contains("Cthulhu fhtagn"));
    assert!(serialized.contains("Even more obscure"));
    assert!(!serialized.contains("upnp:artist"));
}

#[test]
fn addition_is_anchored_after_its_context() {
    let mut object = music_track();

    let result = apply_fragments(
        &mut object,
        &["<upnp:class>object.item.audioItem.musicTrack</upnp:class>"],
        &["<upnp:class>object.item.audioItem.musicTrack</upnp:class><upnp:genre>Soul</upnp:genre>"],
    );
    assert_eq!(result, Ok(()));

    assert_eq!(
        child_tags(&object),
        vec!["dc:title", "upnp:class", "upnp:genre", "upnp:artist", "res"]
    );
}

#[test]
fn pure_addition_lands_after_last_child() {
    let mut object = music_track();

    assert_eq!(
        apply_fragments(&mut object, &[""], &["<upnp:genre>Soul</upnp:genre>"]),
        Ok(())
    );
    assert_eq!(
        child_tags(&object),
        vec!["dc:title", "upnp:class", "upnp:artist", "res", "upnp:genre"]
    );
}

#[test]
fn read_only_attribute_change_is_rejected() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    let current = [concat!(
        r#"<item id="18" parentID="13" restricted="0">"#,
        "<dc:title>Try a little tenderness</dc:title>",
        "<upnp:class>object.item.audioItem.musicTrack</upnp:class>",
        "<upnp:artist>Unknown</upnp:artist>",
        r#"<res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/track.mp3</res>"#,
        "</item>"
    )];
    let new = [concat!(
        r#"<item id="19" parentID="13" restricted="0">"#,
        "<dc:title>Try a little tenderness</dc:title>",
        "<upnp:class>object.item.audioItem.musicTrack</upnp:class>",
        "<upnp:artist>Unknown</upnp:artist>",
        r#"<res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/track.mp3</res>"#,
        "</item>"
    )];

    assert_eq!(
        apply_fragments(&mut object, &current, &new),
        Err(FragmentError::ReadonlyTag)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
    assert_eq!(
        object.node.borrow().element().unwrap().attribute("id"),
        Some("18")
    );
}

#[test]
fn read_only_element_addition_is_rejected() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    assert_eq!(
        apply_fragments(
            &mut object,
            &[""],
            &["<upnp:storageUsed>100</upnp:storageUsed>"],
        ),
        Err(FragmentError::ReadonlyTag)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn removing_class_is_rejected() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<upnp:class>object.item.audioItem.musicTrack</upnp:class>"],
            &[""],
        ),
        Err(FragmentError::RequiredTag)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn removing_title_via_tail_is_rejected() {
    let mut object = music_track();

    // First pair member matches title and class in document order; the new
    // fragment drops class, so it is staged as a removal of a required tag.
    let result = apply_fragments(
        &mut object,
        &[concat!(
            "<dc:title>Try a little tenderness</dc:title>",
            "<upnp:class>object.item.audioItem.musicTrack</upnp:class>"
        )],
        &["<dc:title>Try a little tenderness</dc:title>"],
    );
    assert_eq!(result, Err(FragmentError::RequiredTag));
}

#[test]
fn emptying_title_is_rejected() {
    let mut object = music_track();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<dc:title>Try a little tenderness</dc:title>"],
            &["<dc:title></dc:title>"],
        ),
        Err(FragmentError::RequiredTag)
    );
    assert_eq!(
        child_texts(&object, "dc:title"),
        vec!["Try a little tenderness"]
    );
}

#[test]
fn noop_pair_is_accepted_without_change() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<upnp:artist>Unknown</upnp:artist>"],
            &["<upnp:artist>Unknown</upnp:artist>"],
        ),
        Ok(())
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn inverse_pair_restores_original() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    let old_title = "<dc:title>Try a little tenderness</dc:title>";
    let new_title = "<dc:title>Cthulhu fhtagn</dc:title>";

    assert_eq!(
        apply_fragments(&mut object, &[old_title], &[new_title]),
        Ok(())
    );
    assert_ne!(object.doc.to_xml().unwrap(), before);

    assert_eq!(
        apply_fragments(&mut object, &[new_title], &[old_title]),
        Ok(())
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn first_failing_pair_aborts_everything() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    // Pair 1 is valid on its own; pair 2 touches a read-only attribute.
    let current = [
        "",
        r#"<res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/track.mp3</res>"#,
    ];
    let new = [
        "<upnp:genre>Soul</upnp:genre>",
        r#"<res protocolInfo="http-get:*:audio/mpeg:*" importUri="http://example.com/up">http://example.com/track.mp3</res>"#,
    ];

    assert_eq!(
        apply_fragments(&mut object, &current, &new),
        Err(FragmentError::ReadonlyTag)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
    assert!(child_texts(&object, "upnp:genre").is_empty());
}

#[test]
fn forged_current_fragment_is_rejected() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<upnp:artist>Somebody Else</upnp:artist>"],
            &["<upnp:artist>Nobody</upnp:artist>"],
        ),
        Err(FragmentError::CurrentInvalid)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn malformed_current_fragment_is_rejected() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<upnp:artist>Unknown"],
            &["<upnp:artist>Nobody</upnp:artist>"],
        ),
        Err(FragmentError::CurrentBadXml)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn malformed_new_fragment_is_rejected() {
    let mut object = music_track();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<upnp:artist>Unknown</upnp:artist>"],
            &["<upnp:artist>Nobody"],
        ),
        Err(FragmentError::NewBadXml)
    );
}

#[test]
fn changing_an_elements_tag_is_rejected() {
    let mut object = music_track();

    assert_eq!(
        apply_fragments(
            &mut object,
            &["<upnp:artist>Unknown</upnp:artist>"],
            &["<upnp:genre>Unknown</upnp:genre>"],
        ),
        Err(FragmentError::NewInvalid)
    );
}

#[test]
fn schema_invalid_addition_is_rejected() {
    let mut object = music_track();
    let before = object.doc.to_xml().unwrap();

    // Not read-only and not required, but unknown to the DIDL-Lite
    // vocabulary, so the post-edit validation fails.
    assert_eq!(
        apply_fragments(
            &mut object,
            &[""],
            &["<upnp:bogusThing>x</upnp:bogusThing>"],
        ),
        Err(FragmentError::NewInvalid)
    );
    assert_eq!(object.doc.to_xml().unwrap(), before);
}

#[test]
fn mismatched_array_lengths_are_rejected() {
    let mut object = music_track();

    assert_eq!(
        apply_fragments(&mut object, &["", ""], &[""]),
        Err(FragmentError::Mismatch)
    );
}

#[test]
fn empty_fragment_arrays_are_rejected() {
    let mut object = music_track();
    let none: [&str; 0] = [];

    assert_eq!(
        apply_fragments(&mut object, &none, &none),
        Err(FragmentError::CurrentInvalid)
    );
}

#[test]
fn resource_attribute_modification_is_accepted() {
    let mut object = music_track();

    let result = apply_fragments(
        &mut object,
        &[r#"<res protocolInfo="http-get:*:audio/mpeg:*">http://example.com/track.mp3</res>"#],
        &[r#"<res protocolInfo="http-get:*:audio/mpeg:*" duration="0:03:25">http://example.com/track.mp3</res>"#],
    );
    assert_eq!(result, Ok(()));

    let res_duration = {
        let node = object.node.borrow();
        let res = node
            .children()
            .iter()
            .find(|child| child.borrow().qname() == Some("res"))
            .cloned()
            .unwrap();
        let duration = res
            .borrow()
            .element()
            .unwrap()
            .attribute("duration")
            .map(str::to_string);
        duration
    };
    assert_eq!(res_duration.as_deref(), Some("0:03:25"));
}
