//! Entity fingerprint generation.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use cadence_core::constants::FINGERPRINT_SENTINEL;
use sha2::{Digest, Sha256};

use super::item::RecurringItem;

/// ## Summary
/// Computes the change token of an item.
///
/// The digest input is `uid:modified` of the item, followed for a master by
/// `,uid:modified` of each live modification in recurrence-identifier order.
/// Absent values are written as `-`. The SHA-256 digest of that text is
/// returned base64-encoded.
#[must_use]
pub fn calculate(item: &RecurringItem) -> String {
    let canonical = canonical_text(item);
    tracing::trace!(%canonical, "Fingerprint input");
    encode(canonical.as_bytes())
}

/// Builds the text the fingerprint digests.
#[must_use]
pub fn canonical_text(item: &RecurringItem) -> String {
    let mut text = segment(item);
    for modification in item.get_modifications() {
        text.push(',');
        text.push_str(&segment(modification));
    }
    text
}

fn segment(item: &RecurringItem) -> String {
    let uid = item.uid().unwrap_or(FINGERPRINT_SENTINEL);
    match item.modified() {
        Some(modified) => format!("{uid}:{modified}"),
        None => format!("{uid}:{FINGERPRINT_SENTINEL}"),
    }
}

/// ## Summary
/// Digests canonical bytes with SHA-256 and encodes them with standard base64.
#[must_use]
pub fn encode(canonical_bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes);
    let hash = hasher.finalize();
    STANDARD.encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_rfc::rfc::ical::core::{Component, Property};
    use cadence_rfc::rfc::ical::parse::parse_property;

    fn master(modified: i64) -> RecurringItem {
        let content = Component::event()
            .with_property(Property::text("UID", "m"))
            .with_property(parse_property("DTSTART", Vec::new(), "20060101T180000Z").unwrap());
        RecurringItem::master(Some("m".to_string()), content).with_modified(modified)
    }

    fn modification(uid: &str, rid: &str, modified: i64) -> RecurringItem {
        let content = Component::event()
            .with_property(parse_property("RECURRENCE-ID", Vec::new(), rid).unwrap());
        RecurringItem::modification(Some(uid.to_string()), content, "m")
            .unwrap()
            .with_modified(modified)
    }

    #[test]
    fn master_only_segment() {
        assert_eq!(canonical_text(&master(1000)), "m:1000");
        assert_eq!(
            canonical_text(&RecurringItem::master(None, Component::event())),
            "-:-"
        );
    }

    #[test]
    fn modifications_in_recurrence_order() {
        let mut item = master(1000);
        item.add_modification(modification("b", "20060103T180000Z", 3))
            .unwrap();
        item.add_modification(modification("a", "20060102T180000Z", 2))
            .unwrap();
        assert_eq!(canonical_text(&item), "m:1000,a:2,b:3");
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut first = master(1000);
        first
            .add_modification(modification("a", "20060102T180000Z", 2))
            .unwrap();
        first
            .add_modification(modification("b", "20060103T180000Z", 3))
            .unwrap();

        let mut second = master(1000);
        second
            .add_modification(modification("b", "20060103T180000Z", 3))
            .unwrap();
        second
            .add_modification(modification("a", "20060102T180000Z", 2))
            .unwrap();

        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint(), first.fingerprint());
    }

    #[test]
    fn changes_track_state() {
        let mut item = master(1000);
        let bare = item.fingerprint();

        item.add_modification(modification("a", "20060102T180000Z", 2))
            .unwrap();
        let with_mod = item.fingerprint();
        assert_ne!(bare, with_mod);

        item.touch(1001);
        assert_ne!(with_mod, item.fingerprint());

        item.touch(1000);
        assert_eq!(with_mod, item.fingerprint());

        item.remove_modification("a");
        assert_eq!(bare, item.fingerprint());
    }

    #[test]
    fn modification_reflects_only_itself() {
        let child = modification("a", "20060102T180000Z", 2);
        assert_eq!(canonical_text(&child), "a:2");
    }

    #[test]
    fn encoding_is_base64_sha256() {
        // SHA-256 of the empty input
        assert_eq!(encode(b""), "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }
}
