//! Submission sanitizer
//!
//! Before a create/update/delete request the serialized entity is stripped
//! of every field the service assigns itself (ids, timestamps, computed
//! values) and of null markers, which the service would otherwise read as
//! explicit nulls.

use crate::document::Document;
use crate::error::{Result, TrackerError};
use crate::wire::WireEntity;

/// Strip `document` for submission and return the request payload.
///
/// * `root_path` locates the entity element (`"story"`, `"//task/"`, ...);
///   a missing root is an error.
/// * Each name in `excluded` is removed from the root if present.
/// * With `drop_null_markers`, every direct child carrying an attribute is
///   removed; the remaining children keep their relative order.
/// * Attributes on the root itself are always removed.
///
/// The payload is the outer markup of the document's top-level element.
pub fn sanitize(
    document: &mut Document,
    root_path: &str,
    excluded: &[&str],
    drop_null_markers: bool,
) -> Result<String> {
    let root = document
        .find_mut(root_path)
        .ok_or_else(|| TrackerError::RootNotFound(root_path.to_string()))?;

    for name in excluded {
        if root.remove_child(name).is_some() {
            tracing::trace!("Removed excluded field <{}>", name);
        }
    }

    if drop_null_markers {
        // Index only advances past kept children; a removal shifts the next
        // child into the current slot.
        let mut i = 0;
        while i < root.children.len() {
            if root.children[i].attributes.is_empty() {
                i += 1;
            } else {
                let removed = root.children.remove(i);
                tracing::trace!("Removed null marker <{}>", removed.name);
            }
        }
    }

    root.attributes.clear();

    document.outer_xml()
}

/// Serialize and sanitize an entity using its type's descriptor
pub fn submission_payload<E: WireEntity>(entity: &E) -> Result<String> {
    let descriptor = E::DESCRIPTOR;
    let mut document = entity.to_document();
    sanitize(
        &mut document,
        descriptor.root,
        descriptor.excluded,
        descriptor.drop_null_markers,
    )
}
