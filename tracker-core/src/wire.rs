//! Entity (de)serialization to wire documents

use crate::document::{Document, Element};
use crate::error::{Result, TrackerError};
use crate::fields::{FieldCodec, Synced};

/// Static description of an entity type's wire shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDescriptor {
    /// Element name of a single entity (`story`, `task`, ...)
    pub root: &'static str,
    /// Fields the service assigns itself; never sent on writes
    pub excluded: &'static [&'static str],
    /// Whether null markers are stripped before writes
    pub drop_null_markers: bool,
}

/// An entity that maps to and from a wire element
pub trait WireEntity: Sized {
    const DESCRIPTOR: EntityDescriptor;

    fn to_element(&self) -> Element;

    fn from_element(element: &Element) -> Result<Self>;

    fn to_document(&self) -> Document {
        Document::new(self.to_element())
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let root = doc.root();
        if root.name != Self::DESCRIPTOR.root {
            return Err(TrackerError::Xml(format!(
                "expected <{}> document, got <{}>",
                Self::DESCRIPTOR.root,
                root.name
            )));
        }
        Self::from_element(root)
    }
}

/// Decode every `<root>` child of a plural container element
pub fn decode_children<E: WireEntity>(container: &Element) -> Result<Vec<E>> {
    container
        .children_named(E::DESCRIPTOR.root)
        .map(E::from_element)
        .collect()
}

/// Decode a plural container document (`<stories><story/>...</stories>`)
pub fn decode_list<E: WireEntity>(doc: &Document) -> Result<Vec<E>> {
    decode_children(doc.root())
}

/// Builds an entity element one field at a time, writing null markers for
/// absent values
pub(crate) struct FieldWriter {
    element: Element,
}

impl FieldWriter {
    pub fn new(root: &str) -> Self {
        Self {
            element: Element::new(root),
        }
    }

    pub fn text(mut self, name: &str, value: Option<&str>) -> Self {
        self.element.push(match value {
            Some(v) => Element::with_text(name, v),
            None => Element::nil(name),
        });
        self
    }

    pub fn int(self, name: &str, value: Option<i64>) -> Self {
        let value = value.map(|v| v.to_string());
        self.text(name, value.as_deref())
    }

    pub fn bool(self, name: &str, value: Option<bool>) -> Self {
        self.text(name, value.map(|v| if v { "true" } else { "false" }))
    }

    pub fn synced<C: FieldCodec>(self, name: &str, field: &Synced<C>) -> Self {
        self.text(name, field.raw())
    }

    pub fn child(mut self, child: Element) -> Self {
        self.element.push(child);
        self
    }

    pub fn finish(self) -> Element {
        self.element
    }
}

pub(crate) fn read_text(element: &Element, name: &str) -> Option<String> {
    element.child_text(name).map(str::to_string)
}

pub(crate) fn read_int(element: &Element, name: &'static str) -> Result<Option<i64>> {
    match element.child_text(name).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| TrackerError::InvalidField {
            field: name,
            value: v.to_string(),
        }),
    }
}

pub(crate) fn read_bool(element: &Element, name: &'static str) -> Result<Option<bool>> {
    match element.child_text(name).map(str::trim) {
        None | Some("") => Ok(None),
        Some("true") => Ok(Some(true)),
        Some("false") => Ok(Some(false)),
        Some(v) => Err(TrackerError::InvalidField {
            field: name,
            value: v.to_string(),
        }),
    }
}

/// Read a synchronized field; an absent element leaves `field` untouched
pub(crate) fn read_synced<C: FieldCodec>(
    element: &Element,
    name: &str,
    field: &mut Synced<C>,
) -> Result<()> {
    if let Some(raw) = element.child_text(name) {
        field.set_raw(raw)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_writer_null_markers() {
        let el = FieldWriter::new("task")
            .int("id", Some(7))
            .text("description", None)
            .bool("complete", Some(false))
            .finish();

        assert_eq!(el.child_text("id"), Some("7"));
        assert!(el.child("description").unwrap().is_nil());
        assert_eq!(el.child_text("complete"), Some("false"));
    }

    #[test]
    fn test_read_int_rejects_garbage() {
        let el = FieldWriter::new("task").text("id", Some("seven")).finish();
        let err = read_int(&el, "id").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidField { field: "id", .. }));
    }

    #[test]
    fn test_read_missing_and_nil_are_none() {
        let el = FieldWriter::new("task").int("position", None).finish();
        assert_eq!(read_int(&el, "position").unwrap(), None);
        assert_eq!(read_int(&el, "id").unwrap(), None);
        assert_eq!(read_bool(&el, "complete").unwrap(), None);
    }
}
