//! Story attachments

use crate::document::Element;
use crate::error::Result;
use crate::wire::{EntityDescriptor, FieldWriter, WireEntity, read_int, read_text};
use serde::Serialize;

/// Upload status of a file attached to a story
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Attachment {
    pub id: Option<i64>,
    pub status: Option<String>,
}

impl WireEntity for Attachment {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "attachment",
        excluded: &["id", "status"],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .int("id", self.id)
            .text("status", self.status.as_deref())
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            id: read_int(element, "id")?,
            status: read_text(element, "status"),
        })
    }
}
