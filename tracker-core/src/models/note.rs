//! Story notes

use crate::document::Element;
use crate::error::Result;
use crate::fields::Timestamp;
use crate::wire::{EntityDescriptor, FieldWriter, WireEntity, read_int, read_synced, read_text};
use serde::Serialize;

/// A comment on a story
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Note {
    pub id: Option<i64>,
    pub text: Option<String>,
    pub author: Option<String>,
    pub noted_at: Timestamp,
}

impl Note {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

impl WireEntity for Note {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "note",
        excluded: &["id", "noted_at"],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .int("id", self.id)
            .text("text", self.text.as_deref())
            .text("author", self.author.as_deref())
            .synced("noted_at", &self.noted_at)
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        let mut note = Self {
            id: read_int(element, "id")?,
            text: read_text(element, "text"),
            author: read_text(element, "author"),
            ..Default::default()
        };
        read_synced(element, "noted_at", &mut note.noted_at)?;
        Ok(note)
    }
}
