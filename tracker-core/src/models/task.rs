//! Story tasks

use crate::document::Element;
use crate::error::Result;
use crate::fields::Timestamp;
use crate::wire::{
    EntityDescriptor, FieldWriter, WireEntity, read_bool, read_int, read_synced, read_text,
};
use serde::Serialize;

/// A checklist item on a story
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Task {
    pub id: Option<i64>,
    pub position: Option<i64>,
    pub description: Option<String>,
    pub complete: Option<bool>,
    pub created_at: Timestamp,
}

impl Task {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Overwrite every field with the values of `other`
    pub fn assign_from(&mut self, other: Task) {
        let Task {
            id,
            position,
            description,
            complete,
            created_at,
        } = other;
        self.id = id;
        self.position = position;
        self.description = description;
        self.complete = complete;
        self.created_at = created_at;
    }
}

impl WireEntity for Task {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "task",
        excluded: &["id", "created_at", "position"],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .int("id", self.id)
            .int("position", self.position)
            .text("description", self.description.as_deref())
            .bool("complete", self.complete)
            .synced("created_at", &self.created_at)
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        let mut task = Self {
            id: read_int(element, "id")?,
            position: read_int(element, "position")?,
            description: read_text(element, "description"),
            complete: read_bool(element, "complete")?,
            ..Default::default()
        };
        read_synced(element, "created_at", &mut task.created_at)?;
        Ok(task)
    }
}
