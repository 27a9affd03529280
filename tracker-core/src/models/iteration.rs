//! Iterations and their stories

use crate::document::Element;
use crate::error::Result;
use crate::fields::Timestamp;
use crate::wire::{EntityDescriptor, FieldWriter, WireEntity, decode_children, read_int, read_synced};
use serde::Serialize;

use super::story::Story;

/// A fixed-length planning period
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Iteration {
    pub id: Option<i64>,
    pub number: Option<i64>,
    pub start: Timestamp,
    pub finish: Timestamp,
    pub stories: Vec<Story>,
}

impl Iteration {
    /// Sum of story estimates; unestimated stories count as zero
    pub fn velocity(&self) -> i64 {
        self.stories.iter().filter_map(|s| s.estimate).sum()
    }
}

impl WireEntity for Iteration {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "iteration",
        excluded: &[],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        let mut stories = Element::new("stories");
        for story in &self.stories {
            stories.push(story.to_element());
        }

        FieldWriter::new(Self::DESCRIPTOR.root)
            .int("id", self.id)
            .int("number", self.number)
            .synced("start", &self.start)
            .synced("finish", &self.finish)
            .child(stories)
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        let stories = match element.child("stories") {
            Some(container) => decode_children(container)?,
            None => Vec::new(),
        };

        let mut iteration = Self {
            id: read_int(element, "id")?,
            number: read_int(element, "number")?,
            stories,
            ..Default::default()
        };
        read_synced(element, "start", &mut iteration.start)?;
        read_synced(element, "finish", &mut iteration.finish)?;
        Ok(iteration)
    }
}
