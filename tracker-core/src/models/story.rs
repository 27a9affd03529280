//! Stories: features, chores, bugs and releases

use crate::document::Element;
use crate::error::Result;
use crate::fields::{Labels, Timestamp};
use crate::wire::{EntityDescriptor, FieldWriter, WireEntity, read_int, read_synced, read_text};
use serde::Serialize;

use super::enums::{StoryState, StoryStateField, StoryType, StoryTypeField};
use super::task::Task;

/// A unit of work in a project
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub project_id: Option<i64>,
    pub id: Option<i64>,
    pub story_type: StoryTypeField,
    pub name: Option<String>,
    pub description: Option<String>,
    pub requested_by: Option<String>,
    pub owned_by: Option<String>,
    pub labels: Labels,
    pub estimate: Option<i64>,
    pub url: Option<String>,
    pub current_state: StoryStateField,
    pub created_at: Timestamp,
    pub accepted_at: Timestamp,
    /// Tasks loaded with [`crate::TrackerClient::load_tasks`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

impl Default for Story {
    fn default() -> Self {
        Self {
            project_id: None,
            id: None,
            story_type: StoryTypeField::from_value(StoryType::Feature),
            name: None,
            description: None,
            requested_by: None,
            owned_by: None,
            labels: Labels::empty(),
            estimate: None,
            url: None,
            current_state: StoryStateField::empty(),
            created_at: Timestamp::empty(),
            accepted_at: Timestamp::empty(),
            tasks: None,
        }
    }
}

impl Story {
    pub fn new(story_type: StoryType, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            story_type: StoryTypeField::from_value(story_type),
            name: Some(name.into()),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    pub fn kind(&self) -> StoryType {
        *self.story_type.value()
    }

    pub fn state(&self) -> StoryState {
        *self.current_state.value()
    }

    /// Overwrite every field with the values of `other`
    pub fn assign_from(&mut self, other: Story) {
        let Story {
            project_id,
            id,
            story_type,
            name,
            description,
            requested_by,
            owned_by,
            labels,
            estimate,
            url,
            current_state,
            created_at,
            accepted_at,
            tasks,
        } = other;
        self.project_id = project_id;
        self.id = id;
        self.story_type = story_type;
        self.name = name;
        self.description = description;
        self.requested_by = requested_by;
        self.owned_by = owned_by;
        self.labels = labels;
        self.estimate = estimate;
        self.url = url;
        self.current_state = current_state;
        self.created_at = created_at;
        self.accepted_at = accepted_at;
        self.tasks = tasks;
    }
}

impl WireEntity for Story {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "story",
        excluded: &["url", "created_at", "accepted_at", "id", "project_id"],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .int("project_id", self.project_id)
            .int("id", self.id)
            .synced("story_type", &self.story_type)
            .text("name", self.name.as_deref())
            .text("description", self.description.as_deref())
            .text("requested_by", self.requested_by.as_deref())
            .text("owned_by", self.owned_by.as_deref())
            .synced("labels", &self.labels)
            .int("estimate", self.estimate)
            .text("url", self.url.as_deref())
            .synced("current_state", &self.current_state)
            .synced("created_at", &self.created_at)
            .synced("accepted_at", &self.accepted_at)
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        let mut story = Self {
            project_id: read_int(element, "project_id")?,
            id: read_int(element, "id")?,
            name: read_text(element, "name"),
            description: read_text(element, "description"),
            requested_by: read_text(element, "requested_by"),
            owned_by: read_text(element, "owned_by"),
            estimate: read_int(element, "estimate")?,
            url: read_text(element, "url"),
            ..Default::default()
        };
        read_synced(element, "story_type", &mut story.story_type)?;
        read_synced(element, "labels", &mut story.labels)?;
        read_synced(element, "current_state", &mut story.current_state)?;
        read_synced(element, "created_at", &mut story.created_at)?;
        read_synced(element, "accepted_at", &mut story.accepted_at)?;
        Ok(story)
    }
}
