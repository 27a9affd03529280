//! Projects and their story collection

use crate::cache::{CollectionCache, FetchOptions};
use crate::client::TrackerClient;
use crate::document::Element;
use crate::error::{Result, TrackerError};
use crate::fields::Labels;
use crate::filter::StoryFilter;
use crate::transport::Transport;
use crate::wire::{
    EntityDescriptor, FieldWriter, WireEntity, read_bool, read_int, read_synced, read_text,
};
use serde::Serialize;

use super::enums::StoryType;
use super::story::Story;

const WEEK_DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A tracker project
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Project {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub labels: Labels,
    pub iteration_length: Option<i64>,
    pub week_start_day: Option<String>,
    pub point_scale: Option<String>,
    pub velocity_scheme: Option<String>,
    pub current_velocity: Option<i64>,
    pub initial_velocity: Option<i64>,
    pub number_of_done_iterations_to_show: Option<i64>,
    pub public: Option<bool>,
    /// Stories loaded with [`Project::load_stories`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stories: Option<Vec<Story>>,
    #[serde(skip)]
    story_cache: CollectionCache<Story>,
}

impl Project {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Index of the week start day, Sunday = 0
    pub fn week_start_index(&self) -> Option<usize> {
        let day = self.week_start_day.as_deref()?;
        WEEK_DAYS.iter().position(|d| d.eq_ignore_ascii_case(day.trim()))
    }

    /// Snapshot held by the story cache
    pub fn cached_stories(&self) -> &[Story] {
        self.story_cache.snapshot()
    }

    fn require_id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| TrackerError::MissingField("project id".to_string()))
    }

    /// Fetch every story and keep it in [`Project::stories`]
    pub async fn load_stories<T: Transport>(&mut self, client: &TrackerClient<T>) -> Result<&[Story]> {
        let stories = client.fetch_stories(self.require_id()?, None).await?;
        let stories = self.stories.insert(stories);
        Ok(stories.as_slice())
    }

    /// All stories, honoring the cache options
    pub async fn fetch_stories<T: Transport>(
        &mut self,
        client: &TrackerClient<T>,
        options: FetchOptions,
    ) -> Result<Vec<Story>> {
        self.fetch_stories_of(client, options, None).await
    }

    pub async fn fetch_bugs<T: Transport>(
        &mut self,
        client: &TrackerClient<T>,
        options: FetchOptions,
    ) -> Result<Vec<Story>> {
        self.fetch_stories_of(client, options, Some(StoryType::Bug)).await
    }

    pub async fn fetch_chores<T: Transport>(
        &mut self,
        client: &TrackerClient<T>,
        options: FetchOptions,
    ) -> Result<Vec<Story>> {
        self.fetch_stories_of(client, options, Some(StoryType::Chore)).await
    }

    pub async fn fetch_features<T: Transport>(
        &mut self,
        client: &TrackerClient<T>,
        options: FetchOptions,
    ) -> Result<Vec<Story>> {
        self.fetch_stories_of(client, options, Some(StoryType::Feature)).await
    }

    pub async fn fetch_releases<T: Transport>(
        &mut self,
        client: &TrackerClient<T>,
        options: FetchOptions,
    ) -> Result<Vec<Story>> {
        self.fetch_stories_of(client, options, Some(StoryType::Release)).await
    }

    /// Stories of one kind (or all). Live fetches filter on the server; the
    /// cache is always refreshed with the unfiltered collection and filtered
    /// locally.
    pub async fn fetch_stories_of<T: Transport>(
        &mut self,
        client: &TrackerClient<T>,
        options: FetchOptions,
        kind: Option<StoryType>,
    ) -> Result<Vec<Story>> {
        let project_id = self.require_id()?;
        let live_filter = kind.map(|k| StoryFilter::new().story_type(k));

        self.story_cache
            .resolve(
                options,
                || client.fetch_stories(project_id, None),
                || client.fetch_stories(project_id, live_filter.as_ref()),
                |story| kind.is_none_or(|k| story.kind() == k),
            )
            .await
    }
}

impl WireEntity for Project {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "project",
        excluded: &["id", "labels", "current_velocity"],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .int("id", self.id)
            .text("name", self.name.as_deref())
            .synced("labels", &self.labels)
            .int("iteration_length", self.iteration_length)
            .text("week_start_day", self.week_start_day.as_deref())
            .text("point_scale", self.point_scale.as_deref())
            .text("velocity_scheme", self.velocity_scheme.as_deref())
            .int("current_velocity", self.current_velocity)
            .int("initial_velocity", self.initial_velocity)
            .int(
                "number_of_done_iterations_to_show",
                self.number_of_done_iterations_to_show,
            )
            .bool("public", self.public)
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        let mut project = Self {
            id: read_int(element, "id")?,
            name: read_text(element, "name"),
            iteration_length: read_int(element, "iteration_length")?,
            week_start_day: read_text(element, "week_start_day"),
            point_scale: read_text(element, "point_scale"),
            velocity_scheme: read_text(element, "velocity_scheme"),
            current_velocity: read_int(element, "current_velocity")?,
            initial_velocity: read_int(element, "initial_velocity")?,
            number_of_done_iterations_to_show: read_int(
                element,
                "number_of_done_iterations_to_show",
            )?,
            public: read_bool(element, "public")?,
            ..Default::default()
        };
        read_synced(element, "labels", &mut project.labels)?;
        Ok(project)
    }
}
