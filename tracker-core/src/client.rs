//! Tracker service client
//!
//! Every operation builds a URL under the configured base, attaches the API
//! token as a `token` query parameter and exchanges wire documents through a
//! [`Transport`]. Writes go through [`submission_payload`] so service-owned
//! fields never leave the client.

use crate::config::ClientConfig;
use crate::document::Document;
use crate::error::{Result, TrackerError};
use crate::filter::StoryFilter;
use crate::models::{
    Attachment, Iteration, IterationGroup, Membership, Note, Project, Story, Task, UserToken,
};
use crate::sanitize::submission_payload;
use crate::transport::{HttpTransport, ServiceMethod, Transport};
use crate::wire::{WireEntity, decode_list};
use bytes::Bytes;

/// Client bound to one API token
pub struct TrackerClient<T: Transport> {
    transport: T,
    config: ClientConfig,
    token: String,
}

impl TrackerClient<HttpTransport> {
    /// HTTP client using the token from `config`
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| TrackerError::Config("no API token configured".to_string()))?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(transport, config, token))
    }

    /// HTTP client authenticated by exchanging a login for a token
    pub async fn authenticate(config: ClientConfig, login: &str, password: &str) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Self::authenticate_with(transport, config, login, password).await
    }
}

impl<T: Transport> TrackerClient<T> {
    pub fn new(transport: T, config: ClientConfig, token: impl Into<String>) -> Self {
        Self {
            transport,
            config,
            token: token.into(),
        }
    }

    /// Exchange a login for the account's active token
    pub async fn authenticate_with(
        transport: T,
        config: ClientConfig,
        login: &str,
        password: &str,
    ) -> Result<Self> {
        let url = format!("{}/tokens/active", config.secure_base());
        let doc = transport.fetch_with_credentials(&url, login, password).await?;
        let token = UserToken::from_document(&doc)?;
        let guid = token
            .guid
            .ok_or_else(|| TrackerError::MissingField("token guid".to_string()))?;
        tracing::info!("Authenticated as {}", login);
        Ok(Self::new(transport, config, guid))
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn url(&self, path: &str) -> Result<String> {
        self.url_with_params(path, &[])
    }

    /// Service URL for `path` with the token and `params` form-encoded
    /// into the query string
    fn url_with_params(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let base = format!("{}{}", self.config.base(), path);
        let pairs = std::iter::once(("token", self.token.as_str()))
            .chain(params.iter().map(|(k, v)| (*k, v.as_str())));
        let url = reqwest::Url::parse_with_params(&base, pairs)
            .map_err(|e| TrackerError::Config(format!("invalid service URL {}: {}", base, e)))?;
        Ok(url.into())
    }

    async fn fetch_one<E: WireEntity>(&self, url: &str) -> Result<E> {
        let doc = self.transport.fetch(url).await?;
        E::from_document(&doc)
    }

    async fn fetch_many<E: WireEntity>(&self, url: &str) -> Result<Vec<E>> {
        let doc = self.transport.fetch(url).await?;
        decode_list(&doc)
    }

    async fn send<E: WireEntity>(&self, url: &str, method: ServiceMethod, entity: &E) -> Result<E> {
        let payload = submission_payload(entity)?;
        tracing::trace!("{} payload: {}", method, payload);
        let doc: Document = self.transport.submit(url, method, Some(&payload)).await?;
        E::from_document(&doc)
    }

    // Projects

    /// Projects visible to the token's account
    pub async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.fetch_many(&self.url("/projects")?).await
    }

    pub async fn fetch_project(&self, project_id: i64) -> Result<Project> {
        self.fetch_one(&self.url(&format!("/projects/{}", project_id))?).await
    }

    /// Project with its stories already loaded
    pub async fn fetch_project_with_stories(&self, project_id: i64) -> Result<Project> {
        let mut project = self.fetch_project(project_id).await?;
        project.load_stories(self).await?;
        Ok(project)
    }

    pub async fn add_project(&self, project: &Project) -> Result<Project> {
        self.send(&self.url("/projects")?, ServiceMethod::Post, project).await
    }

    // Stories

    /// Stories of a project, optionally narrowed on the server
    pub async fn fetch_stories(
        &self,
        project_id: i64,
        filter: Option<&StoryFilter>,
    ) -> Result<Vec<Story>> {
        let params: Vec<_> = filter.and_then(StoryFilter::query_pair).into_iter().collect();
        let url = self.url_with_params(&format!("/projects/{}/stories", project_id), &params)?;
        let stories = self.fetch_many(&url).await?;
        tracing::debug!("Fetched {} stories for project {}", stories.len(), project_id);
        Ok(stories)
    }

    pub async fn fetch_story(&self, project_id: i64, story_id: i64) -> Result<Story> {
        self.fetch_one(&self.url(&story_path(project_id, story_id))?).await
    }

    pub async fn add_story(&self, project_id: i64, story: &Story) -> Result<Story> {
        let url = self.url(&format!("/projects/{}/stories", project_id))?;
        self.send(&url, ServiceMethod::Post, story).await
    }

    /// PUT the story and return the service's copy
    pub async fn update_story(&self, story: &Story) -> Result<Story> {
        let url = self.url(&story_path(require_project(story)?, require_story(story)?))?;
        self.send(&url, ServiceMethod::Put, story).await
    }

    /// PUT the story and overwrite it with the service's copy
    pub async fn update_story_in_place(&self, story: &mut Story) -> Result<()> {
        let updated = self.update_story(story).await?;
        story.assign_from(updated);
        Ok(())
    }

    pub async fn delete_story(&self, story: &Story) -> Result<Story> {
        let url = self.url(&story_path(require_project(story)?, require_story(story)?))?;
        self.send(&url, ServiceMethod::Delete, story).await
    }

    /// Fetch the story's tasks and keep them in [`Story::tasks`]
    pub async fn load_tasks<'a>(&self, story: &'a mut Story) -> Result<&'a [Task]> {
        let tasks = self
            .fetch_tasks(require_project(story)?, require_story(story)?)
            .await?;
        let tasks = story.tasks.insert(tasks);
        Ok(tasks.as_slice())
    }

    // Tasks

    pub async fn fetch_tasks(&self, project_id: i64, story_id: i64) -> Result<Vec<Task>> {
        self.fetch_many(&self.url(&tasks_path(project_id, story_id))?).await
    }

    pub async fn add_task(&self, project_id: i64, story_id: i64, task: &Task) -> Result<Task> {
        let url = self.url(&tasks_path(project_id, story_id))?;
        self.send(&url, ServiceMethod::Post, task).await
    }

    pub async fn update_task(&self, project_id: i64, story_id: i64, task: &Task) -> Result<Task> {
        let task_id = require_task(task)?;
        let url = self.url(&task_path(project_id, story_id, task_id))?;
        self.send(&url, ServiceMethod::Put, task).await
    }

    pub async fn update_task_in_place(
        &self,
        project_id: i64,
        story_id: i64,
        task: &mut Task,
    ) -> Result<()> {
        let updated = self.update_task(project_id, story_id, task).await?;
        task.assign_from(updated);
        Ok(())
    }

    pub async fn delete_task(&self, project_id: i64, story_id: i64, task: &Task) -> Result<Task> {
        let task_id = require_task(task)?;
        let url = self.url(&task_path(project_id, story_id, task_id))?;
        self.send(&url, ServiceMethod::Delete, task).await
    }

    /// Delete a task knowing only its id; no request body is sent
    pub async fn delete_task_by_id(
        &self,
        project_id: i64,
        story_id: i64,
        task_id: i64,
    ) -> Result<Task> {
        let url = self.url(&task_path(project_id, story_id, task_id))?;
        let doc = self.transport.submit(&url, ServiceMethod::Delete, None).await?;
        Task::from_document(&doc)
    }

    // Notes and attachments

    pub async fn add_note(
        &self,
        project_id: i64,
        story_id: i64,
        text: &str,
        author: Option<&str>,
    ) -> Result<Note> {
        let note = Note {
            author: author.map(str::to_string),
            ..Note::new(text)
        };
        let url = self.url(&format!("{}/notes", story_path(project_id, story_id)))?;
        self.send(&url, ServiceMethod::Post, &note).await
    }

    /// Upload a file to a story; the response carries the upload status
    pub async fn add_attachment(
        &self,
        project_id: i64,
        story_id: i64,
        data: impl Into<Bytes>,
    ) -> Result<Attachment> {
        let url = self.url(&format!("{}/attachments", story_path(project_id, story_id)))?;
        let doc = self.transport.upload(&url, data.into()).await?;
        let attachment = Attachment::from_document(&doc)?;
        tracing::info!(
            "Attachment {:?} on story {}: {}",
            attachment.id,
            story_id,
            attachment.status.as_deref().unwrap_or("unknown")
        );
        Ok(attachment)
    }

    // Memberships

    pub async fn fetch_memberships(&self, project_id: i64) -> Result<Vec<Membership>> {
        self.fetch_many(&self.url(&format!("/projects/{}/memberships", project_id))?)
            .await
    }

    pub async fn add_membership(&self, project_id: i64, membership: &Membership) -> Result<Membership> {
        let url = self.url(&format!("/projects/{}/memberships", project_id))?;
        self.send(&url, ServiceMethod::Post, membership).await
    }

    // Iterations

    /// Iterations of a project, optionally restricted to a group and paged
    pub async fn fetch_iterations(
        &self,
        project_id: i64,
        group: IterationGroup,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Iteration>> {
        let mut path = format!("/projects/{}/iterations", project_id);
        if let Some(segment) = group.path_segment() {
            path.push('/');
            path.push_str(segment);
        }

        let mut params = Vec::new();
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            params.push(("offset", offset.to_string()));
        }

        self.fetch_many(&self.url_with_params(&path, &params)?).await
    }
}

fn story_path(project_id: i64, story_id: i64) -> String {
    format!("/projects/{}/stories/{}", project_id, story_id)
}

fn tasks_path(project_id: i64, story_id: i64) -> String {
    format!("{}/tasks", story_path(project_id, story_id))
}

fn task_path(project_id: i64, story_id: i64, task_id: i64) -> String {
    format!("{}/{}", tasks_path(project_id, story_id), task_id)
}

fn require_project(story: &Story) -> Result<i64> {
    story
        .project_id
        .ok_or_else(|| TrackerError::MissingField("story project_id".to_string()))
}

fn require_story(story: &Story) -> Result<i64> {
    story
        .id
        .ok_or_else(|| TrackerError::MissingField("story id".to_string()))
}

fn require_task(task: &Task) -> Result<i64> {
    task.id
        .ok_or_else(|| TrackerError::MissingField("task id".to_string()))
}
