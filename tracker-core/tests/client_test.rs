//! Integration tests for client operations over an in-memory transport.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Mutex;
use tracker_core::{
    ClientConfig, Document, FetchOptions, IterationGroup, Membership, Person, Project, Result,
    ServiceMethod, Story, StoryFilter, StoryState, StoryType, Task, TrackerClient, TrackerError,
    Transport, WireEntity,
};

/// A request seen by the transport
#[derive(Debug, Clone, PartialEq)]
struct Call {
    method: ServiceMethod,
    url: String,
    payload: Option<String>,
}

/// Answers each request with the XML of the first route whose path matches
/// the URL path exactly, and records every call.
#[derive(Default)]
struct RecordingTransport {
    routes: Vec<(ServiceMethod, String, String)>,
    calls: Mutex<Vec<Call>>,
}

impl RecordingTransport {
    fn route(mut self, method: ServiceMethod, path: &str, xml: &str) -> Self {
        self.routes.push((method, path.to_string(), xml.to_string()));
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn respond(&self, method: ServiceMethod, url: &str, payload: Option<&str>) -> Result<Document> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            payload: payload.map(str::to_string),
        });

        let path = url
            .strip_prefix(BASE)
            .and_then(|rest| rest.split('?').next())
            .unwrap_or(url);
        match self
            .routes
            .iter()
            .find(|(m, p, _)| *m == method && p == path)
        {
            Some((_, _, xml)) => Document::parse(xml),
            None => Err(TrackerError::Status {
                method: method.to_string(),
                url: url.to_string(),
                status: 404,
                body: String::new(),
            }),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn fetch(&self, url: &str) -> Result<Document> {
        self.respond(ServiceMethod::Get, url, None)
    }

    async fn submit(
        &self,
        url: &str,
        method: ServiceMethod,
        payload: Option<&str>,
    ) -> Result<Document> {
        self.respond(method, url, payload)
    }

    async fn fetch_with_credentials(
        &self,
        url: &str,
        login: &str,
        _password: &str,
    ) -> Result<Document> {
        self.respond(ServiceMethod::Get, url, Some(login))
    }

    async fn upload(&self, url: &str, data: Bytes) -> Result<Document> {
        self.respond(
            ServiceMethod::Post,
            url,
            Some(&String::from_utf8_lossy(&data)),
        )
    }
}

const BASE: &str = "http://tracker.test/services/v3";

const STORIES_XML: &str = r#"<stories type="array">
  <story>
    <id type="integer">101</id>
    <project_id type="integer">7</project_id>
    <story_type>bug</story_type>
    <name>Crash on save</name>
    <current_state>started</current_state>
    <estimate nil="true"></estimate>
    <labels>ui,crash</labels>
  </story>
  <story>
    <id type="integer">102</id>
    <project_id type="integer">7</project_id>
    <story_type>chore</story_type>
    <name>Upgrade deps</name>
    <current_state>unstarted</current_state>
    <estimate type="integer">1</estimate>
  </story>
</stories>"#;

const BUGS_XML: &str = r#"<stories type="array">
  <story>
    <id type="integer">101</id>
    <project_id type="integer">7</project_id>
    <story_type>bug</story_type>
    <name>Crash on save</name>
  </story>
</stories>"#;

const UPDATED_STORY_XML: &str = r#"<story>
  <id type="integer">101</id>
  <project_id type="integer">7</project_id>
  <story_type>bug</story_type>
  <url>http://tracker.test/story/show/101</url>
  <name>Crash on save (fixed)</name>
  <description>Null deref in writer</description>
  <requested_by>Ada</requested_by>
  <owned_by>Grace</owned_by>
  <current_state>finished</current_state>
  <estimate type="integer">2</estimate>
  <labels>ui</labels>
  <created_at type="datetime">2024/03/01 14:05:09 UTC</created_at>
  <accepted_at nil="true"></accepted_at>
</story>"#;

const TASKS_XML: &str = r#"<tasks type="array">
  <task>
    <id type="integer">1</id>
    <description>Reproduce</description>
    <position>1</position>
    <complete>true</complete>
    <created_at type="datetime">2024/03/01 09:00:00 UTC</created_at>
  </task>
  <task>
    <id type="integer">2</id>
    <description>Fix</description>
    <position>2</position>
    <complete>false</complete>
    <created_at type="datetime">2024/03/01 09:01:00 UTC</created_at>
  </task>
</tasks>"#;

fn config() -> ClientConfig {
    ClientConfig {
        base_url: BASE.to_string(),
        secure_base_url: BASE.to_string(),
        ..Default::default()
    }
}

fn client(transport: RecordingTransport) -> TrackerClient<RecordingTransport> {
    TrackerClient::new(transport, config(), "secret")
}

fn fetch_count(client: &TrackerClient<RecordingTransport>) -> usize {
    client
        .transport()
        .calls()
        .iter()
        .filter(|c| c.method == ServiceMethod::Get)
        .count()
}

/// Decoded query parameters of a recorded URL
fn query(url: &str) -> Vec<(String, String)> {
    reqwest::Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn param(url: &str, name: &str) -> Option<String> {
    query(url).into_iter().find(|(k, _)| k == name).map(|(_, v)| v)
}

fn story_routes() -> RecordingTransport {
    RecordingTransport::default().route(ServiceMethod::Get, "/projects/7/stories", STORIES_XML)
}

#[tokio::test]
async fn test_authenticate_uses_secure_endpoint() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Get,
        "/tokens/active",
        "<token><guid>abc123</guid><id type=\"integer\">4</id></token>",
    );
    let client = TrackerClient::authenticate_with(transport, config(), "ada", "pw")
        .await
        .unwrap();

    assert_eq!(client.token(), "abc123");
    let calls = client.transport().calls();
    assert_eq!(calls[0].url, format!("{}/tokens/active", BASE));
    assert_eq!(calls[0].payload.as_deref(), Some("ada"));
}

#[tokio::test]
async fn test_token_is_sent_as_query_parameter() {
    let client = client(story_routes());
    client.fetch_stories(7, None).await.unwrap();

    let calls = client.transport().calls();
    assert_eq!(calls[0].url, format!("{}/projects/7/stories?token=secret", BASE));
}

#[tokio::test]
async fn test_filter_appended_after_token() {
    let client = client(story_routes());
    let filter = StoryFilter::new().story_type(StoryType::Bug).label("ui");
    client.fetch_stories(7, Some(&filter)).await.unwrap();

    let calls = client.transport().calls();
    assert_eq!(
        query(&calls[0].url),
        vec![
            ("token".to_string(), "secret".to_string()),
            ("filter".to_string(), "type:bug label:ui".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_filter_reserved_characters_are_encoded() {
    let client = client(story_routes());
    let filter = StoryFilter::new().label("R&D #1").external_id("a+b%");
    client.fetch_stories(7, Some(&filter)).await.unwrap();

    let url = &client.transport().calls()[0].url;
    let parsed = reqwest::Url::parse(url).unwrap();
    assert_eq!(parsed.fragment(), None);
    assert_eq!(parsed.path(), "/services/v3/projects/7/stories");
    assert_eq!(
        query(url),
        vec![
            ("token".to_string(), "secret".to_string()),
            ("filter".to_string(), "label:R&D #1 external_id:a+b%".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_stories_decode_from_service_shape() {
    let client = client(story_routes());
    let stories = client.fetch_stories(7, None).await.unwrap();

    assert_eq!(stories.len(), 2);
    assert_eq!(stories[0].kind(), StoryType::Bug);
    assert_eq!(stories[0].state(), StoryState::Started);
    assert_eq!(stories[0].estimate, None);
    assert_eq!(stories[0].labels.value(), &vec!["ui".to_string(), "crash".to_string()]);
    assert_eq!(stories[1].estimate, Some(1));
}

#[tokio::test]
async fn test_project_live_fetch_leaves_cache_empty() {
    let client = client(story_routes());
    let mut project = Project::new(7, "Demo");

    let stories = project
        .fetch_stories(&client, FetchOptions::live())
        .await
        .unwrap();

    assert_eq!(stories.len(), 2);
    assert_eq!(fetch_count(&client), 1);
    assert!(project.cached_stories().is_empty());
}

#[tokio::test]
async fn test_project_cached_read_skips_network() {
    let client = client(story_routes());
    let mut project = Project::new(7, "Demo");
    project
        .fetch_stories(&client, FetchOptions::refreshed())
        .await
        .unwrap();
    assert_eq!(fetch_count(&client), 1);

    let stories = project
        .fetch_stories(&client, FetchOptions::cached())
        .await
        .unwrap();
    assert_eq!(stories.len(), 2);
    assert_eq!(fetch_count(&client), 1);
}

#[tokio::test]
async fn test_project_refresh_without_cached_read_fetches_twice() {
    let transport = story_routes();
    let client = client(transport);
    let mut project = Project::new(7, "Demo");
    let options = FetchOptions {
        use_cached: false,
        refresh_cache: true,
    };

    let bugs = project.fetch_bugs(&client, options).await.unwrap();

    // the live fetch is filtered on the server, the refresh is not
    let calls = client.transport().calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(param(&calls[0].url, "filter"), None);
    assert_eq!(param(&calls[1].url, "filter").as_deref(), Some("type:bug"));
    assert_eq!(project.cached_stories().len(), 2);
    // the canned route ignores the query, so both stories come back
    assert_eq!(bugs.len(), 2);
}

#[tokio::test]
async fn test_cached_bug_fetch_filters_locally() {
    let client = client(story_routes());
    let mut project = Project::new(7, "Demo");

    let bugs = project
        .fetch_bugs(&client, FetchOptions::refreshed())
        .await
        .unwrap();
    assert_eq!(bugs.len(), 1);
    assert_eq!(bugs[0].id, Some(101));

    let chores = project
        .fetch_chores(&client, FetchOptions::cached())
        .await
        .unwrap();
    assert_eq!(chores.len(), 1);
    assert_eq!(chores[0].id, Some(102));

    let releases = project
        .fetch_releases(&client, FetchOptions::cached())
        .await
        .unwrap();
    assert!(releases.is_empty());
    assert_eq!(fetch_count(&client), 1);
}

#[tokio::test]
async fn test_live_bug_fetch_uses_server_filter() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Get,
        "/projects/7/stories",
        BUGS_XML,
    );
    let client = client(transport);
    let mut project = Project::new(7, "Demo");

    let bugs = project
        .fetch_bugs(&client, FetchOptions::live())
        .await
        .unwrap();
    assert_eq!(bugs.len(), 1);
    assert_eq!(
        param(&client.transport().calls()[0].url, "filter").as_deref(),
        Some("type:bug")
    );
}

#[tokio::test]
async fn test_project_without_id_is_rejected() {
    let client = client(story_routes());
    let mut project = Project::default();
    let err = project
        .fetch_stories(&client, FetchOptions::live())
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::MissingField(_)));
    assert!(client.transport().calls().is_empty());
}

#[tokio::test]
async fn test_fetch_project_with_stories() {
    let transport = story_routes().route(
        ServiceMethod::Get,
        "/projects/7",
        "<project><id>7</id><name>Demo</name><week_start_day>Monday</week_start_day></project>",
    );
    let client = client(transport);

    let project = client.fetch_project_with_stories(7).await.unwrap();
    assert_eq!(project.name.as_deref(), Some("Demo"));
    assert_eq!(project.week_start_index(), Some(1));
    assert_eq!(project.stories.as_ref().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_add_story_sends_sanitized_payload() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Post,
        "/projects/7/stories",
        UPDATED_STORY_XML,
    );
    let client = client(transport);

    let mut story = Story::new(StoryType::Bug, "Crash on save", "Null deref");
    story.id = Some(999);
    story.url = Some("http://elsewhere".to_string());
    let created = client.add_story(7, &story).await.unwrap();
    assert_eq!(created.id, Some(101));

    let calls = client.transport().calls();
    assert_eq!(calls[0].method, ServiceMethod::Post);
    let payload = calls[0].payload.as_deref().unwrap();
    assert_eq!(
        payload,
        "<story><story_type>bug</story_type><name>Crash on save</name><description>Null deref</description></story>"
    );
}

#[tokio::test]
async fn test_update_story_in_place_overwrites_every_field() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Put,
        "/projects/7/stories/101",
        UPDATED_STORY_XML,
    );
    let client = client(transport);

    let mut story = Story::new(StoryType::Bug, "Crash on save", "old description");
    story.id = Some(101);
    story.project_id = Some(7);
    story.estimate = Some(8);
    story.tasks = Some(vec![Task::new("stale")]);

    client.update_story_in_place(&mut story).await.unwrap();

    let expected = Story::from_document(&Document::parse(UPDATED_STORY_XML).unwrap()).unwrap();
    assert_eq!(story, expected);
    assert_eq!(story.name.as_deref(), Some("Crash on save (fixed)"));
    assert_eq!(story.estimate, Some(2));
    assert_eq!(story.state(), StoryState::Finished);
    assert!(story.tasks.is_none());
    assert_eq!(story.created_at.raw(), Some("2024/03/01 14:05:09 UTC"));

    let calls = client.transport().calls();
    assert_eq!(calls[0].method, ServiceMethod::Put);
    assert!(!calls[0].payload.as_deref().unwrap().contains("<id>"));
}

#[tokio::test]
async fn test_update_story_requires_ids() {
    let client = client(RecordingTransport::default());
    let story = Story::new(StoryType::Feature, "x", "y");
    let err = client.update_story(&story).await.unwrap_err();
    assert!(matches!(err, TrackerError::MissingField(_)));
}

#[tokio::test]
async fn test_load_tasks_and_delete_by_id() {
    let transport = RecordingTransport::default()
        .route(ServiceMethod::Get, "/projects/7/stories/101/tasks", TASKS_XML)
        .route(
            ServiceMethod::Delete,
            "/projects/7/stories/101/tasks/2",
            "<task><id>2</id><description>Fix</description></task>",
        );
    let client = client(transport);

    let mut story = Story::default();
    story.project_id = Some(7);
    story.id = Some(101);

    let tasks = client.load_tasks(&mut story).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].complete, Some(true));
    assert_eq!(story.tasks.as_ref().map(Vec::len), Some(2));

    let deleted = client.delete_task_by_id(7, 101, 2).await.unwrap();
    assert_eq!(deleted.id, Some(2));

    let calls = client.transport().calls();
    assert_eq!(calls[1].method, ServiceMethod::Delete);
    assert_eq!(calls[1].payload, None);
}

#[tokio::test]
async fn test_update_task_in_place() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Put,
        "/projects/7/stories/101/tasks/2",
        "<task><id>2</id><position>3</position><description>Fix it</description><complete>true</complete></task>",
    );
    let client = client(transport);

    let mut task = Task::new("Fix");
    task.id = Some(2);
    task.position = Some(2);
    client.update_task_in_place(7, 101, &mut task).await.unwrap();

    assert_eq!(task.position, Some(3));
    assert_eq!(task.description.as_deref(), Some("Fix it"));
    assert_eq!(task.complete, Some(true));

    let payload = client.transport().calls()[0].payload.clone().unwrap();
    assert_eq!(payload, "<task><description>Fix</description></task>");
}

#[tokio::test]
async fn test_add_note_and_attachment() {
    let transport = RecordingTransport::default()
        .route(
            ServiceMethod::Post,
            "/projects/7/stories/101/notes",
            "<note><id>5</id><text>Looks good</text><author>Ada</author><noted_at>2024/03/02 10:00:00 UTC</noted_at></note>",
        )
        .route(
            ServiceMethod::Post,
            "/projects/7/stories/101/attachments",
            "<attachment><id>9</id><status>Pending</status></attachment>",
        );
    let client = client(transport);

    let note = client
        .add_note(7, 101, "Looks good", Some("Ada"))
        .await
        .unwrap();
    assert_eq!(note.id, Some(5));

    let attachment = client
        .add_attachment(7, 101, Bytes::from_static(b"log contents"))
        .await
        .unwrap();
    assert_eq!(attachment.status.as_deref(), Some("Pending"));

    let calls = client.transport().calls();
    assert_eq!(
        calls[0].payload.as_deref(),
        Some("<note><text>Looks good</text><author>Ada</author></note>")
    );
    assert_eq!(calls[1].payload.as_deref(), Some("log contents"));
}

#[tokio::test]
async fn test_memberships() {
    let transport = RecordingTransport::default()
        .route(
            ServiceMethod::Get,
            "/projects/7/memberships",
            "<memberships><membership><id>1</id><person><name>Ada</name></person><role>Owner</role></membership></memberships>",
        )
        .route(
            ServiceMethod::Post,
            "/projects/7/memberships",
            "<membership><id>2</id><person><name>Grace</name></person><role>Member</role></membership>",
        );
    let client = client(transport);

    let members = client.fetch_memberships(7).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role.as_deref(), Some("Owner"));

    let added = client
        .add_membership(7, &Membership::new(Person::new("Grace", "grace@example.com"), "Member"))
        .await
        .unwrap();
    assert_eq!(added.id, Some(2));
}

#[tokio::test]
async fn test_iterations_group_and_paging() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Get,
        "/projects/7/iterations/done",
        r#"<iterations><iteration><id>1</id><number>1</number><stories><story><story_type>feature</story_type><estimate>3</estimate></story><story><story_type>bug</story_type></story></stories></iteration></iterations>"#,
    );
    let client = client(transport);

    let iterations = client
        .fetch_iterations(7, IterationGroup::Done, Some(5), Some(10))
        .await
        .unwrap();
    assert_eq!(iterations.len(), 1);
    assert_eq!(iterations[0].velocity(), 3);
    assert_eq!(
        client.transport().calls()[0].url,
        format!("{}/projects/7/iterations/done?token=secret&limit=5&offset=10", BASE)
    );
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let client = client(RecordingTransport::default());
    let err = client.fetch_story(7, 1).await.unwrap_err();
    assert!(matches!(err, TrackerError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_load_projects_on_token() {
    let transport = RecordingTransport::default().route(
        ServiceMethod::Get,
        "/projects",
        "<projects><project><id>7</id><name>Demo</name></project><project><id>8</id><name>Ops</name></project></projects>",
    );
    let client = client(transport);

    let mut token = tracker_core::UserToken::new("secret");
    let projects = token.load_projects(&client).await.unwrap();
    assert_eq!(projects.len(), 2);
    assert_eq!(token.projects.as_ref().unwrap()[1].name.as_deref(), Some("Ops"));
}
