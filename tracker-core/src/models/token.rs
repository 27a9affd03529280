//! API token issued for a login

use crate::client::TrackerClient;
use crate::document::Element;
use crate::error::Result;
use crate::transport::Transport;
use crate::wire::{EntityDescriptor, FieldWriter, WireEntity, read_int, read_text};
use serde::Serialize;

use super::project::Project;

/// Active API token for an account
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserToken {
    pub guid: Option<String>,
    pub id: Option<i64>,
    /// Projects loaded with [`UserToken::load_projects`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
}

impl UserToken {
    pub fn new(guid: impl Into<String>) -> Self {
        Self {
            guid: Some(guid.into()),
            ..Default::default()
        }
    }

    /// Projects of the account behind `client`
    pub async fn fetch_projects<T: Transport>(&self, client: &TrackerClient<T>) -> Result<Vec<Project>> {
        client.fetch_projects().await
    }

    /// Fetch the account's projects and keep them in [`UserToken::projects`]
    pub async fn load_projects<T: Transport>(&mut self, client: &TrackerClient<T>) -> Result<&[Project]> {
        let projects = client.fetch_projects().await?;
        let projects = self.projects.insert(projects);
        Ok(projects.as_slice())
    }
}

impl WireEntity for UserToken {
    const DESCRIPTOR: EntityDescriptor = EntityDescriptor {
        root: "token",
        excluded: &[],
        drop_null_markers: true,
    };

    fn to_element(&self) -> Element {
        FieldWriter::new(Self::DESCRIPTOR.root)
            .text("guid", self.guid.as_deref())
            .int("id", self.id)
            .finish()
    }

    fn from_element(element: &Element) -> Result<Self> {
        Ok(Self {
            guid: read_text(element, "guid"),
            id: read_int(element, "id")?,
            projects: None,
        })
    }
}
