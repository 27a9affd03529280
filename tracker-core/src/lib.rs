//! Tracker Client Core Library
//!
//! Client for a project-tracking web service exchanging XML documents:
//! - Wire document model (Element, Document)
//! - Synchronized raw/typed fields (timestamps, label lists, enums)
//! - Submission sanitizer stripping service-owned fields and null markers
//! - Collection cache policy for project stories
//! - Entity models (projects, stories, tasks, notes, iterations, ...)
//! - Transport abstraction with a reqwest implementation
//! - Client operations and configuration

pub mod cache;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod filter;
pub mod models;
pub mod sanitize;
pub mod transport;
pub mod wire;

pub use cache::{CollectionCache, FetchOptions};
pub use client::TrackerClient;
pub use config::ClientConfig;
pub use document::{Document, Element};
pub use error::{Result, TrackerError};
pub use fields::{FieldCodec, LabelCodec, Labels, Synced, Timestamp, TimestampCodec};
pub use filter::StoryFilter;
pub use models::{
    Attachment, Iteration, IterationGroup, Membership, Note, Person, Project, Story, StoryState,
    StoryStateField, StoryType, StoryTypeField, Task, UserToken,
};
pub use sanitize::{sanitize, submission_payload};
pub use transport::{HttpTransport, ServiceMethod, Transport};
pub use wire::{EntityDescriptor, WireEntity, decode_list};
