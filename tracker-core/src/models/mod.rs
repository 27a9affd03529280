//! Domain entities exchanged with the tracker service

pub mod attachment;
pub mod enums;
pub mod iteration;
pub mod note;
pub mod person;
pub mod project;
pub mod story;
pub mod task;
pub mod token;

pub use attachment::Attachment;
pub use enums::{IterationGroup, StoryState, StoryStateField, StoryType, StoryTypeField};
pub use iteration::Iteration;
pub use note::Note;
pub use person::{Membership, Person};
pub use project::Project;
pub use story::Story;
pub use task::Task;
pub use token::UserToken;
