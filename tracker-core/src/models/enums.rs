//! Closed value sets used by stories and iterations

use crate::error::{Result, TrackerError};
use crate::fields::{FieldCodec, Synced, decode_symbol};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Kind of story
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryType {
    #[default]
    Feature,
    Chore,
    Bug,
    Release,
}

impl StoryType {
    const SYMBOLS: [(&'static str, StoryType); 4] = [
        ("feature", StoryType::Feature),
        ("chore", StoryType::Chore),
        ("bug", StoryType::Bug),
        ("release", StoryType::Release),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::Feature => "feature",
            StoryType::Chore => "chore",
            StoryType::Bug => "bug",
            StoryType::Release => "release",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StoryType {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        decode_symbol("story_type", s, &Self::SYMBOLS)
    }
}

/// Unknown story types are rejected.
impl FieldCodec for StoryType {
    type Value = StoryType;

    fn decode(raw: &str) -> Result<StoryType> {
        raw.parse()
    }

    fn encode(value: &StoryType) -> String {
        value.as_str().to_string()
    }
}

/// Workflow state of a story
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryState {
    #[default]
    Unknown,
    Unscheduled,
    Unstarted,
    Started,
    Finished,
    Delivered,
    Accepted,
    Rejected,
}

impl StoryState {
    const SYMBOLS: [(&'static str, StoryState); 8] = [
        ("unknown", StoryState::Unknown),
        ("unscheduled", StoryState::Unscheduled),
        ("unstarted", StoryState::Unstarted),
        ("started", StoryState::Started),
        ("finished", StoryState::Finished),
        ("delivered", StoryState::Delivered),
        ("accepted", StoryState::Accepted),
        ("rejected", StoryState::Rejected),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryState::Unknown => "unknown",
            StoryState::Unscheduled => "unscheduled",
            StoryState::Unstarted => "unstarted",
            StoryState::Started => "started",
            StoryState::Finished => "finished",
            StoryState::Delivered => "delivered",
            StoryState::Accepted => "accepted",
            StoryState::Rejected => "rejected",
        }
    }

    /// Case-insensitive lookup; anything unrecognized is `Unknown`
    pub fn parse_lenient(raw: &str) -> StoryState {
        decode_symbol("current_state", &raw.trim().to_ascii_lowercase(), &Self::SYMBOLS)
            .unwrap_or(StoryState::Unknown)
    }
}

impl fmt::Display for StoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for StoryState {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        decode_symbol("current_state", &s.to_ascii_lowercase(), &Self::SYMBOLS)
    }
}

/// Unknown states resolve to [`StoryState::Unknown`].
impl FieldCodec for StoryState {
    type Value = StoryState;

    fn decode(raw: &str) -> Result<StoryState> {
        let state = StoryState::parse_lenient(raw);
        if state == StoryState::Unknown && !raw.eq_ignore_ascii_case("unknown") {
            tracing::warn!("Unrecognized story state {:?}, treating as unknown", raw);
        }
        Ok(state)
    }

    fn encode(value: &StoryState) -> String {
        value.as_str().to_string()
    }
}

/// Synchronized story type field
pub type StoryTypeField = Synced<StoryType>;

/// Synchronized story state field
pub type StoryStateField = Synced<StoryState>;

/// Which iterations to fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IterationGroup {
    #[default]
    All,
    Done,
    Current,
    Backlog,
}

impl IterationGroup {
    /// Path segment selecting this group; `All` has none
    pub fn path_segment(&self) -> Option<&'static str> {
        match self {
            IterationGroup::All => None,
            IterationGroup::Done => Some("done"),
            IterationGroup::Current => Some("current"),
            IterationGroup::Backlog => Some("backlog"),
        }
    }
}

impl FromStr for IterationGroup {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        decode_symbol(
            "iteration_group",
            &s.to_ascii_lowercase(),
            &[
                ("all", IterationGroup::All),
                ("done", IterationGroup::Done),
                ("current", IterationGroup::Current),
                ("backlog", IterationGroup::Backlog),
            ],
        )
    }
}
