//! Story search filters
//!
//! The service narrows story listings with a single `filter` query
//! parameter holding space-separated `name:value` terms, for example
//! `filter=type:bug label:ui`.

use crate::models::{StoryState, StoryType};
use chrono::NaiveDate;

const DATE_FORMAT: &str = "%m/%d/%Y";

/// Builder for the `filter` query parameter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryFilter {
    terms: Vec<String>,
}

impl StoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    fn term(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.terms.push(format!("{}:{}", name, value.as_ref()));
        self
    }

    fn joined<I, S>(values: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn label(self, label: &str) -> Self {
        self.term("label", label)
    }

    /// Stories carrying any of the labels
    pub fn labels<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.term("label", Self::joined(labels))
    }

    pub fn story_type(self, story_type: StoryType) -> Self {
        self.term("type", story_type.as_str())
    }

    pub fn ids(self, ids: &[i64]) -> Self {
        self.term("id", Self::joined(ids))
    }

    pub fn state(self, state: StoryState) -> Self {
        self.term("state", state.as_str())
    }

    pub fn states(self, states: &[StoryState]) -> Self {
        self.term("state", Self::joined(states.iter().map(StoryState::as_str)))
    }

    pub fn created_since(self, date: NaiveDate) -> Self {
        self.term("created_since", date.format(DATE_FORMAT).to_string())
    }

    pub fn modified_since(self, date: NaiveDate) -> Self {
        self.term("modified_since", date.format(DATE_FORMAT).to_string())
    }

    pub fn external_id(self, id: &str) -> Self {
        self.term("external_id", id)
    }

    pub fn external_ids(self, ids: &[i64]) -> Self {
        self.term("external_id", Self::joined(ids))
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The filter expression without the `filter=` prefix
    pub fn expression(&self) -> String {
        self.terms.join(" ")
    }

    /// `filter` query parameter, `None` when no term was added.
    /// The value is unencoded; the client encodes it when building the URL.
    pub fn query_pair(&self) -> Option<(&'static str, String)> {
        if self.is_empty() {
            None
        } else {
            Some(("filter", self.expression()))
        }
    }
}
