//! Synchronized wire fields
//!
//! Some fields travel as plain strings but are richer in meaning: timestamps,
//! comma-joined label lists and enumerations. A [`Synced`] value owns both
//! the raw wire string and the typed value; the only way to change either is
//! through a setter that re-derives the other, so the two views never drift.
//!
//! How the raw form is decoded is decided by a [`FieldCodec`]:
//!
//! - [`TimestampCodec`] never fails; malformed input decodes to the zero
//!   timestamp ([`zero_timestamp`]).
//! - [`LabelCodec`] splits on commas.
//! - [`crate::models::StoryType`] is strict and rejects unknown symbols.
//! - [`crate::models::StoryState`] is lenient and falls back to `Unknown`.

use crate::error::{Result, TrackerError};
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt::Debug;

/// Timestamp layout used on the wire, without the zone suffix
pub const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Zone suffix appended to every outgoing timestamp
pub const TIMESTAMP_SUFFIX: &str = " UTC";

/// Converts between the raw wire string and a typed value
pub trait FieldCodec {
    type Value: Clone + Debug + Default + PartialEq;

    /// Decode a raw wire string
    fn decode(raw: &str) -> Result<Self::Value>;

    /// Canonical wire form of a typed value
    fn encode(value: &Self::Value) -> String;
}

/// A field kept in both raw and typed form
pub struct Synced<C: FieldCodec> {
    raw: Option<String>,
    value: C::Value,
}

impl<C: FieldCodec> Synced<C> {
    /// Absent on the wire; typed value is the codec's default
    pub fn empty() -> Self {
        Self {
            raw: None,
            value: C::Value::default(),
        }
    }

    pub fn from_value(value: C::Value) -> Self {
        let mut field = Self::empty();
        field.set_value(value);
        field
    }

    pub fn from_raw(raw: impl Into<String>) -> Result<Self> {
        let mut field = Self::empty();
        field.set_raw(raw)?;
        Ok(field)
    }

    /// Raw wire string, `None` when the field was never set
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn value(&self) -> &C::Value {
        &self.value
    }

    /// Set the raw wire string and re-derive the typed value.
    ///
    /// When decoding fails, neither view changes.
    pub fn set_raw(&mut self, raw: impl Into<String>) -> Result<()> {
        let raw = raw.into();
        let value = C::decode(&raw)?;
        self.raw = Some(raw);
        self.value = value;
        Ok(())
    }

    /// Set the typed value and regenerate the raw wire string
    pub fn set_value(&mut self, value: C::Value) {
        self.raw = Some(C::encode(&value));
        self.value = value;
    }

    /// Back to the absent state
    pub fn clear(&mut self) {
        self.raw = None;
        self.value = C::Value::default();
    }
}

impl<C: FieldCodec> Default for Synced<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C: FieldCodec> Clone for Synced<C> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            value: self.value.clone(),
        }
    }
}

impl<C: FieldCodec> PartialEq for Synced<C> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.value == other.value
    }
}

impl<C: FieldCodec> Debug for Synced<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synced")
            .field("raw", &self.raw)
            .field("value", &self.value)
            .finish()
    }
}

impl<C: FieldCodec> Serialize for Synced<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Zero value for timestamps that could not be decoded
pub fn zero_timestamp() -> NaiveDateTime {
    NaiveDateTime::default()
}

/// `yyyy/MM/dd HH:mm:ss` followed by a 3-4 character zone marker
pub struct TimestampCodec;

impl FieldCodec for TimestampCodec {
    type Value = NaiveDateTime;

    fn decode(raw: &str) -> Result<NaiveDateTime> {
        // The last four characters are the zone marker (" UTC", " PST", ...)
        let cut = match raw.char_indices().rev().nth(3) {
            Some((idx, _)) if idx > 0 => idx,
            _ => {
                tracing::debug!("Timestamp {:?} too short, using zero value", raw);
                return Ok(zero_timestamp());
            }
        };

        match NaiveDateTime::parse_from_str(&raw[..cut], TIMESTAMP_FORMAT) {
            Ok(ts) => Ok(ts),
            Err(e) => {
                tracing::warn!("Unparseable timestamp {:?} ({}), using zero value", raw, e);
                Ok(zero_timestamp())
            }
        }
    }

    fn encode(value: &NaiveDateTime) -> String {
        format!("{}{}", value.format(TIMESTAMP_FORMAT), TIMESTAMP_SUFFIX)
    }
}

/// Comma-joined label list
///
/// An empty raw string decodes to `[""]`, so every non-empty list survives
/// an encode/decode round trip, including `[""]` itself.
pub struct LabelCodec;

impl FieldCodec for LabelCodec {
    type Value = Vec<String>;

    fn decode(raw: &str) -> Result<Vec<String>> {
        Ok(raw.split(',').map(str::to_string).collect())
    }

    fn encode(value: &Vec<String>) -> String {
        value.join(",")
    }
}

/// Synchronized timestamp field
pub type Timestamp = Synced<TimestampCodec>;

/// Synchronized label list field
pub type Labels = Synced<LabelCodec>;

impl Labels {
    /// Labels from a list of values
    pub fn from_list<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_value(labels.into_iter().map(Into::into).collect())
    }
}

impl Timestamp {
    /// Decode a raw timestamp; never fails
    pub fn parse_lenient(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = TimestampCodec::decode(&raw).unwrap_or_else(|_| zero_timestamp());
        Self {
            raw: Some(raw),
            value,
        }
    }
}

/// Decode a closed set of lowercase wire symbols
pub(crate) fn decode_symbol<T: Copy>(
    field: &'static str,
    raw: &str,
    symbols: &[(&str, T)],
) -> Result<T> {
    symbols
        .iter()
        .find(|(s, _)| *s == raw)
        .map(|(_, v)| *v)
        .ok_or_else(|| TrackerError::InvalidField {
            field,
            value: raw.to_string(),
        })
}
