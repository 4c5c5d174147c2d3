//! Tri-state values for JSON fields.
//!
//! A [`Nullable`] distinguishes a field that was never set (omitted from the
//! payload), a field explicitly set to `null`, and a field carrying a value.
//! PATCH bodies rely on the distinction: omission leaves a setting alone while
//! `null` clears it.
//!
//! Pair the type with `#[serde(default, skip_serializing_if = "Nullable::is_absent")]`
//! on the enclosing field so that absence survives a round trip.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value that may be absent, explicitly null, or set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Nullable<T> {
    /// Not present; the field is omitted on the wire.
    #[default]
    Absent,
    /// Present and explicitly `null`.
    Null,
    /// Present with a value.
    Value(T),
}

impl<T> Nullable<T> {
    /// Creates a present value.
    #[must_use]
    pub const fn new(value: T) -> Self {
        Self::Value(value)
    }

    /// Converts an option: `Some(v)` becomes a value, `None` an explicit null.
    #[must_use]
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }

    /// Returns `(value, is_present, is_null)`.
    #[must_use]
    pub const fn get(&self) -> (Option<&T>, bool, bool) {
        match self {
            Self::Absent => (None, false, false),
            Self::Null => (None, true, true),
            Self::Value(value) => (Some(value), true, false),
        }
    }

    /// Stores a value, marking the field present.
    pub fn set(&mut self, value: T) {
        *self = Self::Value(value);
    }

    /// Marks the field present and explicitly null.
    pub fn set_nil(&mut self) {
        *self = Self::Null;
    }

    /// Marks the field absent.
    pub fn unset(&mut self) {
        *self = Self::Absent;
    }

    /// True when the field is present, null or not.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// True when the field is absent.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// True when the field is present and null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The value, if one is set.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Consumes the wrapper and returns the value, if one is set.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Maps the inner value, keeping absence and nullness.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Nullable<U> {
        match self {
            Self::Absent => Nullable::Absent,
            Self::Null => Nullable::Null,
            Self::Value(value) => Nullable::Value(f(value)),
        }
    }

    /// Borrows the inner value.
    #[must_use]
    pub const fn as_ref(&self) -> Nullable<&T> {
        match self {
            Self::Absent => Nullable::Absent,
            Self::Null => Nullable::Null,
            Self::Value(value) => Nullable::Value(value),
        }
    }
}

impl<T> From<T> for Nullable<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Absent fields are normally skipped by the container; emitting
            // null keeps standalone serialization well formed.
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Value(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::from_option(Option::<T>::deserialize(deserializer)?))
    }
}
