// ABOUTME: Phantom-typed identifiers for scheduler objects.
// ABOUTME: Keeps evaluation, deployment, and allocation IDs from being mixed up.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Marker types for phantom type parameters.
/// Empty enums cannot be instantiated and need no trait bounds.
pub enum EvaluationMarker {}
pub enum DeploymentMarker {}
pub enum AllocationMarker {}

/// Length of the prefix shown by [`Id::short`], matching the scheduler CLI.
const SHORT_LEN: usize = 8;

/// An opaque scheduler identifier tagged with the kind of object it names.
///
/// An `EvalId` cannot be passed where a `DeploymentId` is expected even though
/// both are UUID strings on the wire.
#[must_use = "IDs reference scheduler objects and should not be ignored"]
pub struct Id<T> {
    value: String,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _marker: PhantomData,
        }
    }

    /// Builds an ID from a response field, treating an empty string as absent.
    pub fn from_field(value: &str) -> Option<Self> {
        if value.is_empty() {
            None
        } else {
            Some(Self::new(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// First eight characters, as printed by `nomad status`.
    pub fn short(&self) -> &str {
        match self.value.char_indices().nth(SHORT_LEN) {
            Some((end, _)) => &self.value[..end],
            None => &self.value,
        }
    }
}

// Implemented by hand so `T` needs none of these traits.

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Id").field(&self.value).finish()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

pub type EvalId = Id<EvaluationMarker>;
pub type DeploymentId = Id<DeploymentMarker>;
pub type AllocationId = Id<AllocationMarker>;
