use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::matchable::{Matchable, SourceId};

/// Similarity assigned to every candidate pair; scoring happens downstream.
pub const BLOCKING_SIMILARITY: f64 = 1.0;

///
/// Typed link between two elements, with a similarity score and the
/// correspondences that justify it.
///
/// Equality and hashing are structural over all four parts.
///
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Correspondence<T, C = ()> {
    first: T,
    second: T,
    similarity: OrderedFloat<f64>,
    causes: Vec<C>,
}

impl<T, C> Correspondence<T, C> {
    pub fn new(first: T, second: T, similarity: f64, causes: Vec<C>) -> Self {
        Correspondence {
            first,
            second,
            similarity: OrderedFloat(similarity),
            causes,
        }
    }

    pub fn without_causes(first: T, second: T, similarity: f64) -> Self {
        Self::new(first, second, similarity, Vec::new())
    }

    pub fn first(&self) -> &T {
        &self.first
    }

    pub fn second(&self) -> &T {
        &self.second
    }

    pub fn similarity(&self) -> f64 {
        self.similarity.into_inner()
    }

    pub fn causes(&self) -> &[C] {
        &self.causes
    }
}

/// A schema-level correspondence, seen only through the sources of its two endpoints.
pub trait SchemaLink {
    fn first_source(&self) -> SourceId;
    fn second_source(&self) -> SourceId;

    /// True when the endpoints' sources are exactly the set `{a, b}`.
    fn connects(&self, a: SourceId, b: SourceId) -> bool {
        source_set(self.first_source(), self.second_source()) == source_set(a, b)
    }
}

impl<T: Matchable, X> SchemaLink for Correspondence<T, X> {
    fn first_source(&self) -> SourceId {
        self.first.data_source_identifier()
    }

    fn second_source(&self) -> SourceId {
        self.second.data_source_identifier()
    }
}

// sorted pair; {a, a} collapses to (a, a)
#[inline]
fn source_set(a: SourceId, b: SourceId) -> (SourceId, SourceId) {
    (a.min(b), a.max(b))
}
