use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Integer tag of the dataset a record originates from.
pub type SourceId = u32;

/// Identity shared by everything that flows through blocking.
pub trait Matchable {
    fn identifier(&self) -> &str;
    fn data_source_identifier(&self) -> SourceId;
}

/// Ordered collection of records.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dataset<R> {
    records: Vec<R>,
}

impl<R> Dataset<R> {
    pub fn new(records: Vec<R>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R: Matchable> Dataset<R> {
    pub fn source_identifiers(&self) -> FxHashSet<SourceId> {
        self.records
            .iter()
            .map(Matchable::data_source_identifier)
            .collect()
    }
}

impl<R> FromIterator<R> for Dataset<R> {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Dataset::new(iter.into_iter().collect())
    }
}

impl<R> From<Vec<R>> for Dataset<R> {
    fn from(records: Vec<R>) -> Self {
        Dataset::new(records)
    }
}
