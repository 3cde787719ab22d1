use rustc_hash::FxHashMap;

use crate::correspondence::SchemaLink;
use crate::matchable::{Dataset, Matchable, SourceId};

/// Side of a schema correspondence a record is matched against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    First,
    Second,
}

impl Role {
    /// Both roles, for single-dataset blocking where a record's side is unknown.
    pub const BOTH: [Role; 2] = [Role::First, Role::Second];
}

///
/// Index of schema correspondences by the source identifier of each side,
/// used to attach the applicable correspondences to every record.
///
pub struct CorrespondenceJoiner<C> {
    by_first: FxHashMap<SourceId, Vec<C>>,
    by_second: FxHashMap<SourceId, Vec<C>>,
}

impl<C: SchemaLink + Clone> CorrespondenceJoiner<C> {
    pub fn new(correspondences: &[C]) -> Self {
        let mut by_first: FxHashMap<SourceId, Vec<C>> = FxHashMap::default();
        let mut by_second: FxHashMap<SourceId, Vec<C>> = FxHashMap::default();
        for correspondence in correspondences {
            by_first
                .entry(correspondence.first_source())
                .or_insert_with(Vec::new)
                .push(correspondence.clone());
            by_second
                .entry(correspondence.second_source())
                .or_insert_with(Vec::new)
                .push(correspondence.clone());
        }
        CorrespondenceJoiner {
            by_first,
            by_second,
        }
    }

    /// Correspondences whose `role` side comes from `source`. Empty if there are none.
    pub fn applicable(&self, source: SourceId, role: Role) -> &[C] {
        let index = match role {
            Role::First => &self.by_first,
            Role::Second => &self.by_second,
        };
        index.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pairs every record with its applicable correspondences, once per role.
    pub fn combine<'a, R: Matchable>(
        &'a self,
        dataset: &'a Dataset<R>,
        roles: &[Role],
    ) -> Vec<(&'a R, &'a [C])> {
        dataset
            .records()
            .iter()
            .flat_map(|record| {
                roles.iter().map(move |&role| {
                    (record, self.applicable(record.data_source_identifier(), role))
                })
            })
            .collect()
    }
}
