use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use crate::error::Result;

/// Folds the values of one group into a single state.
pub trait Aggregator<V>: Sync {
    type State: Send;

    fn initialise(&self) -> Self::State;
    fn aggregate(&self, state: &mut Self::State, value: V);
}

///
/// Collection primitives blocking is expressed in. Implementations may run
/// any primitive in parallel; none of them guarantees an output order.
///
pub trait Processor: Sync {
    /// Maps every record to zero or more outputs. The first mapper error aborts the whole transform.
    fn transform<T, U, F>(&self, records: Vec<T>, mapper: F) -> Result<Vec<U>>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> Result<Vec<U>> + Sync + Send;

    /// Groups records by key and folds every group with `aggregator`.
    fn aggregate<K, V, A>(&self, records: Vec<(K, V)>, aggregator: &A) -> Vec<(K, A::State)>
    where
        K: Hash + Eq + Send,
        V: Send,
        A: Aggregator<V>;

    /// Equi-join on the key. Keys present on one side only produce nothing.
    fn join<K, L, R>(&self, left: Vec<(K, L)>, right: Vec<(K, R)>) -> Vec<(K, L, R)>
    where
        K: Hash + Eq + Clone + Send + Sync,
        L: Clone + Send + Sync,
        R: Clone + Send + Sync;

    fn filter<T, F>(&self, records: Vec<T>, predicate: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&T) -> bool + Sync + Send;

    fn append<T: Send>(&self, first: Vec<T>, second: Vec<T>) -> Vec<T>;

    /// Removes records equal under `T`'s own `Eq`.
    fn distinct<T>(&self, records: Vec<T>) -> Vec<T>
    where
        T: Hash + Eq + Send;
}

/// In-memory processor, sequential or backed by the rayon global pool.
#[derive(Clone, Copy, Debug)]
pub struct LocalProcessor {
    parallel: bool,
}

impl LocalProcessor {
    pub fn sequential() -> Self {
        LocalProcessor { parallel: false }
    }

    pub fn parallel() -> Self {
        LocalProcessor { parallel: true }
    }

    pub fn new(parallel: bool) -> Self {
        LocalProcessor { parallel }
    }
}

impl Default for LocalProcessor {
    fn default() -> Self {
        LocalProcessor::parallel()
    }
}

fn fold_group<V, A: Aggregator<V>>(aggregator: &A, values: Vec<V>) -> A::State {
    let mut state = aggregator.initialise();
    for value in values {
        aggregator.aggregate(&mut state, value);
    }
    state
}

fn index_by_key<K: Hash + Eq, R>(records: Vec<(K, R)>) -> FxHashMap<K, Vec<R>> {
    let mut index: FxHashMap<K, Vec<R>> = FxHashMap::default();
    for (key, record) in records {
        index.entry(key).or_insert_with(Vec::new).push(record);
    }
    index
}

impl Processor for LocalProcessor {
    fn transform<T, U, F>(&self, records: Vec<T>, mapper: F) -> Result<Vec<U>>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> Result<Vec<U>> + Sync + Send,
    {
        if self.parallel {
            let nested: Vec<Vec<U>> = records.into_par_iter().map(mapper).collect::<Result<_>>()?;
            Ok(nested.into_par_iter().flatten().collect())
        } else {
            let mut out = Vec::new();
            for record in records {
                out.extend(mapper(record)?);
            }
            Ok(out)
        }
    }

    fn aggregate<K, V, A>(&self, records: Vec<(K, V)>, aggregator: &A) -> Vec<(K, A::State)>
    where
        K: Hash + Eq + Send,
        V: Send,
        A: Aggregator<V>,
    {
        if self.parallel {
            let groups = records
                .into_par_iter()
                .fold(
                    || FxHashMap::default(),
                    |mut groups: FxHashMap<K, Vec<V>>, (key, value)| {
                        groups.entry(key).or_insert_with(Vec::new).push(value);
                        groups
                    },
                )
                .reduce(
                    || FxHashMap::default(),
                    |mut merged, partial| {
                        for (key, mut values) in partial {
                            merged.entry(key).or_insert_with(Vec::new).append(&mut values);
                        }
                        merged
                    },
                );
            groups
                .into_par_iter()
                .map(|(key, values)| (key, fold_group(aggregator, values)))
                .collect()
        } else {
            index_by_key(records)
                .into_iter()
                .map(|(key, values)| (key, fold_group(aggregator, values)))
                .collect()
        }
    }

    fn join<K, L, R>(&self, left: Vec<(K, L)>, right: Vec<(K, R)>) -> Vec<(K, L, R)>
    where
        K: Hash + Eq + Clone + Send + Sync,
        L: Clone + Send + Sync,
        R: Clone + Send + Sync,
    {
        let index = index_by_key(right);
        let matches = |(key, l): (K, L)| -> Vec<(K, L, R)> {
            match index.get(&key) {
                Some(rights) => rights
                    .iter()
                    .map(|r| (key.clone(), l.clone(), r.clone()))
                    .collect(),
                None => Vec::new(),
            }
        };
        if self.parallel {
            left.into_par_iter().flat_map_iter(matches).collect()
        } else {
            left.into_iter().flat_map(matches).collect()
        }
    }

    fn filter<T, F>(&self, records: Vec<T>, predicate: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&T) -> bool + Sync + Send,
    {
        if self.parallel {
            records.into_par_iter().filter(predicate).collect()
        } else {
            records.into_iter().filter(predicate).collect()
        }
    }

    fn append<T: Send>(&self, mut first: Vec<T>, second: Vec<T>) -> Vec<T> {
        first.extend(second);
        first
    }

    fn distinct<T>(&self, records: Vec<T>) -> Vec<T>
    where
        T: Hash + Eq + Send,
    {
        let unique: FxHashSet<T> = if self.parallel {
            records.into_par_iter().collect()
        } else {
            records.into_iter().collect()
        };
        unique.into_iter().collect()
    }
}
