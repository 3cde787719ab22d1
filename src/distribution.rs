use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::debug;

use crate::error::Result;
use crate::generator::BlockingKeyGenerator;
use crate::matchable::Matchable;
use crate::processing::{Aggregator, Processor};

///
/// Distinct blocked elements of one blocking key, each with the union of the
/// correspondences of every record that produced it.
///
/// Elements are identified by their own `Eq`; the causes never take part in
/// that identity.
///
#[derive(Clone, Debug)]
pub struct Distribution<B, C> {
    elements: FxHashMap<B, BTreeSet<C>>,
}

impl<B: Hash + Eq, C: Ord> Distribution<B, C> {
    pub fn new() -> Self {
        Distribution {
            elements: FxHashMap::default(),
        }
    }

    /// Adds `element`, merging `causes` into what is already known for it.
    pub fn add<I: IntoIterator<Item = C>>(&mut self, element: B, causes: I) {
        self.elements
            .entry(element)
            .or_insert_with(BTreeSet::new)
            .extend(causes);
    }

    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&B, &BTreeSet<C>)> {
        self.elements.iter()
    }

    /// Elements sorted by source identifier, then by their natural order.
    pub fn into_sorted(self) -> Vec<(B, BTreeSet<C>)>
    where
        B: Matchable + Ord,
    {
        let mut entries: Vec<(B, BTreeSet<C>)> = self.elements.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| {
            a.data_source_identifier()
                .cmp(&b.data_source_identifier())
                .then_with(|| a.cmp(b))
        });
        entries
    }
}

impl<B: Hash + Eq, C: Ord> Default for Distribution<B, C> {
    fn default() -> Self {
        Distribution::new()
    }
}

/// Builds a [`Distribution`] from `(blocked element, correspondences)` values.
pub struct DistributionAggregator<B, C> {
    _types: PhantomData<fn() -> (B, C)>,
}

impl<B, C> DistributionAggregator<B, C> {
    pub fn new() -> Self {
        DistributionAggregator {
            _types: PhantomData,
        }
    }
}

impl<B, C> Default for DistributionAggregator<B, C> {
    fn default() -> Self {
        DistributionAggregator::new()
    }
}

impl<'a, B, C> Aggregator<(B, &'a [C])> for DistributionAggregator<B, C>
where
    B: Hash + Eq + Send,
    C: Ord + Clone + Send,
{
    type State = Distribution<B, C>;

    fn initialise(&self) -> Distribution<B, C> {
        Distribution::new()
    }

    fn aggregate(&self, state: &mut Distribution<B, C>, (element, causes): (B, &'a [C])) {
        state.add(element, causes.iter().cloned());
    }
}

/// Blocking key together with the distribution of elements that produced it.
pub type GroupedDistribution<K, B, C> = (K, Distribution<B, C>);

///
/// Applies `generator` to every `(record, correspondences)` pair and groups
/// the results by blocking key.
///
/// ## Arguments
///
/// * `processor` - Substrate running the fan-out and the aggregation.
/// * `combined` - Records with their applicable schema correspondences.
/// * `generator` - The blocking-key strategy. Its first error aborts grouping.
///
pub fn group_by_blocking_key<P, R, C, G>(
    processor: &P,
    combined: Vec<(&R, &[C])>,
    generator: &G,
) -> Result<Vec<GroupedDistribution<G::Key, G::Blocked, C>>>
where
    P: Processor,
    R: Sync,
    C: Ord + Clone + Send + Sync,
    G: BlockingKeyGenerator<R, C>,
{
    let start = Instant::now();
    let inputs = combined.len();
    let keyed = processor.transform(combined, |(record, correspondences)| {
        let keys = generator.generate_blocking_keys(record, correspondences)?;
        Ok(keys
            .into_iter()
            .map(|(key, blocked)| (key, (blocked, correspondences)))
            .collect())
    })?;
    let emitted = keyed.len();
    let grouped = processor.aggregate(keyed, &DistributionAggregator::new());
    debug!(
        "Grouped {} inputs ({} key emissions) into {} blocks in {:.4} secs",
        inputs,
        emitted,
        grouped.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(grouped)
}
