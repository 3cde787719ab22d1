use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::hash::Hash;
use std::time::Instant;
use tracing::{debug, info};

use crate::correspondence::{Correspondence, SchemaLink, BLOCKING_SIMILARITY};
use crate::distribution::group_by_blocking_key;
use crate::dto::BlockingConfig;
use crate::error::{BlockingError, Result};
use crate::generator::BlockingKeyGenerator;
use crate::joiner::{CorrespondenceJoiner, Role};
use crate::matchable::{Dataset, Matchable, SourceId};
use crate::processing::{LocalProcessor, Processor};
use crate::report::{
    distinct_pairs, largest_blocks, reduction_ratio, unordered_pairs, BlockSize, BlockingReport,
    BlockingResult,
};

///
/// Blocker based on blocking keys: all elements for which the same key is
/// generated are returned as candidate pairs.
///
/// `G1` derives keys for the first (or only) dataset, `G2` for the second
/// dataset of cross-dataset blocking.
///
pub struct StandardBlocker<G1, G2 = G1, P = LocalProcessor> {
    blocking_function: G1,
    second_blocking_function: Option<G2>,
    processor: P,
    config: BlockingConfig,
}

impl<G> StandardBlocker<G> {
    /// Creates a blocker using `blocking_function` for both datasets.
    pub fn new(blocking_function: G) -> Self {
        let config = BlockingConfig::default();
        StandardBlocker {
            blocking_function,
            second_blocking_function: None,
            processor: LocalProcessor::new(config.parallel),
            config,
        }
    }
}

impl<G1, G2> StandardBlocker<G1, G2, LocalProcessor> {
    /// Replaces the configuration; `parallel` selects the local processor's mode.
    pub fn with_config(mut self, config: BlockingConfig) -> Self {
        self.processor = LocalProcessor::new(config.parallel);
        self.config = config;
        self
    }
}

impl<G1, G2, P> StandardBlocker<G1, G2, P> {
    /// Uses `second_blocking_function` for the second dataset of cross-dataset blocking.
    pub fn with_secondary<G3>(self, second_blocking_function: G3) -> StandardBlocker<G1, G3, P> {
        StandardBlocker {
            blocking_function: self.blocking_function,
            second_blocking_function: Some(second_blocking_function),
            processor: self.processor,
            config: self.config,
        }
    }

    pub fn with_processor<Q: Processor>(self, processor: Q) -> StandardBlocker<G1, G2, Q> {
        StandardBlocker {
            blocking_function: self.blocking_function,
            second_blocking_function: self.second_blocking_function,
            processor,
            config: self.config,
        }
    }

    pub fn config(&self) -> &BlockingConfig {
        &self.config
    }
}

impl<G1, G2, P: Processor> StandardBlocker<G1, G2, P> {
    ///
    /// Pairs every element of `dataset1` with every element of `dataset2`
    /// that shares a blocking key.
    ///
    /// A pair is produced once per shared key unless
    /// `distinct_cross_dataset` is configured.
    ///
    pub fn run_blocking<R, C>(
        &self,
        dataset1: &Dataset<R>,
        dataset2: &Dataset<R>,
        schema_correspondences: &[C],
    ) -> Result<BlockingResult<G1::Blocked, C>>
    where
        R: Matchable + Sync,
        C: SchemaLink + Ord + Hash + Clone + Send + Sync,
        G1: BlockingKeyGenerator<R, C>,
        G2: BlockingKeyGenerator<R, C, Key = G1::Key, Blocked = G1::Blocked>,
    {
        let start = Instant::now();
        let sources1 = dataset1.source_identifiers();
        let sources2 = dataset2.source_identifiers();
        if let Some(&shared) = sources1.intersection(&sources2).next() {
            return Err(BlockingError::overlapping_datasets(shared));
        }
        if self.config.validate_correspondences {
            let known: FxHashSet<SourceId> = sources1.union(&sources2).copied().collect();
            check_sources(schema_correspondences, &known)?;
        }

        let joiner = CorrespondenceJoiner::new(schema_correspondences);
        let ds1 = joiner.combine(dataset1, &[Role::First]);
        let ds2 = joiner.combine(dataset2, &[Role::Second]);

        let grouped1 = group_by_blocking_key(&self.processor, ds1, &self.blocking_function)?;
        let grouped2 = match &self.second_blocking_function {
            Some(second) => group_by_blocking_key(&self.processor, ds2, second)?,
            None => group_by_blocking_key(&self.processor, ds2, &self.blocking_function)?,
        };
        let (keys_left, keys_right) = (grouped1.len(), grouped2.len());
        info!(
            "Grouped records into {} and {} blocks in {:.4} secs",
            keys_left,
            keys_right,
            start.elapsed().as_secs_f64()
        );

        let joined = self.processor.join(grouped1, grouped2);
        let joined_keys = joined.len();
        debug!("{} blocking keys shared by both datasets", joined_keys);
        let blocks = if self.config.measure_block_sizes {
            let sizes = joined
                .iter()
                .map(|(key, left, right)| BlockSize::cross(key, left.len(), right.len()))
                .collect();
            largest_blocks(sizes, self.config.max_reported_blocks)
        } else {
            Vec::new()
        };

        let start = Instant::now();
        let mut blocked = self.processor.transform(joined, |(_, left, right)| {
            let mut pairs = Vec::with_capacity(left.len() * right.len());
            for (element1, causes1) in left.iter() {
                for (element2, causes2) in right.iter() {
                    pairs.push(candidate(element1, causes1, element2, causes2));
                }
            }
            Ok(pairs)
        })?;
        if self.config.distinct_cross_dataset {
            blocked = self.processor.distinct(blocked);
        }

        let max_pairs = dataset1.len() as u64 * dataset2.len() as u64;
        let distinct = distinct_pairs(&blocked);
        let report = BlockingReport {
            candidates: blocked.len(),
            distinct_pairs: distinct,
            max_pairs,
            reduction_ratio: reduction_ratio(distinct, max_pairs),
            keys_left,
            keys_right,
            joined_keys,
            blocks,
        };
        log_report(&report, start);
        Ok(BlockingResult::new(blocked, report))
    }

    ///
    /// Pairs the elements of a single dataset that share a blocking key.
    ///
    /// Every pair has the element with the lower source identifier first and
    /// is produced only once, however many keys its elements share. Only the
    /// primary blocking function is used.
    ///
    pub fn run_self_blocking<R, C>(
        &self,
        dataset: &Dataset<R>,
        schema_correspondences: &[C],
    ) -> Result<BlockingResult<G1::Blocked, C>>
    where
        R: Matchable + Sync,
        C: SchemaLink + Ord + Hash + Clone + Send + Sync,
        G1: BlockingKeyGenerator<R, C>,
    {
        let start = Instant::now();
        if self.config.validate_correspondences {
            check_sources(schema_correspondences, &dataset.source_identifiers())?;
        }

        // a record's side of a correspondence is unknown here, so it is joined under both
        let joiner = CorrespondenceJoiner::new(schema_correspondences);
        let combined = joiner.combine(dataset, &Role::BOTH);
        let grouped = group_by_blocking_key(&self.processor, combined, &self.blocking_function)?;
        let keys = grouped.len();
        let joined_keys = grouped.iter().filter(|(_, d)| d.len() > 1).count();
        info!(
            "Grouped records into {} blocks in {:.4} secs",
            keys,
            start.elapsed().as_secs_f64()
        );
        let blocks = if self.config.measure_block_sizes {
            let sizes = grouped
                .iter()
                .map(|(key, distribution)| BlockSize::internal(key, distribution.len()))
                .collect();
            largest_blocks(sizes, self.config.max_reported_blocks)
        } else {
            Vec::new()
        };

        let start = Instant::now();
        let blocked = self.processor.transform(grouped, |(_, distribution)| {
            let elements = distribution.into_sorted();
            let mut pairs = Vec::with_capacity(unordered_pairs(elements.len()) as usize);
            for (i, (element1, causes1)) in elements.iter().enumerate() {
                for (element2, causes2) in &elements[i + 1..] {
                    pairs.push(candidate(element1, causes1, element2, causes2));
                }
            }
            Ok(pairs)
        })?;
        let produced = blocked.len();
        // elements sharing several keys produce the same pair once per key
        let blocked = self.processor.distinct(blocked);
        debug!("Removed {} duplicate pairs", produced - blocked.len());

        let max_pairs = unordered_pairs(dataset.len());
        let distinct = distinct_pairs(&blocked);
        let report = BlockingReport {
            candidates: blocked.len(),
            distinct_pairs: distinct,
            max_pairs,
            reduction_ratio: reduction_ratio(distinct, max_pairs),
            keys_left: keys,
            keys_right: keys,
            joined_keys,
            blocks,
        };
        log_report(&report, start);
        Ok(BlockingResult::new(blocked, report))
    }
}

/// Builds the candidate for two elements, keeping only the causes between their two sources.
fn candidate<B, C>(
    element1: &B,
    causes1: &BTreeSet<C>,
    element2: &B,
    causes2: &BTreeSet<C>,
) -> Correspondence<B, C>
where
    B: Matchable + Clone,
    C: SchemaLink + Ord + Clone,
{
    let source1 = element1.data_source_identifier();
    let source2 = element2.data_source_identifier();
    let causes = causes1
        .union(causes2)
        .filter(|cause| cause.connects(source1, source2))
        .cloned()
        .collect();
    Correspondence::new(
        element1.clone(),
        element2.clone(),
        BLOCKING_SIMILARITY,
        causes,
    )
}

fn check_sources<C: SchemaLink>(
    correspondences: &[C],
    known: &FxHashSet<SourceId>,
) -> Result<()> {
    for correspondence in correspondences {
        let (first, second) = (correspondence.first_source(), correspondence.second_source());
        if !known.contains(&first) && !known.contains(&second) {
            return Err(BlockingError::unknown_source(first, second));
        }
    }
    Ok(())
}

fn log_report(report: &BlockingReport, start: Instant) {
    info!(
        "Created {} candidate pairs ({} distinct, reduction ratio {:.4}) in {:.4} secs",
        report.candidates,
        report.distinct_pairs,
        report.reduction_ratio,
        start.elapsed().as_secs_f64()
    );
    for block in &report.blocks {
        debug!(
            "Block {}: {} x {} elements, {} pairs",
            block.key, block.left, block.right, block.pairs
        );
    }
}
