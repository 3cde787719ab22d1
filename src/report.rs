use rustc_hash::FxHashSet;
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::hash::Hash;

use crate::correspondence::Correspondence;

/// Size of one block; for self-blocking `left == right`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSize {
    pub key: String,
    pub left: usize,
    pub right: usize,
    pub pairs: u64,
}

impl BlockSize {
    pub fn cross<K: Display>(key: &K, left: usize, right: usize) -> Self {
        BlockSize {
            key: key.to_string(),
            left,
            right,
            pairs: left as u64 * right as u64,
        }
    }

    pub fn internal<K: Display>(key: &K, size: usize) -> Self {
        BlockSize {
            key: key.to_string(),
            left: size,
            right: size,
            pairs: unordered_pairs(size),
        }
    }
}

/// Outcome statistics of a blocking run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockingReport {
    /// Emitted correspondences; a pair sharing several keys may be counted more than once.
    pub candidates: usize,
    /// Different (first, second) element pairs among the candidates.
    pub distinct_pairs: usize,
    /// Pairs a full comparison would have produced.
    pub max_pairs: u64,
    pub reduction_ratio: f64,
    pub keys_left: usize,
    pub keys_right: usize,
    /// Keys able to produce pairs: present on both sides, or holding two or more elements.
    pub joined_keys: usize,
    /// Largest blocks by pair count; only filled when block sizes are measured.
    pub blocks: Vec<BlockSize>,
}

impl BlockingReport {
    pub fn to_json(&self) -> Value {
        json!({
            "candidates": self.candidates,
            "distinctPairs": self.distinct_pairs,
            "maxPairs": self.max_pairs,
            "reductionRatio": self.reduction_ratio,
            "keys": {
                "left": self.keys_left,
                "right": self.keys_right,
                "joined": self.joined_keys,
            },
            "blocks": self.blocks,
        })
    }
}

pub fn unordered_pairs(n: usize) -> u64 {
    let n = n as u64;
    n * n.saturating_sub(1) / 2
}

/// Number of different (first, second) pairs, whatever their causes.
pub fn distinct_pairs<B: Hash + Eq, C>(candidates: &[Correspondence<B, C>]) -> usize {
    candidates
        .iter()
        .map(|c| (c.first(), c.second()))
        .collect::<FxHashSet<_>>()
        .len()
}

/// Share of the full comparison space removed by blocking, from the distinct pair count.
pub fn reduction_ratio(distinct_pairs: usize, max_pairs: u64) -> f64 {
    if max_pairs == 0 {
        1.0
    } else {
        1.0 - distinct_pairs as f64 / max_pairs as f64
    }
}

/// Keeps the `limit` largest blocks, largest first.
pub fn largest_blocks(mut blocks: Vec<BlockSize>, limit: usize) -> Vec<BlockSize> {
    blocks.sort_by(|a, b| b.pairs.cmp(&a.pairs).then_with(|| a.key.cmp(&b.key)));
    blocks.truncate(limit);
    blocks
}

/// Candidate pairs of a blocking run, in no particular order, with its report.
#[derive(Clone, Debug)]
pub struct BlockingResult<B, C> {
    correspondences: Vec<Correspondence<B, C>>,
    report: BlockingReport,
}

impl<B, C> BlockingResult<B, C> {
    pub fn new(correspondences: Vec<Correspondence<B, C>>, report: BlockingReport) -> Self {
        BlockingResult {
            correspondences,
            report,
        }
    }

    pub fn correspondences(&self) -> &[Correspondence<B, C>] {
        &self.correspondences
    }

    pub fn report(&self) -> &BlockingReport {
        &self.report
    }

    pub fn len(&self) -> usize {
        self.correspondences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Correspondence<B, C>> {
        self.correspondences.iter()
    }

    pub fn into_correspondences(self) -> Vec<Correspondence<B, C>> {
        self.correspondences
    }
}

impl<B, C> IntoIterator for BlockingResult<B, C> {
    type Item = Correspondence<B, C>;
    type IntoIter = std::vec::IntoIter<Correspondence<B, C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.correspondences.into_iter()
    }
}

impl<'a, B, C> IntoIterator for &'a BlockingResult<B, C> {
    type Item = &'a Correspondence<B, C>;
    type IntoIter = std::slice::Iter<'a, Correspondence<B, C>>;

    fn into_iter(self) -> Self::IntoIter {
        self.correspondences.iter()
    }
}
