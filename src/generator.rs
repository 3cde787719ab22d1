use std::fmt::Display;
use std::hash::Hash;
use std::marker::PhantomData;

use crate::error::Result;
use crate::matchable::Matchable;

///
/// Blocking-key strategy: derives zero or more `(key, blocked element)` pairs
/// from a record and the schema correspondences applicable to it.
///
/// Implementations must be deterministic. An error aborts the blocking run.
///
pub trait BlockingKeyGenerator<R, C>: Sync {
    /// Rendered with `Display` in block-size reports.
    type Key: Hash + Eq + Clone + Display + Send + Sync;
    /// The element that is paired; may be coarser than `R`.
    type Blocked: Matchable + Hash + Ord + Clone + Send + Sync;

    fn generate_blocking_keys(
        &self,
        record: &R,
        correspondences: &[C],
    ) -> Result<Vec<(Self::Key, Self::Blocked)>>;
}

impl<R, C, G> BlockingKeyGenerator<R, C> for &G
where
    G: BlockingKeyGenerator<R, C> + ?Sized,
{
    type Key = G::Key;
    type Blocked = G::Blocked;

    fn generate_blocking_keys(
        &self,
        record: &R,
        correspondences: &[C],
    ) -> Result<Vec<(Self::Key, Self::Blocked)>> {
        (**self).generate_blocking_keys(record, correspondences)
    }
}

/// Closure adapter, see [`blocking_key_fn`].
pub struct FnKeyGenerator<F, K, B> {
    f: F,
    _output: PhantomData<fn() -> (K, B)>,
}

/// Wraps `f(record, correspondences)` as a [`BlockingKeyGenerator`].
pub fn blocking_key_fn<R, C, K, B, F>(f: F) -> FnKeyGenerator<F, K, B>
where
    F: Fn(&R, &[C]) -> Result<Vec<(K, B)>>,
{
    FnKeyGenerator {
        f,
        _output: PhantomData,
    }
}

impl<R, C, F, K, B> BlockingKeyGenerator<R, C> for FnKeyGenerator<F, K, B>
where
    F: Fn(&R, &[C]) -> Result<Vec<(K, B)>> + Sync,
    K: Hash + Eq + Clone + Display + Send + Sync,
    B: Matchable + Hash + Ord + Clone + Send + Sync,
{
    type Key = K;
    type Blocked = B;

    fn generate_blocking_keys(&self, record: &R, correspondences: &[C]) -> Result<Vec<(K, B)>> {
        (self.f)(record, correspondences)
    }
}
