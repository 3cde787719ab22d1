//! Blocking for entity resolution.
//!
//! Records are grouped by blocking keys derived from them, and only records
//! sharing a key are paired into candidate correspondences for a downstream
//! matcher. See [`blocker::StandardBlocker`].

pub mod blocker;
pub mod correspondence;
pub mod distribution;
pub mod dto;
pub mod error;
pub mod generator;
pub mod joiner;
pub mod matchable;
pub mod processing;
pub mod report;
pub mod util;

pub use blocker::StandardBlocker;
pub use correspondence::{Correspondence, SchemaLink};
pub use dto::{Attribute, BlockingConfig, Record};
pub use error::{BlockingError, ErrorKind, Result};
pub use generator::{blocking_key_fn, BlockingKeyGenerator};
pub use matchable::{Dataset, Matchable, SourceId};
pub use processing::{LocalProcessor, Processor};
pub use report::{BlockingReport, BlockingResult};
