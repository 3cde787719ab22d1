use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BlockingError, Result};
use crate::matchable::{Matchable, SourceId};
use crate::util::{get_env_flag, get_env_usize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub source: SourceId,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Record {
    pub fn new<T: Into<String>>(id: T, source: SourceId) -> Self {
        Record {
            id: id.into(),
            source,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

impl Matchable for Record {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn data_source_identifier(&self) -> SourceId {
        self.source
    }
}

/// Schema element (column) of a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub source: SourceId,
    pub name: String,
}

impl Attribute {
    pub fn new<T: Into<String>>(source: SourceId, name: T) -> Self {
        let name = name.into();
        Attribute {
            id: format!("{source}::{name}"),
            source,
            name,
        }
    }
}

impl Matchable for Attribute {
    fn identifier(&self) -> &str {
        &self.id
    }

    fn data_source_identifier(&self) -> SourceId {
        self.source
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockingConfig {
    /// Run substrate primitives on the rayon pool.
    pub parallel: bool,
    /// Reject schema correspondences that touch none of the input datasets.
    pub validate_correspondences: bool,
    /// Remove duplicate candidates produced by several shared keys in cross-dataset blocking.
    pub distinct_cross_dataset: bool,
    pub measure_block_sizes: bool,
    pub max_reported_blocks: usize,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        BlockingConfig {
            parallel: true,
            validate_correspondences: true,
            distinct_cross_dataset: false,
            measure_block_sizes: false,
            max_reported_blocks: 10,
        }
    }
}

impl BlockingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(BlockingError::invalid_config)
    }

    /// Reads `BLOCKING_*` environment variables, falling back to the default for unset ones.
    pub fn from_env() -> Result<Self> {
        let defaults = BlockingConfig::default();
        Ok(BlockingConfig {
            parallel: get_env_flag("BLOCKING_PARALLEL")?.unwrap_or(defaults.parallel),
            validate_correspondences: get_env_flag("BLOCKING_VALIDATE_CORRESPONDENCES")?
                .unwrap_or(defaults.validate_correspondences),
            distinct_cross_dataset: get_env_flag("BLOCKING_DISTINCT_CROSS_DATASET")?
                .unwrap_or(defaults.distinct_cross_dataset),
            measure_block_sizes: get_env_flag("BLOCKING_MEASURE_BLOCK_SIZES")?
                .unwrap_or(defaults.measure_block_sizes),
            max_reported_blocks: get_env_usize("BLOCKING_MAX_REPORTED_BLOCKS")?
                .unwrap_or(defaults.max_reported_blocks),
        })
    }
}
