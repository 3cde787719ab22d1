use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::matchable::SourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    KeyGeneration,
    UnknownSource,
    OverlappingDatasets,
    InvalidConfig,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::KeyGeneration => "key generation failed",
            ErrorKind::UnknownSource => "unknown data source",
            ErrorKind::OverlappingDatasets => "overlapping datasets",
            ErrorKind::InvalidConfig => "invalid configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fatal error of a blocking run. Nothing produced before the failure is returned.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind}: {msg}")]
pub struct BlockingError {
    pub msg: String,
    pub kind: ErrorKind,
}

pub type Result<T> = std::result::Result<T, BlockingError>;

impl BlockingError {
    pub fn key_generation<T: fmt::Display>(msg: T) -> BlockingError {
        BlockingError {
            msg: msg.to_string(),
            kind: ErrorKind::KeyGeneration,
        }
    }

    pub fn unknown_source(first: SourceId, second: SourceId) -> BlockingError {
        BlockingError {
            msg: format!(
                "schema correspondence between sources {} and {} references no input dataset",
                first, second
            ),
            kind: ErrorKind::UnknownSource,
        }
    }

    pub fn overlapping_datasets(source: SourceId) -> BlockingError {
        BlockingError {
            msg: format!("source {} occurs in both datasets", source),
            kind: ErrorKind::OverlappingDatasets,
        }
    }

    pub fn invalid_config<T: fmt::Display>(msg: T) -> BlockingError {
        BlockingError {
            msg: msg.to_string(),
            kind: ErrorKind::InvalidConfig,
        }
    }
}
