/////////////////////////////////////////////////////////////////////////////////////
//
// SIRQD cohort model
//
// error module
//
// everything that can go wrong outside the integrator itself
//
////////////////////////////////////////////////////////////////////////////////////

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no model location specified - usage: sirqd <model_root>")]
    Usage,

    #[error("{} - {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot parse parameter file {} - {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: yaml_rust::ScanError,
    },

    #[error("parameter file holds no YAML document")]
    EmptyParameterFile,

    #[error("YAML - expected '{0}' parameter")]
    MissingParameter(String),

    #[error("YAML - parameter '{key}' must be {expected}")]
    InvalidParameter { key: String, expected: &'static str },

    #[error("unknown scenario variable '{0}' (expected one of ci, cq, cd, hs, hi)")]
    UnknownVariable(String),

    #[error("{}:{line} - '{token}' is not a number", .path.display())]
    InvalidNumber {
        path: PathBuf,
        line: usize,
        token: String,
    },

    #[error("{} - expected {expected} values, found {found}", .path.display())]
    DistributionLength {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("summary log - {0}")]
    Csv(#[from] csv::Error),
}

impl ModelError {
    // attach the offending path to an io error
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> ModelError {
        ModelError::Io {
            path: path.into(),
            source,
        }
    }
}
