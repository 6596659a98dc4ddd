use std::path::PathBuf;

use thiserror::Error;

use crate::layout::NodeId;

pub type Result<T, E = SunburstError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SunburstError {
    /// A record lacks a grouping field or its download count.
    #[error("record {index} is missing required field `{field}`")]
    MalformedRecord { index: usize, field: &'static str },

    #[error("record data is not a JSON array of objects")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file")]
    Config(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("node {0:?} does not exist in this tree")]
    UnknownNode(NodeId),
}
