use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which end of an edge failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Source => write!(f, "source"),
            Endpoint::Target => write!(f, "target"),
        }
    }
}

/// Error types for state acquisition and diagram generation
#[derive(Debug, Error)]
pub enum Tf2d2Error {
    /// No shape survived classification
    #[error("{0}")]
    Validation(String),

    /// An edge references a node id that is not in the graph
    #[error("error getting {endpoint} node: {id}")]
    Reference { endpoint: Endpoint, id: String },

    /// The diagram engine rejected the diagram source
    #[error("error compiling d2 graph: {0}")]
    Compile(String),

    /// The diagram template failed to render
    #[error("error rendering d2 template: {0}")]
    Template(String),

    /// Filesystem or stream write failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Request construction, transport or download failure
    #[error("network error: {0}")]
    Network(String),

    /// Terraform API call failed
    #[error("terraform API error: {0}")]
    Upstream(String),

    /// State version was not processed before the poll deadline
    #[error("current state version read has exceeded max timeout of {0:?}")]
    Timeout(std::time::Duration),

    /// Caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Diagram used before `initialize`
    #[error("diagram has not been initialized")]
    NotInitialized,

    /// Invalid or missing configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Terraform state could not be turned into a resource graph
    #[error("invalid terraform state: {0}")]
    StateParse(String),
}

impl Tf2d2Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Tf2d2Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for Tf2d2Error {
    fn from(err: serde_json::Error) -> Self {
        Tf2d2Error::StateParse(err.to_string())
    }
}

/// Result type for tf2d2 operations
pub type Result<T> = std::result::Result<T, Tf2d2Error>;
