//! Error types for BSP compilation.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Validating the conversion configuration.
    Config,
    /// Reading and parsing the input mesh.
    Read,
    /// Centering, scaling and range validation of the vertices.
    Normalize,
    /// Building the linked BSP tree.
    Build,
    /// Converting the tree into flat arrays.
    Flatten,
    /// Serializing the asset bytes.
    Encode,
    /// Writing the asset to disk.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Read => "read",
            Stage::Normalize => "normalize",
            Stage::Build => "build",
            Stage::Flatten => "flatten",
            Stage::Encode => "encode",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while compiling or loading a BSP asset.
#[derive(Error, Debug)]
pub enum BspError {
    /// A face has fewer than three vertices.
    #[error("face {face} has {vertex_count} vertices, at least 3 are required")]
    InvalidFace {
        /// Canonical index of the face.
        face: usize,
        /// Number of vertex indices the face carries.
        vertex_count: usize,
    },

    /// A face references a vertex that does not exist.
    #[error("face {face} references vertex {vertex} but the mesh has {vertex_count} vertices")]
    VertexOutOfRange {
        /// Canonical index of the face.
        face: usize,
        /// The offending vertex index.
        vertex: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A node's face could not be resolved to a canonical face index.
    #[error("node {node} references face {face}, which is not in the canonical face array")]
    IndexResolutionFailure {
        /// Flat position of the node.
        node: usize,
        /// The face index that failed to resolve.
        face: usize,
    },

    /// A tree node was never given a flat position while indexing.
    #[error("node {node} is not reachable from the root of the tree")]
    UnindexedNode {
        /// Arena index of the node.
        node: usize,
    },

    /// A count or index does not fit the field the asset format gives it.
    #[error("{what} is {value}, the asset format allows at most {max}")]
    CountOverflow {
        /// What was being stored.
        what: &'static str,
        /// The value that did not fit.
        value: usize,
        /// Largest value the field accepts.
        max: usize,
    },

    /// Malformed asset bytes.
    #[error("invalid asset at byte {offset}: {message}")]
    InvalidFormat {
        /// Byte offset where the problem was detected.
        offset: usize,
        /// Description of the problem.
        message: String,
    },

    /// Malformed OBJ text.
    #[error("OBJ line {line}: {message}")]
    ObjParse {
        /// 1-based line number.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Coordinates fall outside the fixed-point limit.
    #[error(
        "coordinates span [{min}, {max}]; {out_of_range} values fall outside the fixed-point limit"
    )]
    CoordinateRange {
        /// Smallest coordinate component.
        min: f32,
        /// Largest coordinate component.
        max: f32,
        /// Number of components outside the limit.
        out_of_range: usize,
    },

    /// A configuration value is unusable.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// I/O failure on a specific path.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing encoded bytes to a stream failed.
    #[error("failed to write asset bytes: {0}")]
    Stream(#[source] std::io::Error),

    /// A failure tagged with the pipeline stage it aborted.
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: Stage,
        /// The underlying failure.
        #[source]
        source: Box<BspError>,
    },
}

impl BspError {
    /// Tags this error with the pipeline stage it occurred in.
    ///
    /// Errors that already carry a stage are returned unchanged.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            tagged @ BspError::Stage { .. } => tagged,
            other => BspError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Returns the stage this error was tagged with, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            BspError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Returns the innermost error, looking through stage tags.
    pub fn root_cause(&self) -> &BspError {
        match self {
            BspError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BspError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_format(offset: usize, message: impl Into<String>) -> Self {
        BspError::InvalidFormat {
            offset,
            message: message.into(),
        }
    }
}

/// Result type alias for BSP compilation.
pub type Result<T> = std::result::Result<T, BspError>;
