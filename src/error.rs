//! Error types for the documentation engine.

/// Boxed error returned across port boundaries.
pub type PortError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error enum.
///
/// Structural errors (`MalformedDiff`, `StructureExtraction`) are contained at
/// file granularity by the runner; `Checkpoint` is fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    /// A hunk header could not be parsed.
    #[error("malformed diff at line {line}: {text:?}")]
    MalformedDiff {
        /// 1-based line of the diff text holding the bad header.
        line: usize,
        /// The offending header text.
        text: String,
    },

    /// Source could not be turned into declarations.
    #[error("structure extraction failed for {path}: {message}")]
    StructureExtraction {
        /// Repository-relative path of the file.
        path: String,
        /// Extractor or validation message.
        message: String,
    },

    /// The generator or resolver failed for one declaration.
    #[error("documentation generation failed for {target}: {message}")]
    Generation {
        /// Full path of the declaration node.
        target: String,
        /// Underlying failure.
        message: String,
    },

    /// Writing or reading the persisted record failed.
    #[error("checkpoint at {path} failed: {message}")]
    Checkpoint {
        /// Location of the persisted record.
        path: String,
        /// Underlying failure.
        message: String,
    },

    /// A version-control query failed.
    #[error("git error: {0}")]
    Git(String),

    /// Settings are missing or invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Checkpoint (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings or cassette (de)serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result alias used throughout the crate.
pub type DocResult<T> = Result<T, DocError>;
