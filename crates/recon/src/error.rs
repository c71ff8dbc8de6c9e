use thiserror::Error;

/// Invalid mapping table. Raised before any fetch is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// TOML parse / deserialization error in a mapping file.
    #[error("mapping parse error: {0}")]
    Parse(String),
    /// A mapping file names a resource that does not exist.
    #[error("unknown resource '{0}' in mapping file")]
    UnknownResource(String),
    /// Target key is not a field of the target schema.
    #[error("invalid mapping for key '{key}': '{key}' is not a field of {model}")]
    UnknownTargetField { key: String, model: String },
    /// A dotted source path does not resolve through any branch of the source schema.
    #[error(
        "invalid mapping for key '{key}': path '{path}' does not resolve on {model} \
         ('{segment}' missing after '{resolved}')"
    )]
    UnresolvablePath {
        key: String,
        path: String,
        model: String,
        segment: String,
        resolved: String,
    },
    /// The same target key appears twice.
    #[error("duplicate mapping for key '{0}'")]
    DuplicateKey(String),
}

/// A value transform rejected its input. The field is skipped, the record is not.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transform '{transform}' cannot convert {value}")]
pub struct TransformError {
    pub transform: String,
    pub value: String,
}

/// The external applier could not submit a change record.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("{0}")]
    Rejected(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Persisting or loading the update queue failed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot encode update queue: {0}")]
    Encode(#[from] serde_json::Error),
}
