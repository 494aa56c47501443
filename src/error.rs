/// Failures of the storage guard stage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The store could not be mounted, or re-mounted after a format.
    #[error("store mount failed: {0}")]
    MountFailed(#[source] std::io::Error),

    /// Capacity or directory information could not be queried.
    #[error("store information unavailable: {0}")]
    InfoUnavailable(#[source] std::io::Error),
}

/// Failures of the sample loader stage.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The source recording does not exist.
    #[error("recording not found: {path}")]
    NotFound { path: String },

    /// The signal buffer or raw scratch region could not be allocated.
    #[error("sample buffer allocation failed: {0}")]
    AllocFailed(#[from] ArenaError),

    /// Fewer than the required number of samples were available.
    #[error("recording truncated: needed {needed} samples, read {read}")]
    Truncated { needed: usize, read: usize },

    /// The container header did not describe mono 16-bit integer PCM.
    #[error("unsupported recording format: {0}")]
    UnsupportedFormat(String),

    /// Any other read failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures of the spectral analyzer stage.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Window or transform scratch buffer could not be allocated.
    #[error("analysis buffer allocation failed: {0}")]
    AllocFailed(#[from] ArenaError),

    /// The transform kernel or the reorder pass reported an error.
    #[error("transform failed: {0}")]
    TransformFailed(#[from] TransformError),

    /// The signal does not have the length the analyzer was built for.
    #[error("invalid signal: expected {expected} samples, got {got}")]
    InvalidInput { expected: usize, got: usize },
}

/// Failures of the result writer stage.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// Capacity could not be queried before writing.
    #[error("store information unavailable: {0}")]
    InfoUnavailable(#[source] std::io::Error),

    /// The estimated table size exceeds the free space on the store.
    #[error("insufficient space: need {required} bytes, have {free}")]
    InsufficientSpace { required: u64, free: u64 },

    /// A write, flush or close failed; remaining lines were not written.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The written file is missing, unreadable or empty.
    #[error("verification of `{path}` failed: {reason}")]
    VerificationFailed { path: String, reason: String },
}

/// Errors reported by a [`SpectralTransform`](crate::fft::SpectralTransform).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// The transform length is not supported by the kernel.
    #[error("unsupported transform length {0}")]
    UnsupportedLength(usize),

    /// The buffer handed to the kernel does not match the initialised length.
    #[error("buffer length mismatch: expected {expected}, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// The kernel was used before `init`.
    #[error("transform not initialised")]
    NotInitialised,
}

/// Errors reported by the buffer [`Arena`](crate::arena::Arena).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// Alignment must be a non-zero power of two.
    #[error("invalid alignment {0}: must be a power of two")]
    InvalidAlignment(usize),

    /// The allocation would exceed the arena's byte limit.
    #[error("arena exhausted: requested {requested} bytes, {available} available")]
    Exhausted { requested: usize, available: usize },

    /// The allocator returned storage that cannot be offset to the
    /// requested alignment in whole elements.
    #[error("cannot align {element}-byte elements to {alignment} bytes")]
    Unaligned { alignment: usize, element: usize },
}

/// Errors from reading back a captured console stream or a persisted table.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The start sentinel never appeared in the stream.
    #[error("start sentinel not found")]
    StartNotFound,

    /// The stream ended before the end sentinel.
    #[error("end sentinel not found after {values} values")]
    EndNotFound { values: usize },

    /// A table line could not be parsed as a number.
    #[error("line {line}: cannot parse `{text}` as a magnitude")]
    Parse { line: usize, text: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Invalid pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid parameter value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Configuration document could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-level error type: one variant per pipeline stage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Convenience Result type for sonagram operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Name of the pipeline stage that produced the error.
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration",
            Error::Storage(_) => "storage guard",
            Error::Load(_) => "sample loader",
            Error::Analysis(_) => "spectral analyzer",
            Error::Write(_) => "result writer",
        }
    }
}
