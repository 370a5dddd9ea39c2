use thiserror::Error;

/// Top-level error type for the Geolis Boolean kernel.
#[derive(Debug, Error)]
pub enum GeolisError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Boolean(#[from] BopError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("unsupported geometry combination: {0}")]
    Unsupported(String),
}

/// Errors related to topological operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("wire is not closed")]
    WireNotClosed,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to CAD operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Hard failures of the Boolean pipeline.
///
/// Recoverable problems (a pair that could not be intersected, an edge too
/// small to split, an open shell) are reported as warnings instead.
#[derive(Debug, Error)]
pub enum BopError {
    #[error("too few arguments: {required} required, {given} given")]
    TooFewArguments { required: usize, given: usize },

    #[error("null input shape: {0}")]
    NullInputShape(String),

    #[error("intersection failed: {0}")]
    IntersectionFailed(String),

    #[error("operation cancelled by user")]
    Cancelled,

    #[error("could not classify {0} against the other arguments")]
    NoClassification(String),
}

/// Convenience type alias for results using [`GeolisError`].
pub type Result<T> = std::result::Result<T, GeolisError>;
