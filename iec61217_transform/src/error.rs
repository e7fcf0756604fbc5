use crate::frames::Frame;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Frame '{0}' has no path to the fixed reference frame")]
    FrameNotInHierarchy(Frame),

    #[error("Elementary transform '{0}' not found")]
    TransformNotFound(String),

    #[error("Frame '{child}' is listed as a child of both '{first}' and '{second}'")]
    DuplicateParent {
        child: Frame,
        first: Frame,
        second: Frame,
    },

    #[error("Root frame cannot be the child of '{0}'")]
    RootHasParent(Frame),

    #[error("Cycle detected in frame hierarchy through frame '{0}'")]
    CyclicHierarchy(Frame),

    #[error("Unknown coordinate frame name '{0}'")]
    UnknownFrameName(String),

    #[error("Row and column direction cosines are not linearly independent")]
    DegenerateDirectionCosines,

    #[error("Transform '{0}' is not invertible")]
    SingularTransform(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

pub type TransformResult<T> = Result<T, TransformError>;
