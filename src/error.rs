// Error types for trs-inspect

use glam::{Vec3, Vec4};
use thiserror::Error;

/// Errors raised while decomposing a transform matrix or setting up a run.
#[derive(Debug, Error, PartialEq)]
pub enum DecomposeError {
    /// A scale component is zero, subnormal, or not finite
    #[error("Degenerate scale {scale}: every component must be finite and non-zero")]
    DegenerateScale { scale: Vec3 },

    /// The matrix has a projective component
    #[error("Matrix is not affine: last row is {last_row}, expected (0, 0, 0, 1)")]
    NotAffine { last_row: Vec4 },

    /// An environment variable could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidConfig { key: String, value: String },
}

/// Result type for decomposition operations
pub type DecomposeResult<T> = Result<T, DecomposeError>;
