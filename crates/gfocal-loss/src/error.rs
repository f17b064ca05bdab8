//! Error types for the generalized focal loss criteria.

use thiserror::Error;

/// Errors that can occur while configuring a loss criterion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GFocalLossError {
    /// The reduction name is not one of `mean`, `sum` or `none`.
    #[error("unknown reduction '{name}': expected one of 'mean', 'sum' or 'none'")]
    UnknownReduction { name: String },
}

/// Result type for this crate.
pub type Result<T> = core::result::Result<T, GFocalLossError>;
