//! # restop-core
//!
//! This is an internal crate used by `restop`.
#![warn(clippy::perf, clippy::style)]

use thiserror::Error;

/// Methods for describing the [`Jet`](crate::data::Jet)s of a single collision event.
pub mod data;
/// The [`Discriminant`](crate::discriminant::Discriminant) trait which all candidate models
/// implement.
pub mod discriminant;
/// Utility functions, enums, and traits
pub mod utils;
/// Useful traits for all crate structs
pub mod traits {
    pub use crate::discriminant::Discriminant;
}

pub use crate::data::{test_jets, Jet};
pub use crate::discriminant::Discriminant;
pub use crate::utils::enums::{BTagWorkingPoint, WorkingPoint};
pub use crate::utils::vectors::Vec4;

pub type RestopResult<T> = Result<T, RestopError>;

/// The error type used by all `restop` internal methods
#[derive(Error, Debug)]
pub enum RestopError {
    /// An alias for [`std::io::Error`].
    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
    /// An alias for [`shellexpand::LookupError`].
    #[error("Failed to expand path: {0}")]
    LookupError(#[from] shellexpand::LookupError<std::env::VarError>),
    /// An alias for [`roxmltree::Error`].
    #[error("XML Error: {0}")]
    XmlError(#[from] roxmltree::Error),
    /// An error returned by the Rust encoder
    #[error("Encoder error: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),
    /// An error returned by the Rust decoder
    #[error("Decoder error: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),
    /// A model file was read successfully but does not describe a usable tree ensemble.
    #[error("Invalid model \"{model}\": {reason}")]
    ModelFormat {
        /// Name (or path) of the model being loaded
        model: String,
        /// What was wrong with it
        reason: String,
    },
    /// A feature vector did not have the length the model was trained with.
    #[error("Expected {expected} features but found {found}!")]
    FeatureLengthMismatch {
        /// Number of variables the model was trained on
        expected: usize,
        /// Length of the vector which was passed in
        found: usize,
    },
    /// A feature value was NaN or infinite.
    #[error("Feature \"{name}\" has non-finite value {value}!")]
    NonFiniteFeature {
        /// Name of the offending feature
        name: String,
        /// The value itself
        value: f64,
    },
    /// A model returned NaN or an infinite score for a well-formed feature vector.
    #[error("Model \"{model}\" returned non-finite score {score}!")]
    NonFiniteScore {
        /// Name of the model
        model: String,
        /// The score it returned
        score: f64,
    },
    /// A model asks for an input variable which no candidate can provide.
    #[error("No candidate variable named \"{name}\"!")]
    UnknownVariable {
        /// Name of the variable which failed lookup
        name: String,
    },
    /// A candidate was requested from jet indices which are repeated or out of range.
    #[error("Invalid candidate ({ib}, {ij2}, {ij3}) for an event with {n_jets} jets!")]
    InvalidCandidate {
        /// Index of the b-jet
        ib: usize,
        /// Index of the first light jet
        ij2: usize,
        /// Index of the second light jet
        ij3: usize,
        /// Number of jets in the event
        n_jets: usize,
    },
    /// An error which occurs when the user tries to parse an invalid string of text, typically
    /// into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed
        name: String,
        /// The name of the object it failed to parse into
        object: String,
    },
    /// A custom fallback error for errors too complex or too infrequent to warrant their own error
    /// category.
    #[error("{0}")]
    Custom(String),
}

impl Clone for RestopError {
    // error sources are rarely cloneable, so clones collapse to their message
    fn clone(&self) -> Self {
        RestopError::Custom(self.to_string())
    }
}
