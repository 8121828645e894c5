//! # restop-tagger
//!
//! This is an internal crate used by `restop`. It builds three-jet top quark candidates from
//! the jets of an event, scores them with a [`Discriminant`](restop_core::Discriminant), and
//! selects a jet-disjoint set of accepted candidates.
#![warn(clippy::perf, clippy::style)]

/// The [`TopCandidate`] value type.
pub mod candidate;
/// Candidate generation, scoring, and overlap removal.
pub mod tagger;
/// Named input features of a candidate.
pub mod variables;

pub use candidate::{TopCandidate, TOP_MASS, TOP_MASS_RANGE, W_MASS, W_MASS_RANGE};
pub use tagger::{remove_overlap, MassWindows, ResolvedTopTagger, TaggerConfig};
pub use variables::{CandidateVariable, JetRole, JetVariable, SystemVariable};
