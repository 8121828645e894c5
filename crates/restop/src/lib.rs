//! `restop` reconstructs hadronically decaying top quarks from three resolved jets. Given the
//! jets of a collision event, it forms every combination of one b-tagged jet with a pair of
//! other jets, scores each combination with a boosted decision tree, and returns the
//! best-scoring candidates which do not share any jets.
//!
//! # Table of Contents
//! - [Quick Start](#quick-start)
//! - [Working Points](#working-points)
//! - [Models](#models)
//! - [Parallelism](#parallelism)
//!
//! # Quick Start
//! A tagger needs a trained model and a [`TaggerConfig`], which sets the b-tagging threshold
//! that decides which jets may play the b-jet role:
//! ```rust,no_run
//! use restop::{BTagWorkingPoint, Jet, ResolvedTopTagger, TaggerConfig, Vec4, WorkingPoint};
//!
//! let config = TaggerConfig::default().with_btag_working_point(BTagWorkingPoint::Medium);
//! let tagger =
//!     ResolvedTopTagger::from_weights("~/weights/resTop_xGBoost_v0.weights.xml", "BDT", config)
//!         .unwrap();
//! let jets = vec![
//!     Jet::new(Vec4::from_pt_eta_phi_m(95.0, 0.3, 0.1, 11.0)).with_deep_csv(0.91, 0.06, 0.03),
//!     Jet::new(Vec4::from_pt_eta_phi_m(62.0, -0.2, 1.4, 8.0)).with_deep_csv(0.05, 0.2, 0.75),
//!     Jet::new(Vec4::from_pt_eta_phi_m(41.0, 0.9, 2.2, 6.0)).with_deep_csv(0.10, 0.3, 0.6),
//! ];
//! let tops = tagger.top_candidates(&jets, WorkingPoint::Medium);
//! if let Some(best) = tops.first() {
//!     println!("{} with m_top = {}", best, best.topcand.m());
//! }
//! ```
//! The returned list is ordered by discriminant, so its first element is the leading top
//! candidate of the event. No two candidates in the list share a jet.
//!
//! # Working Points
//! [`WorkingPoint::Loose`], [`WorkingPoint::Medium`], and [`WorkingPoint::Tight`] require a
//! discriminant of at least 0.83, 0.98, and 0.99, respectively. [`WorkingPoint::Custom`] takes
//! any threshold, and [`WorkingPoint::All`] keeps every candidate (before overlap removal, the
//! complete scored pool is also available from [`ResolvedTopTagger::candidates`]).
//!
//! # Models
//! Models are TMVA boosted decision trees, read from their XML weight files. Parsing a large
//! forest takes a while, so a parsed [`Bdt`](crate::mva::Bdt) can be written to a binary
//! cache with [`Bdt::save`](crate::mva::Bdt::save); [`mva::load`] reads either format. The
//! variables a model was trained with are matched by name to the
//! [`CandidateVariable`]s of a candidate when the tagger is created, so a model which asks
//! for an unknown input is rejected up front. Any other classifier can be used by
//! implementing [`Discriminant`](crate::traits::Discriminant).
//!
//! # Parallelism
//! With the default `rayon` feature, [`ResolvedTopTagger::tag_events`] processes a batch of
//! events in parallel. Events never share state, so the result is identical to tagging each
//! event in turn.
#![warn(clippy::perf, clippy::style, missing_docs)]

/// Jets and the kinematics they are built from.
pub mod data {
    pub use restop_core::data::{test_jets, Jet};
}
/// Boosted decision tree models.
pub mod mva {
    pub use restop_mva::*;
}
/// Utility functions, enums, and traits
pub mod utils {
    pub use restop_core::utils::*;
}
/// Useful traits for all crate structs
pub mod traits {
    pub use restop_core::Discriminant;
}

pub use restop_core::{
    BTagWorkingPoint, Jet, RestopError, RestopResult, Vec4, WorkingPoint,
};
pub use restop_tagger::*;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_tag_test_jets() {
        let tagger =
            ResolvedTopTagger::new(Arc::new(mva::test_bdt()), TaggerConfig::default()).unwrap();
        let jets = data::test_jets();
        let tops = tagger.top_candidates(&jets, WorkingPoint::Custom(0.5));
        assert_eq!(tops.len(), 1);
        let best = &tops[0];
        assert_eq!(best.indices(), [0, 1, 2]);
        assert!(best.pass_mass_w(W_MASS_RANGE));
        assert!(best.pass_mass_top(TOP_MASS_RANGE));
        assert_relative_eq!(best.topcand.m(), 175.0);
        assert!(tagger
            .top_candidates(&jets, WorkingPoint::Loose)
            .is_empty());
    }

    #[test]
    fn test_working_point_names() {
        assert_eq!("medium".parse::<WorkingPoint>().unwrap(), WorkingPoint::Medium);
        assert_eq!(
            "0.5".parse::<WorkingPoint>().unwrap(),
            WorkingPoint::Custom(0.5)
        );
        assert!("tightest".parse::<WorkingPoint>().is_err());
    }
}
