use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::utils::vectors::Vec4;

/// A set of [`Jet`]s that can be used to test the top tagger. Jet 0 is b-tagged, jets 1 and 2
/// form a hadronic $`W`$ candidate with a mass of 80 GeV, and adding jet 0 brings the
/// three-jet mass to 175 GeV. Jet 3 is a soft, wide-angle light jet.
pub fn test_jets() -> Vec<Jet> {
    vec![
        Jet::new(Vec4::new(0.0, 0.0, 151.40625, 151.40625))
            .with_deep_csv(0.92, 0.05, 0.03)
            .with_shape(0.71, 0.031, 0.022, 18.0),
        Jet::new(Vec4::new(40.0, 0.0, 0.0, 40.0))
            .with_deep_csv(0.04, 0.21, 0.75)
            .with_shape(0.55, 0.045, 0.030, 12.0),
        Jet::new(Vec4::new(-40.0, 0.0, 0.0, 40.0))
            .with_deep_csv(0.08, 0.30, 0.62)
            .with_shape(0.48, 0.052, 0.041, 15.0),
        Jet::new(Vec4::new(0.0, 25.0, 10.0, 27.5))
            .with_deep_csv(0.02, 0.10, 0.88)
            .with_shape(0.38, 0.087, 0.063, 9.0),
    ]
}

/// A reconstructed small-radius jet and the identification variables used to build top
/// candidates from it.
///
/// Jets are read-only inputs to the tagger; the collection for one event is passed around as
/// a `&[Jet]` and candidates refer to jets by their index in that slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jet {
    /// The jet four-momentum
    pub p4: Vec4,
    /// b-tagging discriminant (DeepCSV $`P(b) + P(bb)`$)
    pub csv: f64,
    /// charm-versus-light discriminant $`P(c) / (P(c) + P(udsg))`$
    pub cvsl: f64,
    /// $`p_T`$-weighted width $`p_TD`$
    pub ptd: f64,
    /// major axis of the jet shape
    pub axis1: f64,
    /// minor axis of the jet shape
    pub axis2: f64,
    /// number of charged and neutral constituents
    pub mult: f64,
}

impl Jet {
    /// Create a jet from its four-momentum with every identification variable set to zero.
    pub fn new(p4: Vec4) -> Self {
        Self {
            p4,
            csv: 0.0,
            cvsl: 0.0,
            ptd: 0.0,
            axis1: 0.0,
            axis2: 0.0,
            mult: 0.0,
        }
    }

    /// Set the b-tagging discriminant.
    pub fn with_csv(mut self, csv: f64) -> Self {
        self.csv = csv;
        self
    }

    /// Set the charm-versus-light discriminant.
    pub fn with_cvsl(mut self, cvsl: f64) -> Self {
        self.cvsl = cvsl;
        self
    }

    /// Fill both flavour discriminants from the DeepCSV $`b`$, $`c`$, and light-flavour
    /// probabilities. The charm-versus-light ratio is zero if both $`c`$ and light
    /// probabilities vanish.
    pub fn with_deep_csv(mut self, prob_b: f64, prob_c: f64, prob_l: f64) -> Self {
        self.csv = prob_b;
        let denominator = prob_c + prob_l;
        self.cvsl = if denominator > 0.0 {
            prob_c / denominator
        } else {
            0.0
        };
        self
    }

    /// Set the jet-shape variables $`p_TD`$, both axes, and the constituent multiplicity.
    pub fn with_shape(mut self, ptd: f64, axis1: f64, axis2: f64, mult: f64) -> Self {
        self.ptd = ptd;
        self.axis1 = axis1;
        self.axis2 = axis2;
        self.mult = mult;
        self
    }

    /// Whether the jet passes a b-tagging threshold.
    pub fn is_btagged(&self, threshold: f64) -> bool {
        self.csv >= threshold
    }
}

impl Display for Jet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Jet(pt = {:.3}, eta = {:.3}, phi = {:.3}, m = {:.3}, csv = {:.4})",
            self.p4.pt(),
            self.p4.eta(),
            self.p4.phi(),
            self.p4.m(),
            self.csv
        )
    }
}
