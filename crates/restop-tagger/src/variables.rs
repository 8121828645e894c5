use std::{fmt::Display, str::FromStr};

use restop_core::{Jet, RestopError};
use serde::{Deserialize, Serialize};

use crate::candidate::TopCandidate;

/// The role a jet plays in a [`TopCandidate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JetRole {
    /// The b-jet
    B,
    /// The lower-indexed light jet
    J2,
    /// The higher-indexed light jet
    J3,
}

impl JetRole {
    const ALL: [JetRole; 3] = [JetRole::B, JetRole::J2, JetRole::J3];

    /// The index of the jet in this role.
    pub fn index(&self, cand: &TopCandidate) -> usize {
        let [ib, ij2, ij3] = cand.indices();
        match self {
            JetRole::B => ib,
            JetRole::J2 => ij2,
            JetRole::J3 => ij3,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            JetRole::B => "b",
            JetRole::J2 => "j2",
            JetRole::J3 => "j3",
        }
    }
}

/// Per-jet inputs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JetVariable {
    /// Transverse momentum
    Pt,
    /// Pseudorapidity
    Eta,
    /// Invariant mass
    Mass,
    /// b-tagging discriminant
    Csv,
    /// Charm-versus-light discriminant
    Cvsl,
    /// $`p_TD`$
    PtD,
    /// Major shape axis
    Axis1,
    /// Minor shape axis
    Axis2,
    /// Constituent multiplicity
    Mult,
}

impl JetVariable {
    const ALL: [JetVariable; 9] = [
        JetVariable::Pt,
        JetVariable::Eta,
        JetVariable::Mass,
        JetVariable::Csv,
        JetVariable::Cvsl,
        JetVariable::PtD,
        JetVariable::Axis1,
        JetVariable::Axis2,
        JetVariable::Mult,
    ];

    fn value(&self, jet: &Jet) -> f64 {
        match self {
            JetVariable::Pt => jet.p4.pt(),
            JetVariable::Eta => jet.p4.eta(),
            JetVariable::Mass => jet.p4.m(),
            JetVariable::Csv => jet.csv,
            JetVariable::Cvsl => jet.cvsl,
            JetVariable::PtD => jet.ptd,
            JetVariable::Axis1 => jet.axis1,
            JetVariable::Axis2 => jet.axis2,
            JetVariable::Mult => jet.mult,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            JetVariable::Pt => "pt",
            JetVariable::Eta => "eta",
            JetVariable::Mass => "mass",
            JetVariable::Csv => "csv",
            JetVariable::Cvsl => "cvsl",
            JetVariable::PtD => "ptD",
            JetVariable::Axis1 => "axis1",
            JetVariable::Axis2 => "axis2",
            JetVariable::Mult => "mult",
        }
    }
}

/// Inputs computed from the summed momentum of the $`W`$ or top candidate.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemVariable {
    /// Transverse momentum
    Pt,
    /// Pseudorapidity
    Eta,
    /// Invariant mass
    Mass,
    /// Transverse momentum times the $`\Delta R`$ between the two decay products
    PtDR,
}

impl SystemVariable {
    const ALL: [SystemVariable; 4] = [
        SystemVariable::Pt,
        SystemVariable::Eta,
        SystemVariable::Mass,
        SystemVariable::PtDR,
    ];

    fn label(&self) -> &'static str {
        match self {
            SystemVariable::Pt => "pt",
            SystemVariable::Eta => "eta",
            SystemVariable::Mass => "mass",
            SystemVariable::PtDR => "ptDR",
        }
    }
}

/// A named input feature of a [`TopCandidate`].
///
/// The [`Display`] form is the name the discriminant was trained with (for example
/// `var_b_csv` or `var_topcand_ptDR`) and [`FromStr`] is its inverse, so the variable list of
/// a model file can be resolved once and then evaluated for every candidate without any string
/// handling.
///
/// The two decay products of the $`W`$ candidate are the light jets, and those of the top
/// candidate are the b-jet and the $`W`$ candidate. The soft-drop style variables are
/// ```math
/// \text{sd}_0 = \frac{\min(p_{T,2}, p_{T,3})}{p_{T,2} + p_{T,3}},\quad \text{sd}_{n2} = \text{sd}_0 \, \Delta R_{23}^2
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateVariable {
    /// A property of one of the three jets
    Jet(JetRole, JetVariable),
    /// A property of the $`W`$ candidate
    WCand(SystemVariable),
    /// A property of the top candidate
    TopCand(SystemVariable),
    /// Invariant mass of the b-jet and the first light jet
    BJ2Mass,
    /// Invariant mass of the b-jet and the second light jet
    BJ3Mass,
    /// $`\Delta R`$ between the b-jet and the first light jet
    BJ2DeltaR,
    /// $`\Delta R`$ between the b-jet and the second light jet
    BJ3DeltaR,
    /// $`\Delta R`$ between the two light jets
    J2J3DeltaR,
    /// Momentum balance of the light jets
    Sd0,
    /// Momentum balance of the light jets weighted by their squared separation
    SdN2,
}

impl CandidateVariable {
    /// Every variable, in the order used by [`TopCandidate::variables`].
    pub fn all() -> Vec<CandidateVariable> {
        let jet_variables = JetRole::ALL.into_iter().flat_map(|role| {
            JetVariable::ALL
                .into_iter()
                .map(move |variable| CandidateVariable::Jet(role, variable))
        });
        jet_variables
            .chain(SystemVariable::ALL.into_iter().map(CandidateVariable::WCand))
            .chain(SystemVariable::ALL.into_iter().map(CandidateVariable::TopCand))
            .chain([
                CandidateVariable::BJ2Mass,
                CandidateVariable::BJ3Mass,
                CandidateVariable::BJ2DeltaR,
                CandidateVariable::BJ3DeltaR,
                CandidateVariable::J2J3DeltaR,
                CandidateVariable::Sd0,
                CandidateVariable::SdN2,
            ])
            .collect()
    }

    /// Evaluate the variable for a candidate. `jets` must be the collection the candidate was
    /// built from.
    ///
    /// Degenerate kinematics (a jet along the beam axis, for instance) can produce values
    /// which are not finite; these are passed through unchanged.
    ///
    /// # Panics
    ///
    /// Panics if one of the candidate's jet indices is out of range for `jets`.
    pub fn value(&self, cand: &TopCandidate, jets: &[Jet]) -> f64 {
        let [ib, ij2, ij3] = cand.indices();
        let (b, j2, j3) = (&jets[ib].p4, &jets[ij2].p4, &jets[ij3].p4);
        match self {
            CandidateVariable::Jet(role, variable) => variable.value(&jets[role.index(cand)]),
            CandidateVariable::WCand(variable) => match variable {
                SystemVariable::Pt => cand.wcand.pt(),
                SystemVariable::Eta => cand.wcand.eta(),
                SystemVariable::Mass => cand.wcand.m(),
                SystemVariable::PtDR => cand.wcand.pt() * j2.delta_r(j3),
            },
            CandidateVariable::TopCand(variable) => match variable {
                SystemVariable::Pt => cand.topcand.pt(),
                SystemVariable::Eta => cand.topcand.eta(),
                SystemVariable::Mass => cand.topcand.m(),
                SystemVariable::PtDR => cand.topcand.pt() * b.delta_r(&cand.wcand),
            },
            CandidateVariable::BJ2Mass => (b + j2).m(),
            CandidateVariable::BJ3Mass => (b + j3).m(),
            CandidateVariable::BJ2DeltaR => b.delta_r(j2),
            CandidateVariable::BJ3DeltaR => b.delta_r(j3),
            CandidateVariable::J2J3DeltaR => j2.delta_r(j3),
            CandidateVariable::Sd0 => sd_0(j2.pt(), j3.pt()),
            CandidateVariable::SdN2 => sd_0(j2.pt(), j3.pt()) * j2.delta_r(j3).powi(2),
        }
    }
}

fn sd_0(pt2: f64, pt3: f64) -> f64 {
    pt2.min(pt3) / (pt2 + pt3)
}

impl Display for CandidateVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CandidateVariable::Jet(role, variable) => {
                write!(f, "var_{}_{}", role.label(), variable.label())
            }
            CandidateVariable::WCand(variable) => write!(f, "var_wcand_{}", variable.label()),
            CandidateVariable::TopCand(variable) => write!(f, "var_topcand_{}", variable.label()),
            CandidateVariable::BJ2Mass => write!(f, "var_b_j2_mass"),
            CandidateVariable::BJ3Mass => write!(f, "var_b_j3_mass"),
            CandidateVariable::BJ2DeltaR => write!(f, "var_b_j2_deltaR"),
            CandidateVariable::BJ3DeltaR => write!(f, "var_b_j3_deltaR"),
            CandidateVariable::J2J3DeltaR => write!(f, "var_j2_j3_deltaR"),
            CandidateVariable::Sd0 => write!(f, "var_sd_0"),
            CandidateVariable::SdN2 => write!(f, "var_sd_n2"),
        }
    }
}

impl FromStr for CandidateVariable {
    type Err = RestopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::all()
            .into_iter()
            .find(|variable| variable.to_string() == name)
            .ok_or_else(|| RestopError::UnknownVariable {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_relative_eq;
    use restop_core::Vec4;

    use super::*;

    fn jets() -> Vec<Jet> {
        vec![
            Jet::new(Vec4::from_pt_eta_phi_m(100.0, 0.0, 0.0, 5.0))
                .with_csv(0.9)
                .with_shape(0.7, 0.03, 0.02, 20.0),
            Jet::new(Vec4::from_pt_eta_phi_m(50.0, 0.5, 1.0, 0.0))
                .with_csv(0.1)
                .with_cvsl(0.3),
            Jet::new(Vec4::from_pt_eta_phi_m(30.0, -0.5, 2.0, 0.0))
                .with_csv(0.2)
                .with_shape(0.4, 0.06, 0.05, 11.0),
        ]
    }

    #[test]
    fn test_names() {
        let all = CandidateVariable::all();
        assert_eq!(all.len(), 42);
        let names: HashSet<String> = all.iter().map(|v| v.to_string()).collect();
        assert_eq!(names.len(), all.len());
        for name in [
            "var_b_pt",
            "var_j2_ptD",
            "var_j3_mult",
            "var_wcand_ptDR",
            "var_topcand_mass",
            "var_b_j3_deltaR",
            "var_sd_n2",
        ] {
            assert!(names.contains(name), "{name} is missing");
        }
    }

    #[test]
    fn test_parse() {
        for variable in CandidateVariable::all() {
            assert_eq!(
                variable.to_string().parse::<CandidateVariable>().unwrap(),
                variable
            );
        }
        assert_eq!(
            " var_j2_axis1 ".parse::<CandidateVariable>().unwrap(),
            CandidateVariable::Jet(JetRole::J2, JetVariable::Axis1)
        );
        assert!(matches!(
            "var_j4_pt".parse::<CandidateVariable>(),
            Err(RestopError::UnknownVariable { .. })
        ));
        assert!("var_B_pt".parse::<CandidateVariable>().is_err());
    }

    #[test]
    fn test_jet_values() {
        let jets = jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        let value = |name: &str| name.parse::<CandidateVariable>().unwrap().value(&cand, &jets);
        assert_relative_eq!(value("var_b_pt"), 100.0, epsilon = 1e-9);
        assert_relative_eq!(value("var_b_eta"), 0.0, epsilon = 1e-9);
        assert_relative_eq!(value("var_b_mass"), 5.0, epsilon = 1e-6);
        assert_relative_eq!(value("var_b_csv"), 0.9);
        assert_relative_eq!(value("var_b_mult"), 20.0);
        assert_relative_eq!(value("var_j2_eta"), 0.5, epsilon = 1e-9);
        assert_relative_eq!(value("var_j2_cvsl"), 0.3);
        assert_relative_eq!(value("var_j3_axis2"), 0.05);
        assert_relative_eq!(value("var_j3_ptD"), 0.4);
    }

    #[test]
    fn test_system_values() {
        let jets = jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        let value = |name: &str| name.parse::<CandidateVariable>().unwrap().value(&cand, &jets);
        let dr23 = f64::sqrt(2.0);
        assert_relative_eq!(value("var_j2_j3_deltaR"), dr23, epsilon = 1e-9);
        assert_relative_eq!(value("var_b_j2_deltaR"), f64::sqrt(1.25), epsilon = 1e-9);
        assert_relative_eq!(value("var_b_j3_deltaR"), f64::sqrt(4.25), epsilon = 1e-9);
        assert_relative_eq!(value("var_wcand_mass"), cand.wcand.m());
        assert_relative_eq!(value("var_topcand_pt"), cand.topcand.pt());
        assert_relative_eq!(
            value("var_wcand_ptDR"),
            cand.wcand.pt() * dr23,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            value("var_topcand_ptDR"),
            cand.topcand.pt() * jets[0].p4.delta_r(&cand.wcand)
        );
        assert_relative_eq!(
            value("var_b_j2_mass"),
            (jets[0].p4 + jets[1].p4).m(),
            epsilon = 1e-9
        );
        assert_relative_eq!(value("var_sd_0"), 0.375, epsilon = 1e-9);
        assert_relative_eq!(value("var_sd_n2"), 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_roles_follow_candidate() {
        let jets = jets();
        let cand = TopCandidate::new(&jets, 2, 0, 1).unwrap();
        let variable = CandidateVariable::Jet(JetRole::B, JetVariable::Csv);
        assert_relative_eq!(variable.value(&cand, &jets), 0.2);
        assert_eq!(JetRole::J2.index(&cand), 0);
        assert_eq!(JetRole::J3.index(&cand), 1);
    }

    #[test]
    fn test_beam_axis_jet() {
        let mut jets = jets();
        jets[0] = Jet::new(Vec4::new(0.0, 0.0, 50.0, 50.0)).with_csv(0.9);
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        assert!(!CandidateVariable::BJ2DeltaR.value(&cand, &jets).is_finite());
        assert!(CandidateVariable::J2J3DeltaR
            .value(&cand, &jets)
            .is_finite());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_value_with_other_jets() {
        let jets = jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        CandidateVariable::TopCand(SystemVariable::Mass).value(&cand, &jets[..2]);
    }
}
