use std::fmt::Display;

use indexmap::IndexMap;
use restop_core::{Jet, RestopError, RestopResult, Vec4};
use serde::{Deserialize, Serialize};

use crate::variables::CandidateVariable;

/// Nominal $`W`$ boson mass (GeV) used by [`TopCandidate::pass_mass_w`]
pub const W_MASS: f64 = 80.0;
/// Nominal top quark mass (GeV) used by [`TopCandidate::pass_mass_top`]
pub const TOP_MASS: f64 = 175.0;
/// Default half-width of the $`W`$ mass window (GeV)
pub const W_MASS_RANGE: f64 = 40.0;
/// Default half-width of the top mass window (GeV)
pub const TOP_MASS_RANGE: f64 = 80.0;

/// A hadronic top quark hypothesis built from three distinct jets of one event: a b-jet and
/// two light jets which form the $`W`$ candidate.
///
/// The candidate only stores jet indices and the summed four-momenta; the jets themselves stay
/// with the caller. The role of each jet is fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TopCandidate {
    ib: usize,
    ij2: usize,
    ij3: usize,
    /// Sum of the two light-jet four-momenta
    pub wcand: Vec4,
    /// Sum of all three jet four-momenta
    pub topcand: Vec4,
    discriminant: Option<f64>,
}

impl TopCandidate {
    /// Build the candidate with jet `ib` as the b-jet and jets `ij2` and `ij3` as the light
    /// jets.
    ///
    /// # Errors
    ///
    /// Returns [`RestopError::InvalidCandidate`] if an index is repeated or out of range for
    /// `jets`.
    pub fn new(jets: &[Jet], ib: usize, ij2: usize, ij3: usize) -> RestopResult<Self> {
        let n_jets = jets.len();
        if ib == ij2 || ib == ij3 || ij2 == ij3 || ib.max(ij2).max(ij3) >= n_jets {
            return Err(RestopError::InvalidCandidate {
                ib,
                ij2,
                ij3,
                n_jets,
            });
        }
        Ok(Self::new_unchecked(jets, ib, ij2, ij3))
    }

    pub(crate) fn new_unchecked(jets: &[Jet], ib: usize, ij2: usize, ij3: usize) -> Self {
        let wcand = jets[ij2].p4 + jets[ij3].p4;
        let topcand = jets[ib].p4 + wcand;
        Self {
            ib,
            ij2,
            ij3,
            wcand,
            topcand,
            discriminant: None,
        }
    }

    /// Index of the b-jet.
    pub fn b_index(&self) -> usize {
        self.ib
    }

    /// Indices of the two light jets.
    pub fn light_indices(&self) -> [usize; 2] {
        [self.ij2, self.ij3]
    }

    /// All three indices as `[b, j2, j3]`.
    pub fn indices(&self) -> [usize; 3] {
        [self.ib, self.ij2, self.ij3]
    }

    /// The discriminant assigned by the candidate model, or [`None`] if the candidate has not
    /// been scored.
    pub fn discriminant(&self) -> Option<f64> {
        self.discriminant
    }

    pub(crate) fn set_discriminant(&mut self, score: f64) {
        self.discriminant = Some(score);
    }

    /// Whether $`|m_W - 80| \le`$ `range`.
    pub fn pass_mass_w(&self, range: f64) -> bool {
        (self.wcand.m() - W_MASS).abs() <= range
    }

    /// Whether $`|m_t - 175| \le`$ `range`.
    pub fn pass_mass_top(&self, range: f64) -> bool {
        (self.topcand.m() - TOP_MASS).abs() <= range
    }

    /// Mass-window category with the default ranges: 0 if neither window is passed, 1 for the
    /// $`W`$ window only, 2 for the top window only, and 3 for both.
    pub fn mass_category(&self) -> u8 {
        u8::from(self.pass_mass_w(W_MASS_RANGE)) + 2 * u8::from(self.pass_mass_top(TOP_MASS_RANGE))
    }

    /// The same jets in the same roles.
    pub fn same_as(&self, other: &TopCandidate) -> bool {
        self.indices() == other.indices()
    }

    /// At least one jet is shared, in any role.
    pub fn overlaps(&self, other: &TopCandidate) -> bool {
        let theirs = other.indices();
        self.indices().iter().any(|index| theirs.contains(index))
    }

    /// Whether the candidate is made of exactly the given jets, regardless of role (used to
    /// compare against generator-matched jets).
    pub fn is_permutation_of(&self, indices: &[usize; 3]) -> bool {
        let mut ours = self.indices();
        let mut theirs = *indices;
        ours.sort_unstable();
        theirs.sort_unstable();
        ours == theirs
    }

    /// Every [`CandidateVariable`] of this candidate by name, in a fixed order.
    ///
    /// `jets` must be the collection the candidate was built from.
    pub fn variables(&self, jets: &[Jet]) -> IndexMap<String, f64> {
        CandidateVariable::all()
            .iter()
            .map(|variable| (variable.to_string(), variable.value(self, jets)))
            .collect()
    }
}

impl Display for TopCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TopCandidate(b = {}, j2 = {}, j3 = {}; m_W = {:.3}, m_top = {:.3}, disc = ",
            self.ib,
            self.ij2,
            self.ij3,
            self.wcand.m(),
            self.topcand.m()
        )?;
        match self.discriminant {
            Some(score) => write!(f, "{:.4})", score),
            None => write!(f, "unscored)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use restop_core::test_jets;

    use super::*;

    #[test]
    fn test_momenta() {
        let jets = test_jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        assert_relative_eq!(cand.wcand, jets[1].p4 + jets[2].p4);
        assert_relative_eq!(cand.topcand, jets[0].p4 + jets[1].p4 + jets[2].p4);
        assert_relative_eq!(cand.wcand.m(), 80.0);
        assert_relative_eq!(cand.topcand.m(), 175.0);
        assert_eq!(cand.discriminant(), None);
    }

    #[test]
    fn test_mass_windows() {
        let jets = test_jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        assert!(cand.pass_mass_w(W_MASS_RANGE));
        assert!(cand.pass_mass_top(TOP_MASS_RANGE));
        assert!(cand.pass_mass_w(0.0));
        assert_eq!(cand.mass_category(), 3);

        // m(jet1 + jet3) is about 47.2 GeV
        let cand = TopCandidate::new(&jets, 0, 1, 3).unwrap();
        assert_relative_eq!(cand.wcand.m(), 2231.25_f64.sqrt(), epsilon = 1e-9);
        assert!(cand.pass_mass_w(W_MASS_RANGE));
        assert!(!cand.pass_mass_w(30.0));
        assert!(!cand.pass_mass_top(0.0));
        assert_eq!(
            cand.mass_category(),
            1 + 2 * u8::from(cand.pass_mass_top(TOP_MASS_RANGE))
        );
    }

    #[test]
    fn test_invalid_indices() {
        let jets = test_jets();
        assert!(matches!(
            TopCandidate::new(&jets, 0, 0, 2),
            Err(RestopError::InvalidCandidate { .. })
        ));
        assert!(TopCandidate::new(&jets, 1, 2, 2).is_err());
        assert!(TopCandidate::new(&jets, 2, 1, 2).is_err());
        assert!(TopCandidate::new(&jets, 0, 1, 4).is_err());
        assert!(TopCandidate::new(&jets[..2], 0, 1, 2).is_err());
    }

    #[test]
    fn test_same_as() {
        let jets = test_jets();
        let a = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        let b = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        let swapped_roles = TopCandidate::new(&jets, 1, 0, 2).unwrap();
        let other = TopCandidate::new(&jets, 0, 1, 3).unwrap();
        assert!(a.same_as(&a));
        assert!(a.same_as(&b) && b.same_as(&a));
        assert!(!a.same_as(&swapped_roles));
        assert!(!a.same_as(&other));
    }

    #[test]
    fn test_overlaps() {
        let jets = test_jets();
        let mut extended = jets.clone();
        extended.extend(jets.iter().copied());
        let a = TopCandidate::new(&extended, 0, 1, 2).unwrap();
        let roles_differ = TopCandidate::new(&extended, 3, 4, 0).unwrap();
        let disjoint = TopCandidate::new(&extended, 3, 4, 5).unwrap();
        assert!(a.overlaps(&a));
        assert!(a.overlaps(&roles_differ) && roles_differ.overlaps(&a));
        assert!(!a.overlaps(&disjoint) && !disjoint.overlaps(&a));
    }

    #[test]
    fn test_is_permutation_of() {
        let jets = test_jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        assert!(cand.is_permutation_of(&[2, 0, 1]));
        assert!(cand.is_permutation_of(&[0, 1, 2]));
        assert!(!cand.is_permutation_of(&[0, 1, 3]));
    }

    #[test]
    fn test_variables_map() {
        let jets = test_jets();
        let cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        let vars = cand.variables(&jets);
        assert_eq!(vars.len(), CandidateVariable::all().len());
        assert_eq!(vars.get_index(0).unwrap().0, "var_b_pt");
        assert_relative_eq!(vars["var_wcand_mass"], 80.0);
        assert_relative_eq!(vars["var_topcand_mass"], 175.0);
        assert_relative_eq!(vars["var_b_csv"], 0.92);
    }

    #[test]
    fn test_display() {
        let jets = test_jets();
        let mut cand = TopCandidate::new(&jets, 0, 1, 2).unwrap();
        assert_eq!(
            format!("{}", cand),
            "TopCandidate(b = 0, j2 = 1, j3 = 2; m_W = 80.000, m_top = 175.000, disc = unscored)"
        );
        cand.set_discriminant(0.5);
        assert!(format!("{}", cand).ends_with("disc = 0.5000)"));
    }
}
