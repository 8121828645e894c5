use std::{cmp::Ordering, sync::Arc};

#[cfg(feature = "rayon")]
use rayon::prelude::*;
use restop_core::{BTagWorkingPoint, Discriminant, Jet, RestopResult, WorkingPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    candidate::{TopCandidate, TOP_MASS_RANGE, W_MASS_RANGE},
    variables::CandidateVariable,
};

/// Half-widths of the mass windows used to preselect candidates before they are scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassWindows {
    /// Half-width of the window around the $`W`$ mass (GeV)
    pub w_range: f64,
    /// Half-width of the window around the top mass (GeV)
    pub top_range: f64,
}

impl Default for MassWindows {
    fn default() -> Self {
        Self {
            w_range: W_MASS_RANGE,
            top_range: TOP_MASS_RANGE,
        }
    }
}

impl MassWindows {
    /// Whether a candidate falls inside both windows.
    pub fn accepts(&self, cand: &TopCandidate) -> bool {
        cand.pass_mass_w(self.w_range) && cand.pass_mass_top(self.top_range)
    }
}

/// Settings of a [`ResolvedTopTagger`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Minimum b-tagging discriminant for a jet to be used in the b-jet role
    pub btag_threshold: f64,
    /// Optional mass windows; candidates outside them are never scored
    pub mass_preselection: Option<MassWindows>,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            btag_threshold: BTagWorkingPoint::Medium.threshold(),
            mass_preselection: None,
        }
    }
}

impl TaggerConfig {
    /// Set the b-tagging threshold directly.
    pub fn with_btag_threshold(mut self, threshold: f64) -> Self {
        self.btag_threshold = threshold;
        self
    }

    /// Set the b-tagging threshold from a named working point.
    pub fn with_btag_working_point(mut self, working_point: BTagWorkingPoint) -> Self {
        self.btag_threshold = working_point.threshold();
        self
    }

    /// Only score candidates inside the given mass windows.
    pub fn with_mass_preselection(mut self, windows: MassWindows) -> Self {
        self.mass_preselection = Some(windows);
        self
    }
}

/// Builds, scores, and selects resolved top quark candidates.
///
/// For each event, every combination of one b-tagged jet with an unordered pair of the
/// remaining jets is turned into a [`TopCandidate`], the candidate model is evaluated on the
/// variables it was trained with, and [`remove_overlap`] reduces the scored pool to a
/// jet-disjoint list ordered by discriminant.
///
/// The tagger holds no per-event state, so one instance can be shared by all threads of a
/// job (see [`ResolvedTopTagger::tag_events`]).
#[derive(Debug, Clone)]
pub struct ResolvedTopTagger {
    model: Arc<dyn Discriminant>,
    variables: Vec<CandidateVariable>,
    config: TaggerConfig,
}

impl ResolvedTopTagger {
    /// Create a tagger around a candidate model.
    ///
    /// # Errors
    ///
    /// Returns [`RestopError::UnknownVariable`](restop_core::RestopError::UnknownVariable) if
    /// the model was trained on a variable which is not a [`CandidateVariable`].
    pub fn new(model: Arc<dyn Discriminant>, config: TaggerConfig) -> RestopResult<Self> {
        let variables = model
            .variables()
            .iter()
            .map(|name| name.parse())
            .collect::<RestopResult<Vec<CandidateVariable>>>()?;
        debug!(
            model = model.name(),
            variables = variables.len(),
            btag_threshold = config.btag_threshold,
            "created resolved top tagger"
        );
        Ok(Self {
            model,
            variables,
            config,
        })
    }

    /// Create a tagger from a model file (see [`restop_mva::load`]).
    ///
    /// # Errors
    ///
    /// Fails if the model cannot be loaded or asks for an unknown variable.
    pub fn from_weights(file_path: &str, name: &str, config: TaggerConfig) -> RestopResult<Self> {
        let bdt = restop_mva::load(file_path, name)?;
        Self::new(Arc::new(bdt), config)
    }

    /// The candidate model.
    pub fn model(&self) -> &Arc<dyn Discriminant> {
        &self.model
    }

    /// The model inputs, in the order they are passed to the model.
    pub fn variables(&self) -> &[CandidateVariable] {
        &self.variables
    }

    /// The tagger settings.
    pub fn config(&self) -> &TaggerConfig {
        &self.config
    }

    /// Enumerate and score every candidate of one event, in generation order: b-jets by
    /// index, then light-jet pairs $`(j_2 < j_3)`$ in lexicographic order.
    ///
    /// Candidates rejected by the mass preselection are not returned, and neither are
    /// candidates with a NaN or infinite input or score (these are logged at `warn` level).
    pub fn candidates(&self, jets: &[Jet]) -> Vec<TopCandidate> {
        let n_jets = jets.len();
        let mut cands = Vec::new();
        let mut features = Vec::with_capacity(self.variables.len());
        for ib in (0..n_jets).filter(|&i| jets[i].is_btagged(self.config.btag_threshold)) {
            for ij2 in (0..n_jets).filter(|&i| i != ib) {
                for ij3 in (ij2 + 1..n_jets).filter(|&i| i != ib) {
                    let mut cand = TopCandidate::new_unchecked(jets, ib, ij2, ij3);
                    if let Some(windows) = &self.config.mass_preselection {
                        if !windows.accepts(&cand) {
                            continue;
                        }
                    }
                    features.clear();
                    features.extend(self.variables.iter().map(|v| v.value(&cand, jets)));
                    match self.model.evaluate(&features) {
                        Ok(score) => {
                            cand.set_discriminant(score);
                            cands.push(cand);
                        }
                        Err(err) => {
                            warn!(ib, ij2, ij3, error = %err, "skipping top candidate");
                        }
                    }
                }
            }
        }
        cands
    }

    /// The jet-disjoint list of candidates passing the working point, best first.
    pub fn top_candidates(&self, jets: &[Jet], working_point: WorkingPoint) -> Vec<TopCandidate> {
        let cands = self.candidates(jets);
        let n_scored = cands.len();
        let selected = remove_overlap(cands, working_point);
        debug!(
            n_jets = jets.len(),
            n_scored,
            n_selected = selected.len(),
            working_point = %working_point,
            "tagged event"
        );
        selected
    }

    /// [`ResolvedTopTagger::top_candidates`] for a batch of events, with one output list per
    /// event.
    pub fn tag_events(
        &self,
        events: &[Vec<Jet>],
        working_point: WorkingPoint,
    ) -> Vec<Vec<TopCandidate>> {
        #[cfg(feature = "rayon")]
        return events
            .par_iter()
            .map(|jets| self.top_candidates(jets, working_point))
            .collect();
        #[cfg(not(feature = "rayon"))]
        return events
            .iter()
            .map(|jets| self.top_candidates(jets, working_point))
            .collect();
    }
}

/// Reduce a pool of scored candidates to those which pass the working point and share no jet.
///
/// Candidates are ranked by discriminant (highest first, with ties kept in their input order;
/// `-0.0` and `0.0` tie) and accepted greedily: a candidate is kept if none of its jets belong to a candidate which
/// was already kept. Unscored candidates only pass [`WorkingPoint::All`] and rank last.
pub fn remove_overlap(
    candidates: Vec<TopCandidate>,
    working_point: WorkingPoint,
) -> Vec<TopCandidate> {
    let mut ranked: Vec<TopCandidate> = candidates
        .into_iter()
        .filter(|cand| match cand.discriminant() {
            Some(score) => working_point.accepts(score),
            None => working_point.threshold().is_none(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        let score = |cand: &TopCandidate| cand.discriminant().unwrap_or(f64::NEG_INFINITY);
        score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal)
    });
    let mut selected: Vec<TopCandidate> = Vec::new();
    for cand in ranked {
        if !selected.iter().any(|kept| kept.overlaps(&cand)) {
            selected.push(cand);
        }
    }
    selected
}
