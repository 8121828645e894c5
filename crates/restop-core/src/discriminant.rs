use std::fmt::Debug;

use crate::{RestopError, RestopResult};

/// A trained multivariate classifier which maps a fixed, ordered list of named input variables
/// to a single score.
///
/// Implementors only need to provide [`Discriminant::name`], [`Discriminant::variables`], and
/// the raw evaluation [`Discriminant::compute`]. Callers should go through
/// [`Discriminant::evaluate`], which checks the length and finiteness of the feature vector
/// before it reaches the model.
///
/// Discriminants are immutable once constructed, so a single instance can be shared across
/// threads which process different events.
pub trait Discriminant: Send + Sync + Debug {
    /// A label for the discriminant (typically the name the method was trained under).
    fn name(&self) -> &str;

    /// The names of the input variables, in the order [`Discriminant::compute`] expects them.
    fn variables(&self) -> &[String];

    /// Evaluate the model on a feature vector which is already known to be well formed.
    fn compute(&self, features: &[f64]) -> f64;

    /// Evaluate the model, rejecting feature vectors of the wrong length or which contain NaN or
    /// infinite values.
    ///
    /// # Errors
    ///
    /// Returns [`RestopError::FeatureLengthMismatch`] or [`RestopError::NonFiniteFeature`] for
    /// a malformed input, and [`RestopError::NonFiniteScore`] if the model itself produces NaN
    /// or an infinite score.
    fn evaluate(&self, features: &[f64]) -> RestopResult<f64> {
        check_features(self.variables(), features)?;
        let score = self.compute(features);
        if !score.is_finite() {
            return Err(RestopError::NonFiniteScore {
                model: self.name().to_string(),
                score,
            });
        }
        Ok(score)
    }
}

/// Check that `features` has one finite entry per name in `variables`.
pub fn check_features(variables: &[String], features: &[f64]) -> RestopResult<()> {
    if variables.len() != features.len() {
        return Err(RestopError::FeatureLengthMismatch {
            expected: variables.len(),
            found: features.len(),
        });
    }
    if let Some((name, value)) = variables
        .iter()
        .zip(features)
        .find(|(_, value)| !value.is_finite())
    {
        return Err(RestopError::NonFiniteFeature {
            name: name.clone(),
            value: *value,
        });
    }
    Ok(())
}
