use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::RestopError;

/// Threshold of [`WorkingPoint::All`]. Kept for reference: [`WorkingPoint::threshold`] returns
/// [`None`] for this working point rather than this number.
pub const WP_ALL: f64 = -1.0;
/// Threshold of [`WorkingPoint::Loose`]
pub const WP_LOOSE: f64 = 0.83;
/// Threshold of [`WorkingPoint::Medium`]
pub const WP_MEDIUM: f64 = 0.98;
/// Threshold of [`WorkingPoint::Tight`]
pub const WP_TIGHT: f64 = 0.99;

/// Named minimum discriminant scores for accepting a top candidate.
///
/// [`WorkingPoint::All`] places no requirement on the score at all and is meant for studies of
/// the raw candidate pool.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum WorkingPoint {
    /// Keep every candidate.
    All,
    /// Discriminant of at least [`WP_LOOSE`].
    Loose,
    /// Discriminant of at least [`WP_MEDIUM`].
    Medium,
    /// Discriminant of at least [`WP_TIGHT`].
    #[default]
    Tight,
    /// A user-supplied minimum discriminant.
    Custom(f64),
}

impl WorkingPoint {
    /// The minimum accepted discriminant, or [`None`] if every score is accepted.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            WorkingPoint::All => None,
            WorkingPoint::Loose => Some(WP_LOOSE),
            WorkingPoint::Medium => Some(WP_MEDIUM),
            WorkingPoint::Tight => Some(WP_TIGHT),
            WorkingPoint::Custom(threshold) => Some(*threshold),
        }
    }

    /// Check whether a discriminant passes this working point.
    pub fn accepts(&self, score: f64) -> bool {
        self.threshold().map_or(true, |threshold| score >= threshold)
    }
}

impl Display for WorkingPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkingPoint::All => write!(f, "All"),
            WorkingPoint::Loose => write!(f, "Loose"),
            WorkingPoint::Medium => write!(f, "Medium"),
            WorkingPoint::Tight => write!(f, "Tight"),
            WorkingPoint::Custom(threshold) => write!(f, "Custom({})", threshold),
        }
    }
}

impl FromStr for WorkingPoint {
    type Err = RestopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "none" => Ok(Self::All),
            "loose" | "l" => Ok(Self::Loose),
            "medium" | "m" => Ok(Self::Medium),
            "tight" | "t" => Ok(Self::Tight),
            other => other
                .parse::<f64>()
                .ok()
                .filter(|threshold| threshold.is_finite())
                .map(Self::Custom)
                .ok_or_else(|| RestopError::ParseError {
                    name: s.to_string(),
                    object: "WorkingPoint".to_string(),
                }),
        }
    }
}

/// DeepCSV b-tagging working points, with the thresholds recommended for 2017 data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BTagWorkingPoint {
    /// 10% light-flavour mistag rate
    Loose,
    /// 1% light-flavour mistag rate
    Medium,
    /// 0.1% light-flavour mistag rate
    Tight,
}

impl BTagWorkingPoint {
    /// The minimum DeepCSV discriminant of a tagged jet.
    pub fn threshold(&self) -> f64 {
        match self {
            BTagWorkingPoint::Loose => 0.1522,
            BTagWorkingPoint::Medium => 0.4941,
            BTagWorkingPoint::Tight => 0.8001,
        }
    }
}

impl Display for BTagWorkingPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BTagWorkingPoint::Loose => write!(f, "Loose"),
            BTagWorkingPoint::Medium => write!(f, "Medium"),
            BTagWorkingPoint::Tight => write!(f, "Tight"),
        }
    }
}

impl FromStr for BTagWorkingPoint {
    type Err = RestopError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loose" | "l" => Ok(Self::Loose),
            "medium" | "m" => Ok(Self::Medium),
            "tight" | "t" => Ok(Self::Tight),
            _ => Err(RestopError::ParseError {
                name: s.to_string(),
                object: "BTagWorkingPoint".to_string(),
            }),
        }
    }
}
