use std::fmt::Display;

use approx::{AbsDiffEq, RelativeEq};
use auto_ops::impl_op_ex;
use serde::{Deserialize, Serialize};

use crate::utils::{delta_r, wrap_phi};

/// A four-momentum (Lorentz vector) whose last component stores the energy.
///
/// Alongside the Cartesian components, the collider coordinates used to describe jets are
/// available: transverse momentum [`Vec4::pt`], pseudorapidity [`Vec4::eta`] and azimuth
/// [`Vec4::phi`].
///
/// # Examples
/// ```rust
/// use restop_core::utils::vectors::Vec4;
///
/// let jet = Vec4::from_pt_eta_phi_m(50.0, 0.5, 1.0, 10.0);
/// assert!((jet.pt() - 50.0).abs() < 1e-9);
/// assert!((jet.m() - 10.0).abs() < 1e-9);
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    /// Momentum along x
    pub x: f64,
    /// Momentum along y
    pub y: f64,
    /// Momentum along the beam axis
    pub z: f64,
    /// Energy
    pub t: f64,
}

impl Display for Vec4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:6.3}, {:6.3}, {:6.3}; {:6.3}]",
            self.x, self.y, self.z, self.t
        )
    }
}

impl AbsDiffEq for Vec4 {
    type Epsilon = <f64 as approx::AbsDiffEq>::Epsilon;

    fn default_epsilon() -> Self::Epsilon {
        f64::default_epsilon()
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: Self::Epsilon) -> bool {
        f64::abs_diff_eq(&self.x, &other.x, epsilon)
            && f64::abs_diff_eq(&self.y, &other.y, epsilon)
            && f64::abs_diff_eq(&self.z, &other.z, epsilon)
            && f64::abs_diff_eq(&self.t, &other.t, epsilon)
    }
}
impl RelativeEq for Vec4 {
    fn default_max_relative() -> Self::Epsilon {
        f64::default_max_relative()
    }

    fn relative_eq(
        &self,
        other: &Self,
        epsilon: Self::Epsilon,
        max_relative: Self::Epsilon,
    ) -> bool {
        f64::relative_eq(&self.x, &other.x, epsilon, max_relative)
            && f64::relative_eq(&self.y, &other.y, epsilon, max_relative)
            && f64::relative_eq(&self.z, &other.z, epsilon, max_relative)
            && f64::relative_eq(&self.t, &other.t, epsilon, max_relative)
    }
}

impl Vec4 {
    /// Create a new 4-vector from its momentum components and energy
    pub fn new(x: f64, y: f64, z: f64, t: f64) -> Self {
        Vec4 { x, y, z, t }
    }

    /// Create a 4-vector from transverse momentum, pseudorapidity, azimuth, and mass (the
    /// usual storage format of reconstructed jets).
    pub fn from_pt_eta_phi_m(pt: f64, eta: f64, phi: f64, m: f64) -> Self {
        let x = pt * f64::cos(phi);
        let y = pt * f64::sin(phi);
        let z = pt * f64::sinh(eta);
        let t = f64::sqrt(m * m + x * x + y * y + z * z);
        Vec4 { x, y, z, t }
    }

    /// The transverse momentum
    pub fn pt(&self) -> f64 {
        f64::hypot(self.x, self.y)
    }

    /// The pseudorapidity $`\eta = \sinh^{-1}(p_z / p_T)`$
    ///
    /// This is infinite for vectors along the beam axis and NaN for the zero vector.
    pub fn eta(&self) -> f64 {
        f64::asinh(self.z / self.pt())
    }

    /// The azimuthal angle $`\phi`$
    pub fn phi(&self) -> f64 {
        f64::atan2(self.y, self.x)
    }

    /// The invariant mass corresponding to this 4-momentum
    ///
    /// Rounding can leave a slightly negative $`m^2`$ for (nearly) massless vectors, in which
    /// case $`-\sqrt{-m^2}`$ is returned rather than NaN.
    pub fn m(&self) -> f64 {
        let m2 = self.m2();
        if m2 < 0.0 {
            -f64::sqrt(-m2)
        } else {
            f64::sqrt(m2)
        }
    }

    /// The squared invariant mass corresponding to this 4-momentum
    pub fn m2(&self) -> f64 {
        self.mag2()
    }

    /// The squared magnitude of the vector (with $`---+`$ signature).
    pub fn mag2(&self) -> f64 {
        self.t * self.t - (self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// The azimuthal separation between two 4-vectors, wrapped into $`[-\pi, \pi]`$
    pub fn delta_phi(&self, other: &Vec4) -> f64 {
        wrap_phi(self.phi() - other.phi())
    }

    /// The angular distance $`\Delta R = \sqrt{\Delta\eta^2 + \Delta\phi^2}`$ between two
    /// 4-vectors
    pub fn delta_r(&self, other: &Vec4) -> f64 {
        delta_r(self.eta(), self.phi(), other.eta(), other.phi())
    }
}

impl_op_ex!(+ |a: &Vec4, b: &Vec4| -> Vec4 { Vec4::new(a.x + b.x, a.y + b.y, a.z + b.z, a.t + b.t) });
impl_op_ex!(-|a: &Vec4, b: &Vec4| -> Vec4 {
    Vec4::new(a.x - b.x, a.y - b.y, a.z - b.z, a.t - b.t)
});

impl<'a> std::iter::Sum<&'a Vec4> for Vec4 {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}

impl std::iter::Sum<Vec4> for Vec4 {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |a, b| a + b)
    }
}
