use std::f64::consts::PI;

/// Useful enumerations for working points and b-tagging thresholds.
pub mod enums;
/// Four-momenta with the usual collider accessors (transverse momentum, pseudorapidity,
/// azimuth).
pub mod vectors;

/// Wrap an azimuthal difference into $`[-\pi, \pi]`$.
pub fn wrap_phi(dphi: f64) -> f64 {
    let mut dphi = dphi % (2.0 * PI);
    if dphi > PI {
        dphi -= 2.0 * PI;
    } else if dphi < -PI {
        dphi += 2.0 * PI;
    }
    dphi
}

/// The distance $`\Delta R = \sqrt{\Delta\eta^2 + \Delta\phi^2}`$ between two directions given as
/// pseudorapidity and azimuth.
pub fn delta_r(eta1: f64, phi1: f64, eta2: f64, phi2: f64) -> f64 {
    let deta = eta1 - eta2;
    let dphi = wrap_phi(phi1 - phi2);
    f64::sqrt(deta * deta + dphi * dphi)
}
