// Vector helpers shared by the field models, the source and the processes

use nalgebra::Vector3;
use rand::Rng;

/// Three-component real vector used for positions, momenta and fields.
pub type ThreeVector = Vector3<f64>;

/// Returns a unit vector along `v`, or the zero vector if `v` has no length.
pub fn unit_or_zero(v: &ThreeVector) -> ThreeVector {
    let norm = v.norm();
    if norm > 0.0 {
        v / norm
    } else {
        ThreeVector::zeros()
    }
}

/// Two unit vectors completing `n` to a right-handed orthonormal basis
/// `(e1, e2, n)`.
///
/// `n` must be normalized. For `n = ẑ` this gives `e1 = x̂`, `e2 = ŷ`.
pub fn transverse_basis(n: &ThreeVector) -> (ThreeVector, ThreeVector) {
    // Reference axis must not be (anti)parallel to n
    let reference = if n.z.abs() < 0.99 {
        ThreeVector::new(0.0, 0.0, 1.0)
    } else {
        ThreeVector::new(1.0, 0.0, 0.0)
    };
    let e1 = (reference - n * n.dot(&reference)).normalize();
    let e2 = n.cross(&e1);
    (e1, e2)
}

/// Rotate a direction vector by angle theta (cos(theta) = mu) and azimuth phi
/// around itself.
///
/// The result has cosine `mu` with respect to `u_old`.
pub fn rotate_direction_3d(u_old: &ThreeVector, mu: f64, phi: f64) -> ThreeVector {
    let sin_theta = (1.0 - mu * mu).max(0.0).sqrt();
    let (perp, ortho) = transverse_basis(u_old);
    mu * u_old + sin_theta * phi.cos() * perp + sin_theta * phi.sin() * ortho
}

/// Sample a direction uniformly in solid angle inside a cone of half-angle
/// `half_angle` around `axis`.
pub fn sample_cone<R: Rng + ?Sized>(axis: &ThreeVector, half_angle: f64, rng: &mut R) -> ThreeVector {
    if half_angle <= 0.0 {
        return *axis;
    }
    let cos_max = half_angle.min(std::f64::consts::PI).cos();
    let mu = 1.0 - rng.gen::<f64>() * (1.0 - cos_max);
    let phi = 2.0 * std::f64::consts::PI * rng.gen::<f64>();
    rotate_direction_3d(axis, mu, phi)
}
