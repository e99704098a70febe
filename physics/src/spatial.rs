//! Spatial algebra primitives: rigid transforms, twists, wrenches.
//!
//! A [`SpatialTransform`] is a rigid motion `(p, q)`: rotate by `q` then
//! translate by `p`. A [`SpatialVector`] is a 6-vector with the angular part
//! on top and the linear part on the bottom; it represents either a twist
//! (angular/linear velocity) or a wrench (torque/force) depending on context.

use glam::{Mat3, Quat, Vec3};
use nalgebra::Matrix6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpatialTransform {
    pub p: Vec3,
    pub q: Quat,
}

impl SpatialTransform {
    pub const IDENTITY: SpatialTransform = SpatialTransform {
        p: Vec3::ZERO,
        q: Quat::IDENTITY,
    };

    pub fn new(p: Vec3, q: Quat) -> Self {
        Self { p, q }
    }

    /// `T.p + rotate(T.q, x)`
    pub fn transform_point(&self, x: Vec3) -> Vec3 {
        self.p + self.q * x
    }

    /// `rotate(T.q, v)`
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        self.q * v
    }

    /// Adjoint action on a twist `(w, v)`: `(Rw, Rv + p x Rw)`.
    pub fn transform_twist(&self, twist: SpatialVector) -> SpatialVector {
        let w = self.q * twist.top;
        let v = self.q * twist.bottom + self.p.cross(w);
        SpatialVector::new(w, v)
    }

    /// Adjoint action on a wrench `(t, f)`: `(Rt + p x Rf, Rf)`.
    pub fn transform_wrench(&self, wrench: SpatialVector) -> SpatialVector {
        let f = self.q * wrench.bottom;
        let t = self.q * wrench.top + self.p.cross(f);
        SpatialVector::new(t, f)
    }

    pub fn inverse(&self) -> SpatialTransform {
        let q_inv = self.q.conjugate();
        SpatialTransform::new(-(q_inv * self.p), q_inv)
    }

    /// Tensor change of coordinates: `Adj(T^-1)^T * I * Adj(T^-1)` (Frank & Park, 8.2.3),
    /// where `I` is a 6x6 spatial inertia with the 3x3 rotational block in the
    /// top-left corner and zero elsewhere (no mass/com coupling).
    pub fn transform_inertia(&self, inertia: Mat3) -> Mat3 {
        let t_inv = self.inverse();
        let r = Mat3::from_quat(t_inv.q);
        let s = skew(t_inv.p) * r;
        let adj = spatial_adjoint(r, s);
        let spatial_i = block_diag(mat3_to_na(inertia), nalgebra::Matrix3::zeros());
        let result = adj.transpose() * spatial_i * adj;
        na_to_mat3(result.fixed_view::<3, 3>(0, 0).clone_owned())
    }
}

fn mat3_to_na(m: Mat3) -> nalgebra::Matrix3<f32> {
    #[rustfmt::skip]
    let out = nalgebra::Matrix3::new(
        m.x_axis.x, m.y_axis.x, m.z_axis.x,
        m.x_axis.y, m.y_axis.y, m.z_axis.y,
        m.x_axis.z, m.y_axis.z, m.z_axis.z,
    );
    out
}

fn na_to_mat3(m: nalgebra::Matrix3<f32>) -> Mat3 {
    Mat3::from_cols_array(&[
        m[(0, 0)],
        m[(1, 0)],
        m[(2, 0)],
        m[(0, 1)],
        m[(1, 1)],
        m[(2, 1)],
        m[(0, 2)],
        m[(1, 2)],
        m[(2, 2)],
    ])
}

fn block_diag(a: nalgebra::Matrix3<f32>, b: nalgebra::Matrix3<f32>) -> Matrix6<f32> {
    let mut out = Matrix6::zeros();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&a);
    out.fixed_view_mut::<3, 3>(3, 3).copy_from(&b);
    out
}

/// Compose two rigid motions: `self * other` applies `other` first, then `self`.
impl std::ops::Mul for SpatialTransform {
    type Output = SpatialTransform;
    fn mul(self, rhs: SpatialTransform) -> SpatialTransform {
        SpatialTransform::new(self.p + self.q * rhs.p, self.q * rhs.q)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SpatialVector {
    pub top: Vec3,
    pub bottom: Vec3,
}

impl SpatialVector {
    pub const ZERO: SpatialVector = SpatialVector {
        top: Vec3::ZERO,
        bottom: Vec3::ZERO,
    };

    pub fn new(top: Vec3, bottom: Vec3) -> Self {
        Self { top, bottom }
    }
}

impl std::ops::Add for SpatialVector {
    type Output = SpatialVector;
    fn add(self, rhs: SpatialVector) -> SpatialVector {
        SpatialVector::new(self.top + rhs.top, self.bottom + rhs.bottom)
    }
}

impl std::ops::Sub for SpatialVector {
    type Output = SpatialVector;
    fn sub(self, rhs: SpatialVector) -> SpatialVector {
        SpatialVector::new(self.top - rhs.top, self.bottom - rhs.bottom)
    }
}

/// 3x3 skew-symmetric ("cross product") matrix of `v`, such that `skew(v) * x == v.cross(x)`.
pub fn skew(v: Vec3) -> Mat3 {
    Mat3::from_cols_array(&[
        0.0, v.z, -v.y, //
        -v.z, 0.0, v.x, //
        v.y, -v.x, 0.0,
    ])
}

/// 6x6 spatial adjoint `[[R, 0], [S, R]]` acting on twists `(w, v)` in
/// angular-top/linear-bottom convention.
fn spatial_adjoint(r: Mat3, s: Mat3) -> Matrix6<f32> {
    let r = mat3_to_na(r);
    let s = mat3_to_na(s);
    let mut out = Matrix6::zeros();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
    out.fixed_view_mut::<3, 3>(3, 0).copy_from(&s);
    out.fixed_view_mut::<3, 3>(3, 3).copy_from(&r);
    out
}

/// Returns the twist of `q` around `axis`: project the imaginary part onto
/// `axis`, keep the real part, and renormalize. Used to extract the
/// revolute-joint coordinate from a relative orientation.
pub fn quat_twist(axis: Vec3, q: Quat) -> Quat {
    let im = Vec3::new(q.x, q.y, q.z);
    let a = im.dot(axis) * axis;
    Quat::from_xyzw(a.x, a.y, a.z, q.w).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn transform_point_rotates_then_translates() {
        let t = SpatialTransform::new(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_z(FRAC_PI_2));
        let p = t.transform_point(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn inverse_round_trips() {
        let t = SpatialTransform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(0.7).normalize(),
        );
        let inv = t.inverse();
        let round = t * inv;
        assert!(round.p.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(round.q.abs_diff_eq(Quat::IDENTITY, 1e-4) || round.q.abs_diff_eq(-Quat::IDENTITY, 1e-4));
    }

    #[test]
    fn quat_twist_identity_about_any_axis_is_identity() {
        let t = quat_twist(Vec3::Z, Quat::IDENTITY);
        assert!(t.abs_diff_eq(Quat::IDENTITY, 1e-5));
    }
}
