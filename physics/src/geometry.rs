//! Closest-point queries used by the triangle self-contact, triangle-body
//! contact, and muscle-wrapping kernels.

use glam::Vec3;

/// Barycentric coordinates of the point on triangle `abc` closest to `p`,
/// returned as `(u, v, w)` with `p' = u*a + v*b + w*c`. Degenerate (zero-area)
/// triangles are the caller's responsibility to filter before calling this.
pub fn triangle_closest_point_barycentric(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return Vec3::new(1.0, 0.0, 0.0);
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return Vec3::new(0.0, 1.0, 0.0);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return Vec3::new(1.0 - v, v, 0.0);
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return Vec3::new(0.0, 0.0, 1.0);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return Vec3::new(1.0 - w, 0.0, w);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return Vec3::new(0.0, w, 1.0 - w);
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    Vec3::new(1.0 - v - w, v, w)
}

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Closest points between segments `p1-q1` and `p2-q2`, returned as
/// parameters `(s, t)` with `c1 = p1 + (q1-p1)*s`, `c2 = p2 + (q2-p2)*t`.
/// `epsilon` is the squared-length threshold below which a segment is
/// treated as degenerate (a point). Ericson, *Real-Time Collision
/// Detection* §5.1.9.
pub fn closest_point_edge_edge(p1: Vec3, q1: Vec3, p2: Vec3, q2: Vec3, epsilon: f32) -> (f32, f32) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    if a <= epsilon && e <= epsilon {
        return (0.0, 0.0);
    }

    if a <= epsilon {
        return (0.0, clamp01(f / e));
    }

    let c = d1.dot(r);
    if e <= epsilon {
        return (clamp01(-c / a), 0.0);
    }

    let b = d1.dot(d2);
    let denom = a * e - b * b;
    let mut s = if denom != 0.0 {
        clamp01((b * f - c * e) / denom)
    } else {
        0.0
    };

    let mut t = (b * s + f) / e;
    if t < 0.0 {
        t = 0.0;
        s = clamp01(-c / a);
    } else if t > 1.0 {
        t = 1.0;
        s = clamp01((b - c) / a);
    }
    (s, t)
}
