//! One module per element class. Each `eval_*` function is a parallel-for
//! over its element count: it reads `Model` + the current `(particle_q,
//! particle_qd)` / `(body_q, body_qd)` and accumulates into per-node force
//! buffers via a `rayon` fold/reduce, the sanctioned alternative to a
//! per-float atomic add.

pub mod bending;
pub mod contacts;
pub mod integrate;
pub mod joints;
pub mod muscles;
pub mod springs;
pub mod tetrahedra;
pub mod triangles;

use glam::Vec3;
use rayon::prelude::*;

use crate::spatial::SpatialVector;

/// Parallel-for over `items`, accumulating each element's `Vec3` contribution
/// into a `n`-length buffer via per-thread-local fold + reduce. `contribute`
/// writes into whichever indices of `acc` the element touches (it is not
/// handed the whole buffer to avoid accidental cross-element writes).
pub(crate) fn fold_reduce_vec3<T: Sync>(
    items: &[T],
    n: usize,
    contribute: impl Fn(usize, &T, &mut [Vec3]) + Sync,
) -> Vec<Vec3> {
    items
        .par_iter()
        .enumerate()
        .fold(
            || vec![Vec3::ZERO; n],
            |mut acc, (idx, item)| {
                contribute(idx, item, &mut acc);
                acc
            },
        )
        .reduce(
            || vec![Vec3::ZERO; n],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x += *y;
                }
                a
            },
        )
}

/// As [`fold_reduce_vec3`] but for body wrench accumulators.
pub(crate) fn fold_reduce_spatial<T: Sync>(
    items: &[T],
    n: usize,
    contribute: impl Fn(usize, &T, &mut [SpatialVector]) + Sync,
) -> Vec<SpatialVector> {
    items
        .par_iter()
        .enumerate()
        .fold(
            || vec![SpatialVector::ZERO; n],
            |mut acc, (idx, item)| {
                contribute(idx, item, &mut acc);
                acc
            },
        )
        .reduce(
            || vec![SpatialVector::ZERO; n],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b.iter()) {
                    *x = *x + *y;
                }
                a
            },
        )
}

pub(crate) fn add_into(dst: &mut [Vec3], delta: &[Vec3]) {
    for (d, s) in dst.iter_mut().zip(delta.iter()) {
        *d += *s;
    }
}

pub(crate) fn add_into_spatial(dst: &mut [SpatialVector], delta: &[SpatialVector]) {
    for (d, s) in dst.iter_mut().zip(delta.iter()) {
        *d = *d + *s;
    }
}
